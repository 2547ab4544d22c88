//! Processor resolution
//!
//! A processor is a named transform step applied to input files by the
//! external pipeline. Which processors apply to a file depends on its
//! extension, on the processors declared by the document that wrote it and
//! on the overrides attached to its input group.

use crate::context::ResolverContext;
use crate::ResolverResult;
use bundlefile_core::utils::get_extension;
use bundlefile_core::{BundleError, DocumentId, FileSystem, ProcessorDecl, ResourceSpec};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("valid slug regex"));

static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("valid dashes regex"));

/// Processors applying to one file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedProcessors {
    /// Callback names by execution priority
    pub execution_order: Vec<String>,
    /// Active callbacks and their options
    pub processors: IndexMap<String, Value>,
}

impl ResolvedProcessors {
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Active steps sorted by execution priority.
    ///
    /// Callbacks absent from the execution order run last, in activation order.
    pub fn steps(&self) -> Vec<ProcessorStep> {
        let mut steps: Vec<ProcessorStep> = self
            .processors
            .iter()
            .map(|(callback, options)| ProcessorStep {
                callback: callback.clone(),
                options: options.clone(),
            })
            .collect();
        steps.sort_by_key(|step| {
            self.execution_order
                .iter()
                .position(|c| *c == step.callback)
                .unwrap_or(usize::MAX)
        });
        steps
    }
}

/// One step of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorStep {
    pub callback: String,
    pub options: Value,
}

/// Consecutive input files sharing the same processors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessorBatch {
    pub files: Vec<Utf8PathBuf>,
    pub steps: Vec<ProcessorStep>,
}

/// Resolves the processors applying to input files
#[derive(Debug, Clone)]
pub struct ProcessorResolver {
    /// Built-in processors by name
    base: IndexMap<String, ProcessorDecl>,
    base_order: Vec<String>,
    /// Processors declared by each document
    declared: IndexMap<DocumentId, Vec<ProcessorDecl>>,
    /// Callbacks the pipeline knows how to run
    callbacks: IndexSet<String>,
}

impl Default for ProcessorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorResolver {
    /// Create a resolver knowing the built-in processors
    pub fn new() -> Self {
        let builtin = |name: &str, extensions: &[&str], options: Value| ProcessorDecl {
            name: name.to_string(),
            callback: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            options,
        };
        let base: IndexMap<String, ProcessorDecl> = [
            builtin("typescript", &["ts"], json!({"noImplicitAny": true})),
            builtin("coffee", &["coffee"], json!({})),
            builtin("sass", &["sass", "scss"], json!({})),
            builtin("less", &["less"], json!({})),
        ]
        .into_iter()
        .map(|decl| (decl.name.clone(), decl))
        .collect();

        let base_order: Vec<String> = ["typescript", "coffee", "sass", "less", "cssurlajuster", "image"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        Self {
            base,
            callbacks: base_order.iter().cloned().collect(),
            base_order,
            declared: IndexMap::new(),
        }
    }

    /// Create a resolver knowing the processors declared by every loaded document
    pub fn from_context<F: FileSystem>(context: &ResolverContext<F>) -> Self {
        let mut resolver = Self::new();
        for document in context.documents() {
            resolver.register_document(document.id, document.processors.clone());
        }
        resolver
    }

    /// Register a callback the pipeline can run
    pub fn register_callback(&mut self, name: impl Into<String>) {
        self.callbacks.insert(name.into());
    }

    /// Register the processors declared by a document
    pub fn register_document(&mut self, id: DocumentId, declarations: Vec<ProcessorDecl>) {
        self.declared.insert(id, declarations);
    }

    /// Check that a callback is registered
    pub fn ensure_callback(&self, name: &str) -> ResolverResult<()> {
        if self.callbacks.contains(name) {
            Ok(())
        } else {
            Err(BundleError::UnknownProcessor {
                name: name.to_string(),
            })
        }
    }

    /// Processors applying to `path`, written by `owner`, with per-input overrides
    pub fn resolve(
        &self,
        path: &Utf8Path,
        owner: Option<DocumentId>,
        overrides: &IndexMap<String, Option<Value>>,
    ) -> ResolvedProcessors {
        let extension = get_extension(path);
        let extension = extension.as_deref();
        let mut output = ResolvedProcessors {
            execution_order: self.base_order.clone(),
            processors: IndexMap::new(),
        };

        for decl in self.base.values().filter(|d| d.matches_extension(extension)) {
            output
                .processors
                .insert(decl.callback.clone(), decl.options.clone());
        }

        if let Some(declared) = owner.and_then(|id| self.declared.get(&id)) {
            let mut pending: Vec<String> = Vec::new();
            for decl in declared {
                match output.execution_order.iter().position(|c| *c == decl.callback) {
                    None => pending.push(decl.callback.clone()),
                    Some(pos) if !pending.is_empty() => {
                        let queued: Vec<String> = pending.drain(..).collect();
                        output.execution_order.splice(pos..pos, queued);
                    },
                    Some(_) => {},
                }
                if decl.matches_extension(extension) {
                    output
                        .processors
                        .insert(decl.callback.clone(), decl.options.clone());
                }
            }
            output.execution_order.extend(pending);
        }

        for (name, inline) in overrides {
            match self.lookup(name, owner) {
                Some(decl) => {
                    output
                        .processors
                        .insert(decl.callback.clone(), decl.options.clone());
                },
                None => {
                    let options = inline.clone().unwrap_or_else(|| Value::Object(Map::new()));
                    output.processors.insert(name.clone(), options);
                },
            }
        }
        output
    }

    /// Find a processor by name, declared ones first
    fn lookup(&self, name: &str, owner: Option<DocumentId>) -> Option<&ProcessorDecl> {
        owner
            .and_then(|id| self.declared.get(&id))
            .and_then(|declared| declared.iter().find(|d| d.name == name))
            .or_else(|| self.base.get(name))
    }

    /// Check if two resolutions run the same processors with the same options
    pub fn equals(a: &ResolvedProcessors, b: &ResolvedProcessors) -> bool {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => true,
            (true, false) | (false, true) => false,
            _ => canonical_processors(a) == canonical_processors(b),
        }
    }

    /// Group the input files of a resource into batches sharing the same processors.
    ///
    /// Fails when a batch needs a callback that is not registered.
    pub fn plan(&self, resource: &ResourceSpec) -> ResolverResult<Vec<ProcessorBatch>> {
        let mut seen: IndexSet<&Utf8Path> = IndexSet::new();
        let mut groups: Vec<(Vec<Utf8PathBuf>, ResolvedProcessors)> = Vec::new();
        let mut current: (Vec<Utf8PathBuf>, ResolvedProcessors) = Default::default();

        for input in &resource.inputs {
            for file in &input.files {
                if !seen.insert(file.absolute.as_path()) {
                    continue;
                }
                let resolved = self.resolve(&file.absolute, Some(file.owner), &input.processors);
                if Self::equals(&current.1, &resolved) {
                    current.0.push(file.absolute.clone());
                } else {
                    let previous = std::mem::replace(&mut current, (vec![file.absolute.clone()], resolved));
                    if !previous.0.is_empty() {
                        groups.push(previous);
                    }
                }
            }
        }
        if !current.0.is_empty() {
            groups.push(current);
        }

        groups
            .into_iter()
            .map(|(files, processors)| {
                let steps = processors.steps();
                for step in &steps {
                    self.ensure_callback(&step.callback)?;
                }
                Ok(ProcessorBatch { files, steps })
            })
            .collect()
    }
}

/// Order-independent form of a processor set, with string values slugified
fn canonical_processors(resolved: &ResolvedProcessors) -> Value {
    let map: Map<String, Value> = resolved
        .processors
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    canonical(&Value::Object(map))
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Array(
                entries
                    .into_iter()
                    .map(|(key, value)| {
                        let mut entry = Map::new();
                        entry.insert(key.clone(), canonical(value));
                        Value::Object(entry)
                    })
                    .collect(),
            )
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::String(s) => Value::String(slugify(s)),
        other => other.clone(),
    }
}

/// Lowercase, whitespace to dashes, only word characters and single dashes
fn slugify(input: &str) -> String {
    let lower = input.to_lowercase();
    let dashed = WHITESPACE.replace_all(&lower, "-");
    let cleaned = NON_SLUG.replace_all(&dashed, "");
    let collapsed = DASHES.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

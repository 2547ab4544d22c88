//! Document normalization
//!
//! The normalizer narrows the raw value of one document into a
//! [`DocumentConfig`]. Malformed fragments are reported with a breadcrumb and
//! dropped; normalization itself only fails on errors raised while loading a
//! referenced document.
//!
//! Keys of a document:
//! - `parameters`: scalar values substituted for `%name%` tokens everywhere
//! - `processors`: processor declarations
//! - `packages` (or `bundles`): bundle definitions, possibly nested
//! - `imports`: other documents whose bundles are merged into this one

mod bundle;
mod flatten;
mod params;


pub use flatten::flatten_bundles;
pub use params::{resolve_parameters, substitute_str, substitute_value};

use crate::options::ResolveOptions;
use bundlefile_core::utils::PathResolver;
use bundlefile_core::{
    AssetPath, BundleResult, ContextStack, Diagnostics, DocumentConfig, DocumentId,
    ParameterValue, ProcessorDecl,
};
use camino::{Utf8Path, Utf8PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static CALLBACK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[$A-Za-z_][A-Za-z0-9_]*$").expect("valid callback regex"));

static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z.][a-z0-9]*$").expect("valid extension regex"));

/// Services the normalizer needs from whoever drives the resolution
pub trait DocumentHost {
    /// Load a referenced document (or fetch it from cache).
    ///
    /// Returns `None` when the document could not be decoded.
    fn load_document(&mut self, path: &Utf8Path) -> BundleResult<Option<DocumentId>>;

    /// Check if a regular file exists
    fn file_exists(&self, path: &Utf8Path) -> bool;

    /// Collector for reported problems
    fn diagnostics(&mut self) -> &mut Diagnostics;
}

/// Normalizes the raw data of one document
pub struct Normalizer<'h, H: DocumentHost + ?Sized> {
    host: &'h mut H,
    options: ResolveOptions,
    id: DocumentId,
    path: Utf8PathBuf,
    paths: PathResolver,
    context: ContextStack,
}

impl<'h, H: DocumentHost + ?Sized> Normalizer<'h, H> {
    /// Create a normalizer for the document `id` stored at `path` (absolute)
    pub fn new(host: &'h mut H, options: ResolveOptions, id: DocumentId, path: &Utf8Path) -> Self {
        let mut context = ContextStack::new();
        context.enter(path.file_name().unwrap_or(path.as_str()));
        Self {
            host,
            options,
            id,
            path: path.to_path_buf(),
            paths: PathResolver::for_document(id, path),
            context,
        }
    }

    /// Normalize the raw document
    pub fn normalize(mut self, mut raw: Value) -> BundleResult<DocumentConfig> {
        let mut parameters = self.normalize_parameters(raw.get("parameters"));
        parameters.insert(
            "_theme".to_string(),
            ParameterValue::Text(self.options.theme.clone()),
        );
        parameters.insert(
            "_env".to_string(),
            ParameterValue::Text(self.options.environment.as_str().to_string()),
        );
        while resolve_parameters(&mut parameters) {}
        while substitute_value(&mut raw, &parameters) {}

        let processors = self.normalize_processors(raw.get("processors"));
        let (key, packages) = match raw.get("packages") {
            Some(packages) => ("packages", Some(packages)),
            None => ("bundles", raw.get("bundles")),
        };
        let bundles = self.normalize_bundles(key, packages)?;
        let imports = self.normalize_imports(raw.get("imports"));

        Ok(DocumentConfig {
            id: self.id,
            path: self.path,
            parameters,
            processors,
            bundles,
            imports,
        })
    }

    /// Normalize the `processors` key
    fn normalize_processors(&mut self, raw: Option<&Value>) -> Vec<ProcessorDecl> {
        let mut output = Vec::new();
        let Some(raw) = raw.filter(|v| !v.is_null()) else {
            return output;
        };

        self.context.enter("processors");
        for (i, entry) in ensure_array(raw).into_iter().enumerate() {
            self.context.enter(i.to_string());
            match entry {
                Value::String(name) => {
                    let mut shorthand = Map::new();
                    shorthand.insert("name".to_string(), Value::String(name.clone()));
                    if let Some(decl) = self.normalize_processor(&shorthand) {
                        output.push(decl);
                    }
                },
                Value::Object(map) => {
                    if let Some(decl) = self.normalize_processor(map) {
                        output.push(decl);
                    }
                },
                other => {
                    self.error(format!("Invalid processor value '{}'.", as_string(other)));
                },
            }
            self.context.leave();
        }
        self.context.leave();
        output
    }

    fn normalize_processor(&mut self, raw: &Map<String, Value>) -> Option<ProcessorDecl> {
        let name = match raw.get("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
            other => {
                let shown = other.map(as_string).unwrap_or_else(|| "undefined".to_string());
                self.error(format!("Invalid processor name '{}'.", shown));
                return None;
            },
        };
        let callback = match raw.get("callback").filter(|v| truthy(v)) {
            None => name.clone(),
            Some(Value::String(callback)) => callback.clone(),
            Some(other) => as_string(other),
        };
        if !CALLBACK_NAME.is_match(&callback) {
            self.error(format!(
                "Invalid processor callback '{}'. Should be a valid function name.",
                callback
            ));
            return None;
        }

        let extensions = self.normalize_extensions(raw.get("extensions"));
        let options = raw
            .get("options")
            .filter(|v| truthy(v))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        Some(ProcessorDecl {
            name,
            callback,
            extensions,
            options,
        })
    }

    /// Lowercase extensions without leading dot
    fn normalize_extensions(&mut self, raw: Option<&Value>) -> Vec<String> {
        let mut output = Vec::new();
        self.context.enter("extensions");
        if let Some(raw) = raw {
            for (i, entry) in ensure_array(raw).into_iter().enumerate() {
                self.context.enter(i.to_string());
                match entry.as_str().filter(|ext| EXTENSION.is_match(ext)) {
                    Some(ext) => output.push(ext.trim_start_matches('.').to_lowercase()),
                    None if self.options.verbose => {
                        self.error(format!("Invalid extension '{}'.", as_string(entry)));
                    },
                    None => {},
                }
                self.context.leave();
            }
        }
        self.context.leave();
        output
    }

    /// Normalize the `imports` key, every import must exist unless it is a glob
    fn normalize_imports(&mut self, raw: Option<&Value>) -> Vec<AssetPath> {
        let mut output = Vec::new();
        let Some(raw) = raw else {
            return output;
        };

        self.context.enter("imports");
        for (i, entry) in ensure_array(raw).into_iter().enumerate() {
            self.context.enter(i.to_string());
            match entry.as_str().and_then(|s| self.paths.resolve(s)) {
                Some(path) if path.is_glob || self.host.file_exists(&path.absolute) => {
                    output.push(path);
                },
                Some(path) => {
                    self.warning(format!("File '{}' not found.", path.absolute));
                },
                None => {
                    self.error(format!(
                        "Invalid import value '{}' (should be a string).",
                        as_string(entry)
                    ));
                },
            }
            self.context.leave();
        }
        self.context.leave();
        output
    }

    /// Resolve a scalar written as a path
    fn value_as_path(&self, raw: &Value) -> Option<AssetPath> {
        match raw {
            Value::String(s) => self.paths.resolve(s),
            Value::Number(n) => self.paths.resolve(&n.to_string()),
            _ => None,
        }
    }

    fn error(&mut self, message: String) {
        self.host.diagnostics().error(message, &self.context);
    }

    fn warning(&mut self, message: String) {
        self.host.diagnostics().warning(message, &self.context);
    }
}

/// View a value as a list: arrays as is, null as empty, anything else as one item
fn ensure_array(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Loose truthiness of a raw value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a raw value for a message
fn as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

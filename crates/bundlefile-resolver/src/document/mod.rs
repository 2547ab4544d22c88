//! Build-ready view
//!
//! The build-ready view is what the asset pipeline consumes: one entry per
//! standalone bundle of a document, with the resources of every resolved
//! dependency merged into its own.

use crate::context::ResolverContext;
use bundlefile_core::{Bundle, DocumentId, FileSystem, InputSpec, ResourceSpec};
use camino::Utf8PathBuf;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// A standalone bundle with its dependencies' resources merged in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReadyBundle {
    pub name: String,
    pub theme: Option<String>,
    pub version: Option<String>,
    pub scripts: Option<ResourceSpec>,
    pub styles: Option<ResourceSpec>,
    pub misc: Vec<ResourceSpec>,
}

impl BuildReadyBundle {
    /// Iterate over every resource with its kind
    pub fn resources(&self) -> impl Iterator<Item = (&'static str, &ResourceSpec)> {
        self.scripts
            .iter()
            .map(|r| ("scripts", r))
            .chain(self.styles.iter().map(|r| ("styles", r)))
            .chain(self.misc.iter().map(|r| ("misc", r)))
    }
}

/// Paths to watch per resource kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchList {
    #[serde(flatten)]
    pub kinds: IndexMap<&'static str, Vec<Utf8PathBuf>>,
}

impl WatchList {
    /// Collect the watch paths of a build-ready view.
    ///
    /// Input files are watched too, unless the resource disables it.
    pub fn collect(bundles: &[BuildReadyBundle]) -> Self {
        let mut kinds: IndexMap<&'static str, IndexSet<Utf8PathBuf>> = IndexMap::new();
        for bundle in bundles {
            for (kind, resource) in bundle.resources() {
                let paths = kinds.entry(kind).or_default();
                paths.extend(resource.watch.iter().map(|p| p.absolute.clone()));
                if resource.auto_watch != Some(false) {
                    paths.extend(resource.input_files().map(|p| p.absolute.clone()));
                }
            }
        }
        Self {
            kinds: kinds
                .into_iter()
                .map(|(kind, paths)| (kind, paths.into_iter().collect()))
                .collect(),
        }
    }

    pub fn get(&self, kind: &str) -> &[Utf8PathBuf] {
        self.kinds.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(Vec::is_empty)
    }
}

impl<F: FileSystem> ResolverContext<F> {
    /// Build-ready view of the standalone bundles of a document
    pub fn build_ready(&mut self, id: DocumentId) -> Vec<BuildReadyBundle> {
        let mut output = Vec::new();
        for key in self.bundle_keys(id) {
            let Some(bundle) = self.bundle(&key).filter(|b| b.standalone).cloned() else {
                continue;
            };
            let deps: Vec<Bundle> = self
                .resolved_dependencies(&key)
                .iter()
                .filter_map(|k| self.bundle(k).cloned())
                .collect();

            let depth = self.context.depth();
            let label = self.document_label(id);
            self.context.enter(label);
            self.context.enter(key.name.clone());

            let scripts =
                self.merge_resource("scripts", bundle.scripts.as_ref(), &deps, |b| b.scripts.as_ref());
            let styles =
                self.merge_resource("styles", bundle.styles.as_ref(), &deps, |b| b.styles.as_ref());
            let misc: Vec<ResourceSpec> = bundle
                .misc
                .iter()
                .chain(deps.iter().flat_map(|d| d.misc.iter()))
                .cloned()
                .collect();

            self.context.truncate(depth);

            if scripts.is_none() && styles.is_none() && misc.is_empty() {
                continue;
            }
            output.push(BuildReadyBundle {
                name: bundle.name.to_string(),
                theme: bundle.theme,
                version: bundle.version.text,
                scripts,
                styles,
                misc,
            });
        }
        output
    }

    /// Merge one kind of resource of a bundle with its dependencies'.
    ///
    /// The output is the first one found on the bundle or its dependencies.
    /// Dependency inputs come first and are only kept when there is an output.
    fn merge_resource(
        &mut self,
        kind: &str,
        own: Option<&ResourceSpec>,
        deps: &[Bundle],
        select: impl Fn(&Bundle) -> Option<&ResourceSpec>,
    ) -> Option<ResourceSpec> {
        let output = own
            .and_then(|r| r.output.clone())
            .or_else(|| deps.iter().filter_map(&select).find_map(|r| r.output.clone()));

        let mut inputs: Vec<InputSpec> = Vec::new();
        let mut watch = Vec::new();
        for dep in deps {
            let Some(resource) = select(dep) else {
                continue;
            };
            if output.is_some() {
                inputs.extend(resource.inputs.iter().cloned());
                watch.extend(resource.watch.iter().cloned());
            } else if self.options().strict && resource.has_inputs() {
                self.diagnostics.warning(
                    format!(
                        "Dependency '{}' defines '{}' input but no output has been defined on the including bundle.",
                        dep.identity(),
                        kind
                    ),
                    &self.context,
                );
            }
        }

        if let Some(own) = own {
            if output.is_some() {
                inputs.extend(own.inputs.iter().cloned());
                watch.extend(own.watch.iter().cloned());
            } else if self.options().strict && own.has_inputs() {
                self.diagnostics.warning(
                    format!("Input '{}' have been defined with no output.", kind),
                    &self.context,
                );
            }
        }

        output.map(|output| ResourceSpec {
            inputs,
            output: Some(output),
            watch,
            auto_watch: own.and_then(|r| r.auto_watch),
        })
    }
}

//! Dependency flattening
//!
//! Flattening replaces the direct dependencies of a bundle with the full
//! transitive list: the flattened dependencies of each resolved dependency
//! are spliced right before it. The result is then deduplicated so every
//! bundle appears once, as its newest requested variant.

use crate::closest::is_newer;
use crate::context::ResolverContext;
use bundlefile_core::{BundleKey, DependencyRef, DocumentId, FileSystem};
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

/// Outcome of flattening one bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenState {
    /// `deps` holds the transitive list
    Flattened,
    /// Some dependency lives in a document still being normalized; the bundle
    /// is flattened again once the root document is loaded
    Deferred,
    /// The bundle is already being flattened further up the chain
    Circular,
}

impl<F: FileSystem> ResolverContext<F> {
    /// Flatten every bundle of a document
    pub(crate) fn flatten_document(&mut self, id: DocumentId) {
        for key in self.bundle_keys(id) {
            self.flatten(&key);
        }
    }

    /// Flatten bundles left aside while a document they depend on was
    /// still being normalized
    pub(crate) fn flatten_deferred(&mut self) {
        let ids: Vec<DocumentId> = self.documents().map(|doc| doc.id).collect();
        for id in ids {
            self.flatten_document(id);
        }
    }

    /// Check if a bundle reaches, directly or through unflattened
    /// dependencies, a document that is still being normalized
    fn waits_on_pending(&self, key: &BundleKey) -> bool {
        let mut visited: IndexSet<BundleKey> = IndexSet::new();
        let mut queue = vec![key.clone()];
        while let Some(current) = queue.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(bundle) = self.bundle(&current) else {
                continue;
            };
            if current != *key && bundle.deps_flattened {
                continue;
            }
            for dep in &bundle.deps {
                if self.is_pending(dep.target) {
                    return true;
                }
                if let Some(target) = self.find_closest(dep) {
                    queue.push(target);
                }
            }
        }
        false
    }

    /// Flatten the dependencies of a bundle, recursively.
    ///
    /// A bundle already being flattened further up the chain is reported as
    /// a circular dependency and nothing is spliced for it. A bundle that
    /// transitively waits on a document still being normalized is left
    /// untouched and picked up again by `flatten_deferred`.
    pub fn flatten(&mut self, key: &BundleKey) -> FlattenState {
        let (deps, identity) = match self.bundle(key) {
            Some(bundle) if bundle.deps_flattened => return FlattenState::Flattened,
            Some(bundle) => (bundle.deps.clone(), bundle.identity()),
            None => return FlattenState::Flattened,
        };

        if self.dependency_stack.contains(key) {
            let mut chain: Vec<String> = self
                .dependency_stack
                .iter()
                .filter_map(|k| self.bundle(k).map(|b| b.identity()))
                .collect();
            chain.push(identity);
            self.diagnostics.warning(
                format!("Circular dependency detected: {}", chain.join(" -> ")),
                &self.context,
            );
            return FlattenState::Circular;
        }

        // Only reachable through a cycle between documents
        if self.waits_on_pending(key) {
            trace!("Deferring '{}' until its dependencies are loaded", identity);
            return FlattenState::Deferred;
        }

        trace!("Flattening '{}'", identity);
        let depth = self.context.depth();
        let document = self.document_label(key.document);
        self.context.enter(document);
        self.context.enter("packages");
        self.context.enter(key.name.clone());
        self.context.enter("deps");
        self.dependency_stack.push(key.clone());

        let mut deferred = false;
        let mut flattened = deps;
        let mut j = 0;
        let mut index = 0;
        while j < flattened.len() {
            let dep = flattened[j].clone();
            self.context.enter(index.to_string());
            if self.options().debug {
                self.diagnostics.info(
                    format!(
                        "Bundle '{}' requires '{}' (version '{}', theme '{}')",
                        identity,
                        dep.name,
                        dep.version.label(),
                        dep.theme.as_deref().unwrap_or("none")
                    ),
                    &self.context,
                );
            }

            match self.find_closest(&dep) {
                Some(target) => {
                    if self.options().debug {
                        let found = self.bundle(&target).map(|b| b.identity()).unwrap_or_default();
                        let message = format!(
                            "Resolved as '{}' in '{}'",
                            found,
                            self.display_path(target.document)
                        );
                        self.diagnostics.info(message, &self.context);
                    }
                    match self.flatten(&target) {
                        FlattenState::Flattened => {
                            let inherited = self
                                .bundle(&target)
                                .map(|b| b.deps.clone())
                                .unwrap_or_default();
                            let count = inherited.len();
                            flattened.splice(j..j, inherited);
                            j += count;
                        },
                        FlattenState::Deferred => deferred = true,
                        FlattenState::Circular => {},
                    }
                },
                None => {
                    self.diagnostics.error(
                        format!(
                            "Dependency '{}' (version '{}' theme '{}') not found for bundle '{}'",
                            dep.name,
                            dep.version.label(),
                            dep.theme.as_deref().unwrap_or("none"),
                            identity
                        ),
                        &self.context,
                    );
                },
            }
            self.context.leave();
            j += 1;
            index += 1;
        }

        self.dependency_stack.pop();
        if deferred {
            self.context.truncate(depth);
            return FlattenState::Deferred;
        }

        let deduplicated = self.deduplicate(key, flattened);
        if self.options().debug {
            let list: Vec<String> = deduplicated.iter().map(DependencyRef::identity).collect();
            self.diagnostics.info(
                format!("Dependencies of '{}': [{}]", identity, list.join(", ")),
                &self.context,
            );
        }
        if let Some(bundle) = self.bundle_mut(key) {
            bundle.deps = deduplicated;
            bundle.deps_flattened = true;
        }

        self.context.truncate(depth);
        FlattenState::Flattened
    }

    /// Keep one entry per resolved bundle.
    ///
    /// Entries are grouped by name and theme of the resolved variant, local
    /// bundles further by their document. Within a group an entry asking for
    /// an explicit version replaces the kept one when it resolves to a newer
    /// variant. Groups keep the position of their first entry. Entries that
    /// resolve to nothing or back to `owner` are dropped.
    fn deduplicate(&self, owner: &BundleKey, deps: Vec<DependencyRef>) -> Vec<DependencyRef> {
        let mut kept: IndexMap<String, (DependencyRef, BundleKey)> = IndexMap::new();

        for dep in deps {
            let Some(target) = self.find_closest(&dep) else {
                continue;
            };
            if target == *owner {
                continue;
            }
            let Some(resolved) = self.bundle(&target) else {
                continue;
            };

            let mut group = format!(
                "{}:{}",
                resolved.name.name,
                resolved.theme.as_deref().unwrap_or("")
            );
            if !resolved.name.shared {
                group.push_str(&format!("#{}", target.document));
            }

            match kept.get_mut(&group) {
                Some((current, current_target)) => {
                    let newer = dep.version.is_constrained()
                        && self
                            .bundle(current_target)
                            .is_some_and(|existing| is_newer(resolved, existing));
                    if newer {
                        *current = dep;
                        *current_target = target;
                    }
                },
                None => {
                    kept.insert(group, (dep, target));
                },
            }
        }

        kept.into_values().map(|(dep, _)| dep).collect()
    }

    /// Resolve the flattened dependencies of a bundle to their variants
    pub fn resolved_dependencies(&self, key: &BundleKey) -> Vec<BundleKey> {
        self.bundle(key)
            .map(|bundle| bundle.deps.iter().filter_map(|dep| self.find_closest(dep)).collect())
            .unwrap_or_default()
    }
}

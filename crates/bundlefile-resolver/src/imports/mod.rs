//! Import merging
//!
//! Every bundle variant of an imported document is cloned into the importing
//! document. Shared bundles become owned by the importer, local ones keep
//! their owner so dependencies keep resolving against the document that
//! declared them.

use crate::context::ResolverContext;
use crate::ResolverResult;
use bundlefile_core::types::apply_default_theme;
use bundlefile_core::{Bundle, DocumentId, FileSystem};
use std::cmp::Ordering;

/// What to do with an incoming variant
enum Incoming {
    Add(Bundle),
    Identical,
    Conflict {
        existing: DocumentId,
        incoming: DocumentId,
        version: String,
        theme: String,
    },
}

impl<F: FileSystem> ResolverContext<F> {
    /// Merge the bundles of every import of a document into it
    pub(crate) fn merge_imports(&mut self, id: DocumentId) -> ResolverResult<()> {
        let imports = match self.document(id) {
            Some(doc) if !doc.imports.is_empty() => doc.imports.clone(),
            _ => return Ok(()),
        };

        let depth = self.context.depth();
        let label = self.document_label(id);
        self.context.enter(label);
        self.context.enter("imports");

        for (i, import) in imports.iter().enumerate() {
            self.context.enter(i.to_string());
            if import.is_glob {
                self.diagnostics.warning(
                    format!("Glob import '{}' is not expanded.", import.original),
                    &self.context,
                );
                self.context.leave();
                continue;
            }

            let source = self.load(&import.absolute)?;
            match source {
                Some(source) if source != id => self.merge_document(id, source),
                _ => {},
            }
            self.context.leave();
        }

        self.context.truncate(depth);
        Ok(())
    }

    /// Clone the bundles of `source` into `target`
    fn merge_document(&mut self, target: DocumentId, source: DocumentId) {
        let Some(bundles) = self.document(source).map(|doc| doc.bundles.clone()) else {
            return;
        };

        for (name, variants) in bundles {
            for imported in variants {
                match self.classify(target, &name, imported) {
                    Incoming::Add(bundle) => {
                        if let Some(doc) = self.document_mut(target) {
                            doc.bundles.entry(name.clone()).or_default().push(bundle);
                        }
                    },
                    Incoming::Identical => {},
                    Incoming::Conflict {
                        existing,
                        incoming,
                        version,
                        theme,
                    } => {
                        let message = format!(
                            "Two bundles named '{}' (version '{}' theme '{}') have been found with different content. File 1 '{}' File 2 '{}'",
                            name,
                            version,
                            theme,
                            self.display_path(existing),
                            self.display_path(incoming)
                        );
                        self.diagnostics.warning(message, &self.context);
                    },
                }
            }

            if let Some(variants) = self
                .document_mut(target)
                .and_then(|doc| doc.bundles.get_mut(&name))
            {
                apply_default_theme(variants);
            }
        }
    }

    fn classify(&self, target: DocumentId, name: &str, mut imported: Bundle) -> Incoming {
        let owner = if imported.name.shared {
            target
        } else {
            imported.owner
        };

        let existing = self.document(target).and_then(|doc| {
            doc.variants(name).iter().find(|e| {
                e.theme == imported.theme
                    && e.owner == owner
                    && e.version.compare(&imported.version) == Ordering::Equal
            })
        });

        match existing {
            Some(existing) if existing.same_content(&imported) => Incoming::Identical,
            Some(existing) => Incoming::Conflict {
                existing: existing.original_owner,
                incoming: imported.original_owner,
                version: imported.version.label().to_string(),
                theme: imported.theme.clone().unwrap_or_else(|| "none".to_string()),
            },
            None => {
                imported.owner = owner;
                Incoming::Add(imported)
            },
        }
    }
}

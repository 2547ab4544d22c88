//! Resolution context
//!
//! The context owns every loaded document, indexed by [`DocumentId`] and by
//! absolute path, together with the stacks used to detect import and
//! dependency cycles and the collected diagnostics. Documents reference each
//! other only through ids, so the whole graph lives in this arena.

#[cfg(test)]
mod tests;

use bundlefile_config::{decode_document, DocumentHost, Normalizer, ResolveOptions};
use bundlefile_core::utils::absolutize;
use bundlefile_core::{
    Bundle, BundleError, BundleKey, BundleResult, ContextStack, Diagnostic, Diagnostics,
    DocumentConfig, DocumentId, FileSystem, OsFileSystem,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::debug;

/// Loading state of a document slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Normalization or import merging is in progress
    Loading,
    /// Fully loaded and flattened
    Loaded,
    /// The document could not be read or decoded
    Failed,
}

/// One entry of the document arena
#[derive(Debug, Clone)]
struct DocumentSlot {
    path: Utf8PathBuf,
    state: LoadState,
    /// Set once normalization completed, possibly before imports are merged
    config: Option<DocumentConfig>,
}

/// Arena of loaded documents and the state of an ongoing resolution
pub struct ResolverContext<F: FileSystem = OsFileSystem> {
    options: ResolveOptions,
    fs: F,
    /// Slot of document `n` is at index `n - 1`
    documents: Vec<DocumentSlot>,
    /// Absolute path to document id
    by_path: IndexMap<Utf8PathBuf, DocumentId>,
    /// Documents currently being loaded, outermost first
    import_stack: Vec<Utf8PathBuf>,
    /// Bundles currently being flattened, outermost first
    pub(crate) dependency_stack: Vec<BundleKey>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) context: ContextStack,
}

impl ResolverContext<OsFileSystem> {
    /// Create a context reading from the real filesystem
    pub fn new(options: ResolveOptions) -> Self {
        Self::with_fs(options, OsFileSystem)
    }
}

impl<F: FileSystem> ResolverContext<F> {
    /// Create a context reading from `fs`
    pub fn with_fs(options: ResolveOptions, fs: F) -> Self {
        Self {
            options,
            fs,
            documents: Vec::new(),
            by_path: IndexMap::new(),
            import_stack: Vec::new(),
            dependency_stack: Vec::new(),
            diagnostics: Diagnostics::new(),
            context: ContextStack::new(),
        }
    }

    /// Start with diagnostics reported before the resolution, such as option warnings
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Take every diagnostic collected so far
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    /// Load the root document.
    ///
    /// Fails when the document cannot be read or decoded.
    pub fn resolve(&mut self, path: &Utf8Path) -> BundleResult<DocumentId> {
        match self.load(path)? {
            Some(id) => Ok(id),
            None => Err(BundleError::DocumentNotLoaded {
                path: path.to_string(),
            }),
        }
    }

    /// Load a document, or reuse the cached one.
    ///
    /// Returns `None` when the document could not be read or decoded. Only
    /// fatal errors (such as an id registered twice) are returned as `Err`.
    pub fn load(&mut self, path: &Utf8Path) -> BundleResult<Option<DocumentId>> {
        let cwd = self.fs.current_dir()?;
        let path = absolutize(path, &cwd);

        if self.import_stack.contains(&path) {
            let mut chain: Vec<&str> = self.import_stack.iter().map(|p| p.as_str()).collect();
            chain.push(path.as_str());
            self.diagnostics.warning(
                format!("Circular import detected: {}", chain.join(" -> ")),
                &self.context,
            );
        }

        self.import_stack.push(path.clone());
        let result = self.load_uncached(&path);
        self.import_stack.pop();

        if result.is_ok() && self.import_stack.is_empty() {
            self.flatten_deferred();
        }
        result
    }

    fn load_uncached(&mut self, path: &Utf8Path) -> BundleResult<Option<DocumentId>> {
        if let Some(&id) = self.by_path.get(path) {
            debug!("Reusing cached document {} ({})", id, path);
            return Ok(match self.slot(id).map(|s| s.state) {
                Some(LoadState::Failed) | None => None,
                Some(_) => Some(id),
            });
        }

        let id = DocumentId(self.documents.len() as u32 + 1);
        self.register(id, path)?;
        if self.options.verbose {
            self.diagnostics
                .info(format!("Loading '{}'", path), &self.context);
        }

        let raw = match self
            .fs
            .read_to_string(path)
            .and_then(|contents| decode_document(path, &contents))
        {
            Ok(raw) => raw,
            Err(err) => {
                self.diagnostics.error(err.to_string(), &self.context);
                self.set_state(id, LoadState::Failed);
                return Ok(None);
            },
        };

        let options = self.options.clone();
        let config = Normalizer::new(self, options, id, path).normalize(raw)?;
        if let Some(slot) = self.slot_mut(id) {
            slot.config = Some(config);
        }

        self.merge_imports(id)?;
        self.flatten_document(id);
        self.set_state(id, LoadState::Loaded);
        debug!("Loaded document {} ({})", id, path);
        Ok(Some(id))
    }

    /// Reserve the slot of a document before its content is normalized
    fn register(&mut self, id: DocumentId, path: &Utf8Path) -> BundleResult<()> {
        if let Some(existing) = self.slot(id) {
            if existing.path != path {
                return Err(BundleError::DuplicateDocumentId {
                    id: id.0,
                    existing: existing.path.to_string(),
                    path: path.to_string(),
                });
            }
            return Ok(());
        }
        self.documents.push(DocumentSlot {
            path: path.to_path_buf(),
            state: LoadState::Loading,
            config: None,
        });
        self.by_path.insert(path.to_path_buf(), id);
        Ok(())
    }

    fn slot(&self, id: DocumentId) -> Option<&DocumentSlot> {
        (id.0 as usize).checked_sub(1).and_then(|i| self.documents.get(i))
    }

    fn slot_mut(&mut self, id: DocumentId) -> Option<&mut DocumentSlot> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.documents.get_mut(i))
    }

    fn set_state(&mut self, id: DocumentId, state: LoadState) {
        if let Some(slot) = self.slot_mut(id) {
            slot.state = state;
        }
    }

    /// Check if a document is still being normalized
    pub(crate) fn is_pending(&self, id: DocumentId) -> bool {
        self.slot(id)
            .is_some_and(|s| s.state == LoadState::Loading && s.config.is_none())
    }

    /// Loading state of a document
    pub fn state(&self, id: DocumentId) -> Option<LoadState> {
        self.slot(id).map(|s| s.state)
    }

    /// Id of an already loaded document
    pub fn document_id(&self, path: &Utf8Path) -> Option<DocumentId> {
        self.by_path.get(path).copied()
    }

    /// Absolute path of a document
    pub fn document_path(&self, id: DocumentId) -> Option<&Utf8Path> {
        self.slot(id).map(|s| s.path.as_path())
    }

    /// Normalized configuration of a document
    pub fn document(&self, id: DocumentId) -> Option<&DocumentConfig> {
        self.slot(id).and_then(|s| s.config.as_ref())
    }

    pub(crate) fn document_mut(&mut self, id: DocumentId) -> Option<&mut DocumentConfig> {
        self.slot_mut(id).and_then(|s| s.config.as_mut())
    }

    /// Every normalized document, in loading order
    pub fn documents(&self) -> impl Iterator<Item = &DocumentConfig> {
        self.documents.iter().filter_map(|s| s.config.as_ref())
    }

    /// Bundle variant at `key`
    pub fn bundle(&self, key: &BundleKey) -> Option<&Bundle> {
        self.document(key.document)
            .and_then(|doc| doc.bundles.get(&key.name))
            .and_then(|variants| variants.get(key.index))
    }

    pub(crate) fn bundle_mut(&mut self, key: &BundleKey) -> Option<&mut Bundle> {
        self.document_mut(key.document)
            .and_then(|doc| doc.bundles.get_mut(&key.name))
            .and_then(|variants| variants.get_mut(key.index))
    }

    /// Keys of every bundle variant of a document
    pub fn bundle_keys(&self, id: DocumentId) -> Vec<BundleKey> {
        self.document(id)
            .map(|doc| {
                doc.bundles
                    .iter()
                    .flat_map(|(name, variants)| {
                        (0..variants.len()).map(move |index| BundleKey::new(id, name.clone(), index))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// File name of a document, used as breadcrumb root
    pub(crate) fn document_label(&self, id: DocumentId) -> String {
        match self.document_path(id) {
            Some(path) => path.file_name().unwrap_or(path.as_str()).to_string(),
            None => format!("#{}", id),
        }
    }

    /// Render the path of a document for messages
    pub(crate) fn display_path(&self, id: DocumentId) -> String {
        self.document_path(id)
            .map(|p| p.to_string())
            .unwrap_or_else(|| format!("#{}", id))
    }
}

impl<F: FileSystem> DocumentHost for ResolverContext<F> {
    fn load_document(&mut self, path: &Utf8Path) -> BundleResult<Option<DocumentId>> {
        self.load(path)
    }

    fn file_exists(&self, path: &Utf8Path) -> bool {
        self.fs.is_file(path)
    }

    fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

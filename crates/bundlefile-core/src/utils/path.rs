//! Path utilities.
//!
//! Turns path-like strings written in documents into absolute descriptors and
//! detects glob patterns so they can be expanded later by the pipeline.

use crate::types::{AssetPath, DocumentId};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut components: Vec<Utf8Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {
                // Skip current directory
            },
            Utf8Component::ParentDir => match components.last() {
                Some(Utf8Component::Normal(_)) => {
                    components.pop();
                },
                // `/..` is `/`
                Some(Utf8Component::RootDir) | Some(Utf8Component::Prefix(_)) => {},
                _ => components.push(component),
            },
            other => {
                components.push(other);
            },
        }
    }

    components.iter().map(|c| c.as_str()).collect()
}

/// Get the file extension as a lowercase string
pub fn get_extension(path: &Utf8Path) -> Option<String> {
    path.extension().map(|ext| ext.to_lowercase())
}

/// Check if a string is a glob pattern (wildcards, classes or brace sets)
pub fn is_glob(input: &str) -> bool {
    glob::Pattern::escape(input) != input || (input.contains('{') && input.contains('}'))
}

/// Directory preceding the first `**` segment of a glob
pub fn glob_base(absolute: &str) -> Option<Utf8PathBuf> {
    let pos = absolute.find("/**")?;
    let rest = &absolute[pos + 3..];
    (rest.is_empty() || rest.starts_with('/')).then(|| Utf8PathBuf::from(&absolute[..pos]))
}

/// Resolves the paths written in one document
#[derive(Debug, Clone)]
pub struct PathResolver {
    owner: DocumentId,
    base_dir: Utf8PathBuf,
}

impl PathResolver {
    /// Create a resolver for paths relative to `base_dir`
    pub fn new(owner: DocumentId, base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            owner,
            base_dir: base_dir.into(),
        }
    }

    /// Create a resolver for paths written in the document at `document`
    pub fn for_document(owner: DocumentId, document: &Utf8Path) -> Self {
        let base_dir = document
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| Utf8PathBuf::from("/"));
        Self::new(owner, base_dir)
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Resolve a raw path, `None` when it is blank
    pub fn resolve(&self, raw: &str) -> Option<AssetPath> {
        let original = raw.trim();
        if original.is_empty() {
            return None;
        }

        let candidate = Utf8Path::new(original);
        let absolute = if candidate.is_absolute() {
            normalize_path(candidate)
        } else {
            normalize_path(&self.base_dir.join(candidate))
        };
        let is_glob = is_glob(original);
        let glob_base = if is_glob {
            glob_base(absolute.as_str())
        } else {
            None
        };

        Some(AssetPath {
            owner: self.owner,
            original: original.to_string(),
            extension: get_extension(&absolute),
            absolute,
            is_glob,
            glob_base,
        })
    }
}

/// Make a path absolute against `cwd` and normalize it
pub fn absolutize(path: &Utf8Path, cwd: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&cwd.join(path))
    }
}

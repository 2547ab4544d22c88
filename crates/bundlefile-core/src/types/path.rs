//! Resolved asset paths.

use super::DocumentId;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// A path written in a document, resolved against the document's directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPath {
    /// Document the path was written in
    pub owner: DocumentId,
    /// Path as written (trimmed)
    pub original: String,
    /// Absolute, normalized path (may still contain glob metacharacters)
    pub absolute: Utf8PathBuf,
    /// Lowercase extension without the leading dot
    pub extension: Option<String>,
    /// True if `original` is a glob pattern
    pub is_glob: bool,
    /// Directory preceding the first `**` segment of a glob, if any
    pub glob_base: Option<Utf8PathBuf>,
}

impl AssetPath {
    /// Absolute path as a `Utf8Path`
    pub fn as_path(&self) -> &Utf8Path {
        &self.absolute
    }

    /// Check if the path has the given extension (case-insensitive, leading dot optional)
    pub fn has_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.');
        self.extension
            .as_deref()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }

    /// Check if two paths designate the same files, whoever wrote them
    pub fn same_target(&self, other: &Self) -> bool {
        self.absolute == other.absolute && self.is_glob == other.is_glob
    }
}

//! Error types and result aliases for bundlefile operations.
//!
//! Only problems that make the whole resolution unsound are raised as errors.
//! Everything else (malformed fragments, missing references, cycles) is
//! collected as a [`Diagnostic`](crate::utils::Diagnostic) and resolution
//! carries on.

use thiserror::Error;

/// Unified error type for all bundlefile operations
#[derive(Error, Debug)]
pub enum BundleError {
    // Document errors
    #[error("Failed to decode '{path}': {message}")]
    Decode { path: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Document '{path}' could not be loaded")]
    DocumentNotLoaded { path: String },

    // Resolution errors
    #[error(
        "A different document has already been registered with the id '{id}' ('{existing}', refusing '{path}')"
    )]
    DuplicateDocumentId {
        id: u32,
        existing: String,
        path: String,
    },

    // Processor errors
    #[error("Processor '{name}' does not exist")]
    UnknownProcessor { name: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for bundlefile operations
pub type BundleResult<T> = Result<T, BundleError>;

impl BundleError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a decode error for a document
    pub fn decode(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error must abort the whole resolution
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BundleError::DuplicateDocumentId { .. } | BundleError::UnknownProcessor { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            BundleError::Decode { .. } => {
                Some("Check the document syntax (YAML, JSON or TOML depending on the extension)")
            },
            BundleError::DocumentNotLoaded { .. } => {
                Some("Check the path of the root document and that it can be decoded")
            },
            BundleError::UnknownProcessor { .. } => {
                Some("Register the processor callback or fix the processor name in the document")
            },
            BundleError::DuplicateDocumentId { .. } => {
                Some("This is a bug in the resolver, please report it with the documents involved")
            },
            _ => None,
        }
    }
}

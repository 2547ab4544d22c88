//! Options, decoding and normalization for bundlefile documents
//!
//! This crate turns a document on disk into a strictly typed
//! [`DocumentConfig`](bundlefile_core::DocumentConfig): it decodes YAML, JSON
//! or TOML into a generic value, substitutes `%parameter%` tokens and narrows
//! the loosely typed data into bundles, resources and dependency references.
//! Cross-document references are loaded through a [`DocumentHost`].

pub mod decode;
pub mod merge;
pub mod normalize;
pub mod options;

// Re-export main types
pub use decode::{decode_document, DocumentFormat};
pub use merge::OptionsLayering;
pub use normalize::{DocumentHost, Normalizer};
pub use options::{Environment, ResolveOptions};

use bundlefile_core::BundleError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, BundleError>;

//! Core data types for bundle resolution.
//!
//! This module provides the fundamental types used throughout bundlefile:
//! - Dotted version numbers
//! - Asset path descriptors
//! - Bundles, their resources and dependency references
//! - The normalized document configuration

pub mod bundle;
pub mod document;
pub mod path;
pub mod version;

// Re-export all public types
pub use bundle::{
    apply_default_theme, Bundle, BundleKey, BundleName, DependencyRef, InputSpec, OutputSpec,
    ResourceSpec, DEFAULT_THEME,
};
pub use document::{DocumentConfig, DocumentId, ParameterValue, ProcessorDecl};
pub use path::AssetPath;
pub use version::{Version, VersionError};

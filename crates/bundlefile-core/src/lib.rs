//! # bundlefile-core
//!
//! Core types and utilities shared across all bundlefile crates.
//!
//! This crate provides:
//! - Dotted `Version` numbers and their comparison rules
//! - The bundle data model (`Bundle`, `ResourceSpec`, `DependencyRef`, ...)
//! - `BundleError` for unified error handling
//! - Path resolution, the `FileSystem` seam and diagnostics collection
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Bundle, AssetPath, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Path handling, filesystem access and diagnostics

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{BundleError, BundleResult};
pub use types::{
    AssetPath, Bundle, BundleKey, BundleName, DependencyRef, DocumentConfig, DocumentId,
    InputSpec, OutputSpec, ParameterValue, ProcessorDecl, ResourceSpec, Version, DEFAULT_THEME,
};
pub use utils::{
    ContextStack, Diagnostic, Diagnostics, FileSystem, Level, MemoryFileSystem, OsFileSystem,
    PathResolver,
};

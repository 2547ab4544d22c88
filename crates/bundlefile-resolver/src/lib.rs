//! Resolution engine for bundlefile
//!
//! This crate loads documents through a [`ResolverContext`], merges their
//! imports, resolves every dependency reference to the closest matching
//! bundle variant, flattens transitive dependencies and exposes the
//! build-ready view consumed by the asset pipeline. Cycles between documents
//! or between bundles are reported as warnings, never as errors.

pub mod closest;
pub mod context;
pub mod document;
pub mod flatten;
pub mod imports;
pub mod processors;

// Re-export main types
pub use closest::find_closest;
pub use context::{LoadState, ResolverContext};
pub use document::{BuildReadyBundle, WatchList};
pub use flatten::FlattenState;
pub use processors::{ProcessorBatch, ProcessorResolver, ProcessorStep, ResolvedProcessors};

use bundlefile_core::error::BundleError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, BundleError>;

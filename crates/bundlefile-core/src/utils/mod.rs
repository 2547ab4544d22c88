//! Utility functions and helpers.
//!
//! Common functionality used across multiple bundlefile crates.

pub mod diagnostics;
pub mod fs;
pub mod path;

// Re-export commonly used utilities
pub use diagnostics::{ContextStack, Diagnostic, Diagnostics, Level};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use path::{absolutize, get_extension, is_glob, normalize_path, PathResolver};

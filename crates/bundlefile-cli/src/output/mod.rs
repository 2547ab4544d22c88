//! Terminal output formatting.
//!
//! Reports go to stdout, everything addressed to the user (diagnostics,
//! summaries) goes to stderr so reports can be piped.

pub mod colors;
pub mod errors;

use bundlefile_core::Diagnostic;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
    errors: errors::ErrorFormatter,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
            errors: errors::ErrorFormatter::new(),
        }
    }

    /// Print a report
    pub fn report(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("ok"), message);
    }

    /// Print a collected diagnostic
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        eprintln!("{}", self.errors.format_diagnostic(diagnostic));
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

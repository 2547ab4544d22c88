//! Error and diagnostic formatting with actionable suggestions.

use super::colors::ColorSupport;
use bundlefile_core::{BundleError, Diagnostic};
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    /// Create a new error formatter
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
        }
    }

    /// Format an error with its suggestion and source chain
    pub fn format_error(&self, error: &BundleError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            source = err.source();
        }

        output
    }

    /// Format a simple error message
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }

    /// Format a collected diagnostic, with its breadcrumb on a second line
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let mut output = format!(
            "{}: {}",
            self.colors.level(diagnostic.level, &diagnostic.level.to_string()),
            diagnostic.message
        );
        if let Some(context) = &diagnostic.context {
            output.push('\n');
            output.push_str(&self.colors.dim("  --> "));
            output.push_str(context);
        }
        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlefile_core::Level;

    #[test]
    fn test_format_error_includes_suggestion() {
        let formatter = ErrorFormatter::plain();
        let error = BundleError::UnknownProcessor {
            name: "uglify".to_string(),
        };
        let text = formatter.format_error(&error);

        assert!(text.starts_with("error: "));
        assert!(text.contains("uglify"));
        if let Some(suggestion) = error.suggestion() {
            assert!(text.contains(&format!("help: {}", suggestion)));
        }
    }

    #[test]
    fn test_format_diagnostic_with_context() {
        let formatter = ErrorFormatter::plain();
        let diagnostic = Diagnostic {
            level: Level::Warning,
            message: "Glob import 'shared/*.yml' is not expanded.".to_string(),
            context: Some("bundles.yml→imports→0".to_string()),
        };

        assert_eq!(
            formatter.format_diagnostic(&diagnostic),
            "warning: Glob import 'shared/*.yml' is not expanded.\n  --> bundles.yml→imports→0"
        );
    }
}

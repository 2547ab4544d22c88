//! Reportable problems collected during resolution.
//!
//! Malformed fragments, missing references and cycles never abort a
//! resolution. They are pushed into a [`Diagnostics`] collector together with
//! a breadcrumb of where in the document they were found, and are mirrored as
//! `tracing` events.

use serde::Serialize;
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    /// Breadcrumb such as `bundles.yml→packages→app→deps→0`
    pub context: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)?;
        if let Some(context) = &self.context {
            write!(f, " (in '{}')", context)?;
        }
        Ok(())
    }
}

/// Breadcrumb of the location being processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStack {
    segments: Vec<String>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descend into a segment
    pub fn enter(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Leave the innermost segment
    pub fn leave(&mut self) {
        self.segments.pop();
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Cut the stack back to `depth` segments
    pub fn truncate(&mut self, depth: usize) {
        self.segments.truncate(depth);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments joined with `→`
    pub fn render(&self) -> String {
        self.segments.join("→")
    }
}

/// Collector of every diagnostic reported during a resolution
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a tracing event
    pub fn push(&mut self, level: Level, message: impl Into<String>, context: Option<&ContextStack>) {
        let message = message.into();
        let context = context.filter(|c| !c.is_empty()).map(ContextStack::render);
        let location = context.as_deref().unwrap_or("");
        match level {
            Level::Info => tracing::info!(context = location, "{}", message),
            Level::Warning => tracing::warn!(context = location, "{}", message),
            Level::Error => tracing::error!(context = location, "{}", message),
        }
        self.entries.push(Diagnostic {
            level,
            message,
            context,
        });
    }

    pub fn info(&mut self, message: impl Into<String>, context: &ContextStack) {
        self.push(Level::Info, message, Some(context));
    }

    pub fn warning(&mut self, message: impl Into<String>, context: &ContextStack) {
        self.push(Level::Warning, message, Some(context));
    }

    pub fn error(&mut self, message: impl Into<String>, context: &ContextStack) {
        self.push(Level::Error, message, Some(context));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.level == level)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.at_level(Level::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.at_level(Level::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every collected diagnostic, leaving the collector empty
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_rendering() {
        let mut context = ContextStack::new();
        context.enter("bundles.yml");
        context.enter("packages");
        context.enter("app");
        context.enter("deps");
        context.enter("0");
        assert_eq!(context.render(), "bundles.yml→packages→app→deps→0");

        context.truncate(2);
        context.leave();
        assert_eq!(context.render(), "bundles.yml");
    }

    #[test]
    fn test_collecting_diagnostics() {
        let mut context = ContextStack::new();
        let mut diagnostics = Diagnostics::new();
        diagnostics.info("Loading", &context);
        context.enter("parameters");
        diagnostics.error("Invalid parameter name '0x'", &context);
        diagnostics.warning("File not found", &context);

        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().count(), 1);

        let all = diagnostics.drain();
        assert_eq!(all[0].context, None);
        assert_eq!(all[1].context.as_deref(), Some("parameters"));
        assert_eq!(
            all[1].to_string(),
            "error: Invalid parameter name '0x' (in 'parameters')"
        );
        assert!(diagnostics.is_empty());
    }
}

//! Option layering: defaults, environment variables, then CLI flags

use crate::options::{Environment, ResolveOptions};
use crate::ConfigResult;
use bundlefile_core::{BundleError, Diagnostics};
use std::collections::HashMap;

/// Prefix of the environment variables read as option overrides
pub const ENV_PREFIX: &str = "BUNDLEFILE_";

/// Where an option value came from
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// Built-in default
    Default,
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Layers option overrides on top of the defaults
#[derive(Debug, Clone, Default)]
pub struct OptionsLayering {
    /// Base options
    defaults: ResolveOptions,
    /// Environment overrides, keyed by variable name
    env_overrides: HashMap<String, String>,
    /// CLI flag overrides, keyed by option name
    cli_overrides: HashMap<String, String>,
}

impl OptionsLayering {
    /// Create a new layering over the default options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: ResolveOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_env_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    /// Add a CLI override (`env`, `theme`, `verbose`, `strict`, `watch` or `debug`)
    pub fn with_cli_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.cli_overrides.insert(key.into(), value.into());
        self
    }

    /// Merge every layer, CLI flags having the highest priority
    pub fn merge(&self, diagnostics: &mut Diagnostics) -> ConfigResult<ResolveOptions> {
        let mut merged = self.defaults.clone();

        // Apply environment variable overrides
        for (key, value) in &self.env_overrides {
            if let Some(option) = key.strip_prefix(ENV_PREFIX) {
                let source = OptionSource::Environment(key.clone());
                Self::apply(&mut merged, &option.to_lowercase(), value, &source, diagnostics)?;
            }
        }

        // Apply CLI flag overrides (highest priority)
        for (key, value) in &self.cli_overrides {
            Self::apply(&mut merged, key, value, &OptionSource::CommandLine, diagnostics)?;
        }

        Ok(merged)
    }

    fn apply(
        options: &mut ResolveOptions,
        key: &str,
        value: &str,
        source: &OptionSource,
        diagnostics: &mut Diagnostics,
    ) -> ConfigResult<()> {
        match key {
            "env" => options.environment = Environment::parse_or_dev(value, diagnostics),
            "theme" => options.theme = value.trim().to_string(),
            "verbose" => options.verbose = parse_flag(key, value, source)?,
            "strict" => options.strict = parse_flag(key, value, source)?,
            "watch" => options.watch = parse_flag(key, value, source)?,
            "debug" => options.debug = parse_flag(key, value, source)?,
            _ => {
                // Unknown override, ignore
                tracing::debug!(key, ?source, "Ignoring unknown option override");
            },
        }
        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn parse_flag(key: &str, value: &str, source: &OptionSource) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => {
            let field = match source {
                OptionSource::Environment(name) => name.clone(),
                _ => key.to_string(),
            };
            Err(BundleError::ConfigValidation {
                field,
                reason: format!("Expected a boolean, got '{}'", other),
            })
        },
    }
}

//! Resolution options

use bundlefile_core::{ContextStack, Diagnostics, DEFAULT_THEME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target environment, selects which output path of a resource is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prod)
    }

    /// Parse an environment name, falling back to `dev` with a warning
    pub fn parse_or_dev(value: &str, diagnostics: &mut Diagnostics) -> Self {
        value.parse().unwrap_or_else(|_| {
            diagnostics.warning(
                format!("Invalid environment '{}'. Falling back to 'dev'.", value),
                &ContextStack::new(),
            );
            Environment::Dev
        })
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options steering one resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    pub environment: Environment,
    /// Exposed to documents as the `_theme` parameter
    pub theme: String,
    /// Report malformed parameters and extensions
    pub verbose: bool,
    /// Warn about inputs that can never produce output
    pub strict: bool,
    /// Compute watch lists for the build-ready view
    pub watch: bool,
    /// Log every dependency decision
    pub debug: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            environment: Environment::Dev,
            theme: DEFAULT_THEME.to_string(),
            verbose: false,
            strict: false,
            watch: false,
            debug: false,
        }
    }
}

impl ResolveOptions {
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }
}

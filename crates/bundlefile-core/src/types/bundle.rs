//! Bundle data model.
//!
//! A bundle is one named, optionally themed and versioned unit of scripts,
//! styles and misc resources plus the bundles it depends on. Several
//! variants can share a name; they differ by theme and/or version.

use super::{AssetPath, DocumentId, Version};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Theme implicitly given to untagged variants of a themed bundle group
pub const DEFAULT_THEME: &str = "default";

/// Bundle name, `@`-prefixed names are local to their document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleName {
    pub name: String,
    pub shared: bool,
}

impl BundleName {
    /// Parse a raw name, returning `None` when it is not a valid bundle name
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, shared) = match raw.strip_prefix('@') {
            Some(rest) => (rest, false),
            None => (raw, true),
        };
        Self::is_valid(name).then(|| Self {
            name: name.to_string(),
            shared,
        })
    }

    /// Check a name without its `@` prefix
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            },
            _ => false,
        }
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.shared {
            f.write_str("@")?;
        }
        f.write_str(&self.name)
    }
}

/// Output location of a resource, per environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub dev: AssetPath,
    pub prod: AssetPath,
}

impl OutputSpec {
    /// Same output for both environments
    pub fn both(path: AssetPath) -> Self {
        Self {
            dev: path.clone(),
            prod: path,
        }
    }

    /// Output for the production or development environment
    pub fn select(&self, production: bool) -> &AssetPath {
        if production {
            &self.prod
        } else {
            &self.dev
        }
    }

    fn same_target(&self, other: &Self) -> bool {
        self.dev.same_target(&other.dev) && self.prod.same_target(&other.prod)
    }
}

/// A group of input files sharing the same processor overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub files: Vec<AssetPath>,
    /// Processor name to inline options, `None` to use the declared defaults
    pub processors: IndexMap<String, Option<Value>>,
}

impl InputSpec {
    fn same_content(&self, other: &Self) -> bool {
        self.processors == other.processors
            && self.files.len() == other.files.len()
            && self
                .files
                .iter()
                .zip(&other.files)
                .all(|(a, b)| a.same_target(b))
    }
}

/// Inputs of a resource and where they are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub inputs: Vec<InputSpec>,
    pub output: Option<OutputSpec>,
    /// Extra paths to watch
    pub watch: Vec<AssetPath>,
    /// Watch the input files themselves, `None` leaves it to the options
    pub auto_watch: Option<bool>,
}

impl ResourceSpec {
    /// Iterate over every input file, in declaration order
    pub fn input_files(&self) -> impl Iterator<Item = &AssetPath> {
        self.inputs.iter().flat_map(|input| input.files.iter())
    }

    /// Check if the resource declares at least one input file
    pub fn has_inputs(&self) -> bool {
        self.inputs.iter().any(|input| !input.files.is_empty())
    }

    /// Structural comparison ignoring which document wrote the paths
    pub fn same_content(&self, other: &Self) -> bool {
        let outputs_match = match (&self.output, &other.output) {
            (Some(a), Some(b)) => a.same_target(b),
            (None, None) => true,
            _ => false,
        };
        outputs_match
            && self.auto_watch == other.auto_watch
            && self.inputs.len() == other.inputs.len()
            && self
                .inputs
                .iter()
                .zip(&other.inputs)
                .all(|(a, b)| a.same_content(b))
            && self.watch.len() == other.watch.len()
            && self
                .watch
                .iter()
                .zip(&other.watch)
                .all(|(a, b)| a.same_target(b))
    }
}

/// Reference to a bundle, possibly in another document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Document the bundle is searched in
    pub target: DocumentId,
    pub name: String,
    pub theme: Option<String>,
    /// Minimum version, unconstrained when its text is `None`
    pub version: Version,
}

impl DependencyRef {
    /// Rendered as `name[:theme][#version]`
    pub fn identity(&self) -> String {
        identity(&self.name, self.theme.as_deref(), &self.version)
    }

    /// Same request, asking for the default theme
    pub fn with_default_theme(&self) -> Self {
        Self {
            theme: Some(DEFAULT_THEME.to_string()),
            ..self.clone()
        }
    }

    fn same_request(&self, other: &Self) -> bool {
        self.name == other.name && self.theme == other.theme && self.version.text == other.version.text
    }
}

/// One bundle variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Document the bundle currently belongs to
    pub owner: DocumentId,
    /// Document the bundle was declared in
    pub original_owner: DocumentId,
    pub name: BundleName,
    pub theme: Option<String>,
    pub version: Version,
    /// Only standalone bundles produce build-ready output
    pub standalone: bool,
    pub deps_flattened: bool,
    pub scripts: Option<ResourceSpec>,
    pub styles: Option<ResourceSpec>,
    pub misc: Vec<ResourceSpec>,
    /// Dependencies, transitive ones included once flattened
    pub deps: Vec<DependencyRef>,
    /// Dependencies as written in the document
    pub declared_deps: Vec<DependencyRef>,
}

impl Bundle {
    /// Create an empty standalone bundle
    pub fn new(owner: DocumentId, name: BundleName) -> Self {
        Self {
            owner,
            original_owner: owner,
            name,
            theme: None,
            version: Version::any(),
            standalone: true,
            deps_flattened: false,
            scripts: None,
            styles: None,
            misc: Vec::new(),
            deps: Vec::new(),
            declared_deps: Vec::new(),
        }
    }

    /// Rendered as `name[:theme][#version]`
    pub fn identity(&self) -> String {
        identity(&self.name.name, self.theme.as_deref(), &self.version)
    }

    /// Compare resources, standalone flag and declared dependencies.
    ///
    /// Ownership, theme and version are not part of the content.
    pub fn same_content(&self, other: &Self) -> bool {
        fn same_resource(a: &Option<ResourceSpec>, b: &Option<ResourceSpec>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a.same_content(b),
                (None, None) => true,
                _ => false,
            }
        }

        self.standalone == other.standalone
            && same_resource(&self.scripts, &other.scripts)
            && same_resource(&self.styles, &other.styles)
            && self.misc.len() == other.misc.len()
            && self.misc.iter().zip(&other.misc).all(|(a, b)| a.same_content(b))
            && self.declared_deps.len() == other.declared_deps.len()
            && self
                .declared_deps
                .iter()
                .zip(&other.declared_deps)
                .all(|(a, b)| a.same_request(b))
    }

    /// Check if the bundle has anything to build
    pub fn has_resources(&self) -> bool {
        self.scripts.is_some() || self.styles.is_some() || !self.misc.is_empty()
    }
}

/// Give the default theme to untagged variants when any variant is themed
pub fn apply_default_theme(variants: &mut [Bundle]) {
    if variants.iter().any(|b| b.theme.is_some()) {
        for bundle in variants.iter_mut().filter(|b| b.theme.is_none()) {
            bundle.theme = Some(DEFAULT_THEME.to_string());
        }
    }
}

fn identity(name: &str, theme: Option<&str>, version: &Version) -> String {
    let mut out = name.to_string();
    if let Some(theme) = theme {
        out.push(':');
        out.push_str(theme);
    }
    if let Some(text) = &version.text {
        out.push('#');
        out.push_str(text);
    }
    out
}

/// Position of a bundle variant in the document arena
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleKey {
    pub document: DocumentId,
    pub name: String,
    pub index: usize,
}

impl BundleKey {
    pub fn new(document: DocumentId, name: impl Into<String>, index: usize) -> Self {
        Self {
            document,
            name: name.into(),
            index,
        }
    }
}

//! Normalized document configuration.

use super::{AssetPath, Bundle};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a loaded document, assigned from 1 upward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar value of a document parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Number(serde_json::Number),
}

impl ParameterValue {
    /// Narrow a raw value to a parameter value, rejecting non-scalars
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(s) => f.write_str(s),
            ParameterValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Processor declared at document level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorDecl {
    pub name: String,
    /// Registered callback implementing the processor, defaults to `name`
    pub callback: String,
    /// Lowercase extensions without leading dot
    pub extensions: Vec<String>,
    /// Default options, an object
    pub options: Value,
}

impl ProcessorDecl {
    /// Check if the processor applies to files with this extension
    pub fn matches_extension(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// One loaded and normalized document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub id: DocumentId,
    pub path: Utf8PathBuf,
    pub parameters: IndexMap<String, ParameterValue>,
    pub processors: Vec<ProcessorDecl>,
    /// Bundle variants grouped by name, in declaration order
    pub bundles: IndexMap<String, Vec<Bundle>>,
    pub imports: Vec<AssetPath>,
}

impl DocumentConfig {
    /// Create an empty configuration for a document
    pub fn new(id: DocumentId, path: Utf8PathBuf) -> Self {
        Self {
            id,
            path,
            parameters: IndexMap::new(),
            processors: Vec::new(),
            bundles: IndexMap::new(),
            imports: Vec::new(),
        }
    }

    /// Get every variant declared under a name
    pub fn variants(&self, name: &str) -> &[Bundle] {
        self.bundles.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over all bundles of the document
    pub fn iter_bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.values().flatten()
    }

    /// Total number of bundle variants
    pub fn bundle_count(&self) -> usize {
        self.bundles.values().map(Vec::len).sum()
    }
}

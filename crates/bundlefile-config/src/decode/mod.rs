//! Document decoding
//!
//! Every supported format is decoded into a `serde_json::Value` with
//! insertion-ordered maps, so the normalizer only deals with one tagged
//! value type.

use crate::ConfigResult;
use bundlefile_core::BundleError;
use camino::Utf8Path;
use serde_json::Value;

/// Serialization format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Guess the format from the file extension, YAML when unknown
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension().map(str::to_lowercase).as_deref() {
            Some("json") => DocumentFormat::Json,
            Some("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Yaml,
        }
    }

    /// Check if an extension names a supported document format
    pub fn is_document_extension(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "yml" | "yaml" | "json" | "toml"
        )
    }
}

/// Decode a document into a generic value
pub fn decode_document(path: &Utf8Path, contents: &str) -> ConfigResult<Value> {
    let format = DocumentFormat::from_path(path);
    tracing::trace!(%path, ?format, "Decoding document");

    let value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(contents)
            .map_err(|e| BundleError::decode(path.as_str(), e))?,
        DocumentFormat::Json => serde_json::from_str::<Value>(contents)
            .map_err(|e| BundleError::decode(path.as_str(), e))?,
        DocumentFormat::Toml => toml::from_str::<Value>(contents)
            .map_err(|e| BundleError::decode(path.as_str(), e))?,
    };
    Ok(value)
}

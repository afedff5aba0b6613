//! Document format dispatch
//!
//! Graphs and configuration overrides are read from JSON or YAML documents.
//! The format is picked from the file extension.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{LayoutError, LayoutResult};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// File extensions this format handles
    pub fn supported_extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentFormat::Json => &["json"],
            DocumentFormat::Yaml => &["yaml", "yml"],
        }
    }

    /// Check if this format handles the given file extension
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Pick the format from a path's extension
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| LayoutError::UnknownExtension(path.display().to_string()))?;

        [DocumentFormat::Json, DocumentFormat::Yaml]
            .into_iter()
            .find(|f| f.supports_extension(ext))
            .ok_or_else(|| LayoutError::UnknownExtension(path.display().to_string()))
    }

    /// Parse a document held in memory
    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> LayoutResult<T> {
        Ok(match self {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        })
    }
}

/// Read and parse a JSON or YAML document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> LayoutResult<T> {
    let format = DocumentFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;
    format.parse(&content)
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> LayoutResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

//! Error type for the fallible edges of the crate
//!
//! The simulation itself never fails: out-of-range input is clamped and
//! unresolvable links are skipped. Errors only arise when naming a preset
//! that does not exist or when reading graph and configuration documents.

use thiserror::Error;

/// Errors raised while resolving presets or loading documents
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The preset name is not one of the built-in presets
    #[error("unknown preset: {0} (expected one of: default, dense, sparse, clustered, radial)")]
    UnknownPreset(String),

    /// The document format could not be determined from the path
    #[error("could not determine document format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML document could not be parsed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for preset and document operations
pub type LayoutResult<T> = Result<T, LayoutError>;

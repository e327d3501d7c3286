//! Error types for the catalog module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while querying the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Extraction binary not found.
    #[error("Catalog tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The extraction tool exited unsuccessfully.
    #[error("Catalog query failed: {reason}")]
    ToolFailed { reason: String },

    /// The tool's JSON could not be understood.
    #[error("Failed to parse catalog output: {reason}")]
    ParseError { reason: String },

    /// The query returned nothing usable.
    #[error("No catalog entry for {query}")]
    NotFound { query: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn tool_failed(reason: impl Into<String>) -> Self {
        Self::ToolFailed {
            reason: reason.into(),
        }
    }
}

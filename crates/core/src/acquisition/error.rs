//! Error types for the acquisition module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the acquisition tool.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Acquisition binary not found.
    #[error("Acquisition tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool could not be started or waited on.
    #[error("Acquisition tool failed: {reason}")]
    ToolFailed { reason: String },

    /// I/O error while preparing the attempt.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AcquireError {
    pub fn tool_failed(reason: impl Into<String>) -> Self {
        Self::ToolFailed {
            reason: reason.into(),
        }
    }

    /// Whether another attempt can possibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ToolNotFound { .. })
    }
}

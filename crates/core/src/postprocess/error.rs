//! Error types for the post-processing module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while post-processing a file.
#[derive(Debug, Error)]
pub enum PostProcessError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// The encoder could not be driven to completion.
    #[error("Encoder failed: {reason}")]
    ToolFailed { reason: String },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Moving the produced file into place failed.
    #[error("Failed to replace {source_path} with {produced}")]
    ReplaceFailed {
        produced: PathBuf,
        source_path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// I/O error during processing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PostProcessError {
    pub fn tool_failed(reason: impl Into<String>) -> Self {
        Self::ToolFailed {
            reason: reason.into(),
        }
    }

    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }
}

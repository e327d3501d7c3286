//! Mock acquisition tool for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::acquisition::{AcquireError, AcquisitionStrategy, AcquisitionTool, MediaItem};

/// A recorded attempt for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAttempt {
    /// Identifier of the item being fetched.
    pub item_id: String,
    /// Format selector of the strategy used.
    pub selector: String,
    /// Whether the alternate client was requested.
    pub alternate_client: bool,
}

/// Mock implementation of the AcquisitionTool trait.
///
/// Fails every attempt by default. Configure it to succeed on the n-th
/// attempt (counted across all items), in which case it writes
/// `<title> [<id>].<ext>` into the output directory.
#[derive(Debug, Clone)]
pub struct MockAcquisitionTool {
    attempts: Arc<RwLock<Vec<RecordedAttempt>>>,
    succeed_on_attempt: Arc<RwLock<Option<usize>>>,
    exit_success: Arc<RwLock<bool>>,
    create_output: Arc<RwLock<bool>>,
    tool_missing: Arc<RwLock<bool>>,
    output_extension: Arc<RwLock<String>>,
}

impl Default for MockAcquisitionTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAcquisitionTool {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(Vec::new())),
            succeed_on_attempt: Arc::new(RwLock::new(None)),
            exit_success: Arc::new(RwLock::new(false)),
            create_output: Arc::new(RwLock::new(true)),
            tool_missing: Arc::new(RwLock::new(false)),
            output_extension: Arc::new(RwLock::new("mp4".to_string())),
        }
    }

    /// Get all recorded attempts.
    pub async fn attempts(&self) -> Vec<RecordedAttempt> {
        self.attempts.read().await.clone()
    }

    /// Attempts made for one identifier.
    pub async fn attempts_for(&self, id: &str) -> usize {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.item_id == id)
            .count()
    }

    /// Succeed on the given 1-based attempt number and every one after it.
    pub async fn set_succeed_on_attempt(&self, attempt: Option<usize>) {
        *self.succeed_on_attempt.write().await = attempt;
    }

    /// Make every attempt exit successfully.
    pub async fn set_exit_success(&self, success: bool) {
        *self.exit_success.write().await = success;
    }

    /// Whether a successful attempt writes its output file.
    pub async fn set_create_output(&self, create: bool) {
        *self.create_output.write().await = create;
    }

    /// Simulate a missing binary.
    pub async fn set_tool_missing(&self, missing: bool) {
        *self.tool_missing.write().await = missing;
    }

    /// Extension of the produced file.
    pub async fn set_output_extension(&self, ext: impl Into<String>) {
        *self.output_extension.write().await = ext.into();
    }
}

#[async_trait]
impl AcquisitionTool for MockAcquisitionTool {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run_attempt(
        &self,
        item: &MediaItem,
        strategy: &AcquisitionStrategy,
        output_dir: &Path,
    ) -> Result<bool, AcquireError> {
        let attempt_number = {
            let mut attempts = self.attempts.write().await;
            attempts.push(RecordedAttempt {
                item_id: item.id.clone(),
                selector: strategy.selector.clone(),
                alternate_client: strategy.alternate_client,
            });
            attempts.len()
        };

        if *self.tool_missing.read().await {
            return Err(AcquireError::ToolNotFound {
                path: PathBuf::from("mock-tool"),
            });
        }

        let success = *self.exit_success.read().await
            || self
                .succeed_on_attempt
                .read()
                .await
                .is_some_and(|n| attempt_number >= n);

        if success && *self.create_output.read().await {
            let ext = self.output_extension.read().await.clone();
            let name = format!("{} [{}].{}", item.display_title(), item.id, ext);
            tokio::fs::write(output_dir.join(name), b"media").await?;
        }

        Ok(success)
    }
}

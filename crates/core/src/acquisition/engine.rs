//! Layered retry/fallback engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::config::DownloaderConfig;
use super::locator::locate;
use super::tool::AcquisitionTool;
use super::types::{fallback_strategy, primary_strategies, AcquisitionStrategy, MediaItem};

/// How one strategy ended.
enum StrategyOutcome {
    Acquired(PathBuf),
    Exhausted,
    /// Nothing further can succeed, e.g. the tool binary is missing.
    Aborted,
}

/// Drives an [`AcquisitionTool`] through the ordered strategy list.
pub struct Acquirer {
    tool: Arc<dyn AcquisitionTool>,
    retry_delay: Duration,
    strategy_delay: Duration,
}

impl Acquirer {
    pub fn new(tool: Arc<dyn AcquisitionTool>, config: &DownloaderConfig) -> Self {
        Self {
            tool,
            retry_delay: config.retry_delay(),
            strategy_delay: config.strategy_delay(),
        }
    }

    /// Acquires `item` into `output_dir`, trying every primary strategy and
    /// then the alternate-client fallback, each up to `max_retries + 1` times.
    ///
    /// Returns the produced file, or `None` once everything is exhausted.
    pub async fn acquire(
        &self,
        item: &MediaItem,
        output_dir: &Path,
        max_retries: u32,
    ) -> Option<PathBuf> {
        let mut strategies = primary_strategies();
        strategies.push(fallback_strategy());
        let total = strategies.len();

        for (index, strategy) in strategies.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.strategy_delay).await;
            }
            if strategy.alternate_client {
                warn!(id = %item.id, "All primary strategies failed, trying alternate client");
            }
            info!(
                id = %item.id,
                strategy = %strategy,
                "Strategy {}/{}",
                index + 1,
                total
            );

            match self
                .try_strategy(item, strategy, output_dir, max_retries)
                .await
            {
                StrategyOutcome::Acquired(path) => {
                    info!(id = %item.id, path = %path.display(), "Acquired");
                    return Some(path);
                }
                StrategyOutcome::Exhausted => {}
                StrategyOutcome::Aborted => return None,
            }
        }

        error!(id = %item.id, title = %item.display_title(), "All strategies exhausted");
        None
    }

    async fn try_strategy(
        &self,
        item: &MediaItem,
        strategy: &AcquisitionStrategy,
        output_dir: &Path,
        max_retries: u32,
    ) -> StrategyOutcome {
        for attempt in 0..=max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }

            match self.tool.run_attempt(item, strategy, output_dir).await {
                Ok(true) => match locate(output_dir, &item.id).await {
                    Some(path) => return StrategyOutcome::Acquired(path),
                    None => warn!(
                        id = %item.id,
                        attempt = attempt + 1,
                        "Tool reported success but no output file was found"
                    ),
                },
                Ok(false) => warn!(
                    id = %item.id,
                    attempt = attempt + 1,
                    max = max_retries + 1,
                    tool = self.tool.name(),
                    "Attempt failed"
                ),
                Err(e) if !e.is_retryable() => {
                    error!(id = %item.id, error = %e, "Giving up on acquisition");
                    return StrategyOutcome::Aborted;
                }
                Err(e) => warn!(
                    id = %item.id,
                    attempt = attempt + 1,
                    error = %e,
                    "Attempt errored"
                ),
            }
        }
        StrategyOutcome::Exhausted
    }
}

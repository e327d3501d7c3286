//! Background worker that runs post-processing jobs one at a time.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::command::build_ffmpeg_args;
use super::config::PostProcessConfig;
use super::error::PostProcessError;
use super::progress::ProgressTracker;
use super::queue::QueueReceiver;
use super::tool::MediaTool;
use super::types::{JobMode, JobState, OutputPlan, PostProcessJob, WorkerStats};
use crate::acquisition::thumbnail_path;
use crate::ledger::AppendLog;

/// Consumes the queue, one job at a time.
pub struct PostProcessWorker {
    receiver: QueueReceiver,
    tool: Arc<dyn MediaTool>,
    config: PostProcessConfig,
    outcome_log: AppendLog,
    stop: Arc<AtomicBool>,
    stats: WorkerStats,
}

impl PostProcessWorker {
    pub fn new(
        receiver: QueueReceiver,
        tool: Arc<dyn MediaTool>,
        config: PostProcessConfig,
        outcome_log: AppendLog,
    ) -> Self {
        Self {
            receiver,
            tool,
            config,
            outcome_log,
            stop: Arc::new(AtomicBool::new(false)),
            stats: WorkerStats::default(),
        }
    }

    /// Spawns [`run`](Self::run) on the runtime.
    pub fn spawn(self) -> WorkerHandle {
        let stop = self.stop.clone();
        let task = tokio::spawn(self.run());
        WorkerHandle { stop, task }
    }

    /// Processes jobs until the stop flag is set or every producer is gone.
    ///
    /// The flag is checked between dequeue attempts, so a running job always
    /// finishes first.
    pub async fn run(mut self) -> WorkerStats {
        info!(tool = self.tool.name(), "Post-process worker started");
        let poll_interval = self.config.poll_interval();

        while !self.stop.load(Ordering::SeqCst) {
            let job = match timeout(poll_interval, self.receiver.recv()).await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    debug!("Post-process queue closed");
                    break;
                }
                Err(_) => continue,
            };

            let state = self.process(job).await;
            self.stats.record(state);
            self.receiver.complete();
        }

        let discarded = self.receiver.close();
        if discarded > 0 {
            warn!(discarded, "Stopped with jobs still queued");
        }

        info!(
            succeeded = self.stats.succeeded,
            failed = self.stats.failed,
            errored = self.stats.errored,
            "Post-process worker shutting down"
        );
        self.stats
    }

    async fn process(&self, mut job: PostProcessJob) -> JobState {
        let callback = job.take_callback();
        let plan = job.plan_output();
        debug!(source = %job.source.display(), state = %JobState::Running, "Processing job");

        let outcome = AssertUnwindSafe(self.execute(&job, &plan))
            .catch_unwind()
            .await;

        let (state, line, reported_path) = match outcome {
            Ok(Ok(success)) => {
                let status = if success { "OK" } else { "FAIL" };
                let line = format!(
                    "{status}: {} -> {}",
                    file_name(&job.source),
                    file_name(&plan.final_path)
                );
                let state = if success {
                    JobState::Succeeded
                } else {
                    JobState::Failed
                };
                (state, line, plan.final_path.clone())
            }
            Ok(Err(e)) => {
                error!(source = %job.source.display(), error = %e, "Post-processing errored");
                let line = format!("ERROR: {} | {e}", job.source.display());
                (JobState::Errored, line, job.source.clone())
            }
            Err(panic) => {
                let detail = panic_message(&*panic);
                error!(source = %job.source.display(), detail = %detail, "Post-processing panicked");
                let line = format!("ERROR: {} | {detail}", job.source.display());
                (JobState::Errored, line, job.source.clone())
            }
        };

        if let Err(e) = self.outcome_log.append(&line).await {
            error!(error = %e, "Failed to write post-process outcome");
        }

        if let Some(callback) = callback {
            let success = state == JobState::Succeeded;
            let invoked =
                std::panic::catch_unwind(AssertUnwindSafe(|| callback(&reported_path, success)));
            if invoked.is_err() {
                error!(source = %job.source.display(), "Completion callback panicked");
            }
        }

        state
    }

    /// Runs one job. `Ok(false)` is a failed encode, `Err` an unexpected error.
    async fn execute(&self, job: &PostProcessJob, plan: &OutputPlan) -> Result<bool, PostProcessError> {
        let thumbnail = thumbnail_path(&job.source);
        let thumbnail = fs::try_exists(&thumbnail)
            .await
            .unwrap_or(false)
            .then_some(thumbnail);

        let args = build_ffmpeg_args(job, &plan.write_to, thumbnail.as_deref(), &self.config);
        info!(
            mode = %job.mode,
            cover_art = thumbnail.is_some(),
            "Starting: {} -> {}",
            file_name(&job.source),
            file_name(&plan.write_to)
        );

        let total_frames =
            estimate_total_frames(self.tool.as_ref(), &job.source, self.config.default_fps).await;

        let verb = match job.mode {
            JobMode::Transcode { .. } => "Transcoding",
            JobMode::Remux => "Remuxing",
        };
        let mut tracker = ProgressTracker::new(
            format!("{verb} {}", file_name(&job.source)),
            total_frames,
        )
        .with_render_interval(self.config.render_interval());
        let show_progress = self.config.show_progress;

        let result = {
            let mut on_line = |line: &str| {
                debug!(line, "ffmpeg");
                tracker.feed(line);
                if show_progress {
                    if let Some(rendered) = tracker.poll_render() {
                        eprint!("\r{rendered}");
                    }
                }
            };
            self.tool.encode(&args, &mut on_line).await
        };

        let exit_ok = match result {
            Ok(ok) => ok,
            Err(e) => {
                if show_progress {
                    eprintln!();
                }
                return Err(e);
            }
        };

        let produced = fs::try_exists(&plan.write_to).await.unwrap_or(false);
        let success = exit_ok && produced;
        if show_progress {
            eprintln!("\r{}", tracker.finish(success));
        }

        if success {
            self.finalize(job, plan, thumbnail.as_deref()).await?;
            info!(path = %plan.final_path.display(), "Post-processing complete");
        } else {
            warn!(
                source = %job.source.display(),
                exit_ok,
                produced,
                "Post-processing failed"
            );
            if plan.replaces_source && produced {
                if let Err(e) = fs::remove_file(&plan.write_to).await {
                    warn!(path = %plan.write_to.display(), error = %e, "Failed to remove temp output");
                }
            }
        }

        Ok(success)
    }

    async fn finalize(
        &self,
        job: &PostProcessJob,
        plan: &OutputPlan,
        thumbnail: Option<&Path>,
    ) -> Result<(), PostProcessError> {
        if plan.replaces_source {
            fs::rename(&plan.write_to, &job.source)
                .await
                .map_err(|error| PostProcessError::ReplaceFailed {
                    produced: plan.write_to.clone(),
                    source_path: job.source.clone(),
                    error,
                })?;
        } else if let Err(e) = fs::remove_file(&job.source).await {
            warn!(path = %job.source.display(), error = %e, "Failed to remove source");
        }

        if let Some(thumb) = thumbnail {
            if let Err(e) = fs::remove_file(thumb).await {
                warn!(path = %thumb.display(), error = %e, "Failed to remove thumbnail");
            }
        }
        Ok(())
    }
}

/// Handle to a spawned [`PostProcessWorker`].
#[derive(Debug)]
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<WorkerStats>,
}

impl WorkerHandle {
    /// Asks the worker to stop after its current job and waits for it.
    pub async fn stop(self) -> WorkerStats {
        self.stop.store(true, Ordering::SeqCst);
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Post-process worker task failed");
                WorkerStats::default()
            }
        }
    }
}

/// Frame total used to size the progress bar. Zero means unknown.
///
/// Failing to read the stream is not fatal; progress falls back to a plain readout.
pub async fn estimate_total_frames(
    tool: &dyn MediaTool,
    source: &Path,
    default_fps: f64,
) -> u64 {
    let stream = match tool.probe_stream(source).await {
        Ok(info) => info,
        Err(e) => {
            debug!(error = %e, "Stream probe failed, progress will be approximate");
            Default::default()
        }
    };
    stream.estimated_frames(default_fps)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during processing".to_string()
    }
}

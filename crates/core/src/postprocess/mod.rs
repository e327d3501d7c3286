//! Post-processing of acquired files.
//!
//! A single [`PostProcessWorker`] drains an unbounded FIFO of
//! [`PostProcessJob`] values. Each job either re-encodes its source
//! ([`JobMode::Transcode`]) or stream-copies it ([`JobMode::Remux`]) into an
//! MP4, embedding metadata and an adjacent thumbnail as cover art.
//!
//! # Job lifecycle
//!
//! `queued -> running -> {succeeded, failed}`. An unexpected error while
//! running is logged as `ERROR` and is just as terminal. Jobs are never
//! retried, and every outcome releases one slot of the pending count, so
//! [`PostProcessQueue::drain`] cannot hang on a bad input.
//!
//! # Example
//!
//! ```ignore
//! use vidfetch_core::postprocess::{
//!     create_post_process_queue, FfmpegTool, JobMode, PostProcessConfig, PostProcessJob,
//!     PostProcessWorker,
//! };
//!
//! let config = PostProcessConfig::default();
//! let (queue, receiver) = create_post_process_queue();
//! let worker = PostProcessWorker::new(
//!     receiver,
//!     Arc::new(FfmpegTool::new(config.clone())),
//!     config,
//!     AppendLog::new("/media/transcode.log"),
//! )
//! .spawn();
//!
//! queue.enqueue(PostProcessJob::new("/media/clip [abcdefgh123].webm", JobMode::Transcode { crf: 23 }));
//! queue.drain().await;
//! let stats = worker.stop().await;
//! ```

mod command;
mod config;
mod error;
mod progress;
mod queue;
mod tool;
mod types;
mod worker;

pub use command::build_ffmpeg_args;
pub use config::PostProcessConfig;
pub use error::PostProcessError;
pub use progress::{format_hms, ProgressTracker};
pub use queue::{create_post_process_queue, PostProcessQueue, QueueReceiver};
pub use tool::{
    parse_format_tags, parse_frame_rate, parse_stream_probe, read_status_lines, FfmpegTool,
    MediaTool, StatusLineSink,
};
pub use types::{
    CompletionCallback, ContainerTags, EmbeddedMetadata, JobMode, JobState, OutputPlan,
    PostProcessJob, StreamInfo, WorkerStats, TARGET_EXTENSION,
};
pub use worker::{estimate_total_frames, PostProcessWorker, WorkerHandle};

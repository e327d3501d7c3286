//! Configuration for the post-processing module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the ffmpeg-based post-processing worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostProcessConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Constant rate factor for transcodes (0-51, lower is better).
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// x264 speed/quality preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Video encoder used by transcodes.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Output pixel format.
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,

    /// Audio encoder used by transcodes.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate used by transcodes.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// FFmpeg log level.
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Minimum time between progress redraws, in milliseconds.
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,

    /// How long the worker waits for a job before re-checking its stop flag.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Frame rate assumed when the probe yields nothing usable.
    #[serde(default = "default_fps")]
    pub default_fps: f64,

    /// Draw the progress line on stderr.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_crf() -> u8 {
    23
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_pix_fmt() -> String {
    "yuv420p".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "160k".to_string()
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_render_interval_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_fps() -> f64 {
    30.0
}

fn default_show_progress() -> bool {
    true
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            crf: default_crf(),
            preset: default_preset(),
            video_codec: default_video_codec(),
            pix_fmt: default_pix_fmt(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            ffmpeg_log_level: default_log_level(),
            render_interval_ms: default_render_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            default_fps: default_fps(),
            show_progress: default_show_progress(),
        }
    }
}

impl PostProcessConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    pub fn with_show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

//! FFmpeg command construction.

use std::path::Path;

use super::config::PostProcessConfig;
use super::types::{JobMode, PostProcessJob};

/// Builds ffmpeg arguments for `job`, writing to `output`.
///
/// The primary video stream and the optional primary audio stream are
/// mapped explicitly. When a thumbnail is given it becomes a second,
/// attached-picture video stream.
pub fn build_ffmpeg_args(
    job: &PostProcessJob,
    output: &Path,
    thumbnail: Option<&Path>,
    config: &PostProcessConfig,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        config.ffmpeg_log_level.clone(),
        "-stats".to_string(),
        "-i".to_string(),
        job.source.to_string_lossy().into_owned(),
    ];

    if let Some(thumb) = thumbnail {
        args.extend(["-i".to_string(), thumb.to_string_lossy().into_owned()]);
    }

    args.extend(["-map".to_string(), "0:v:0".to_string()]);
    args.extend(["-map".to_string(), "0:a:0?".to_string()]);
    if thumbnail.is_some() {
        args.extend(["-map".to_string(), "1:v:0".to_string()]);
    }

    match job.mode {
        JobMode::Transcode { crf } => {
            args.extend([
                "-c:v:0".to_string(),
                config.video_codec.clone(),
                "-crf".to_string(),
                crf.to_string(),
                "-preset".to_string(),
                config.preset.clone(),
                "-pix_fmt".to_string(),
                config.pix_fmt.clone(),
                "-c:a:0".to_string(),
                config.audio_codec.clone(),
                "-b:a:0".to_string(),
                config.audio_bitrate.clone(),
            ]);
        }
        JobMode::Remux => {
            args.extend([
                "-c:v:0".to_string(),
                "copy".to_string(),
                "-c:a:0".to_string(),
                "copy".to_string(),
            ]);
        }
    }

    // Cover art
    if thumbnail.is_some() {
        args.extend([
            "-c:v:1".to_string(),
            "mjpeg".to_string(),
            "-disposition:v:1".to_string(),
            "attached_pic".to_string(),
        ]);
    }

    args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    args.extend(job.metadata.to_ffmpeg_args());
    args.push(output.to_string_lossy().into_owned());
    args
}

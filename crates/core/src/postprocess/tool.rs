//! The media tool seam and its ffmpeg/ffprobe implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::config::PostProcessConfig;
use super::error::PostProcessError;
use super::types::{ContainerTags, StreamInfo};

/// Receives encoder status lines as they arrive.
pub type StatusLineSink<'a> = dyn FnMut(&str) + Send + 'a;

/// Probing and encoding of media files.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Returns the name of this tool implementation.
    fn name(&self) -> &str;

    /// Frame count and frame rate of the primary video stream.
    async fn probe_stream(&self, path: &Path) -> Result<StreamInfo, PostProcessError>;

    /// Container-level metadata tags.
    async fn probe_tags(&self, path: &Path) -> Result<ContainerTags, PostProcessError>;

    /// Runs the encoder with `args`, handing every status line to `on_line`.
    ///
    /// Returns whether the encoder exited successfully.
    async fn encode(
        &self,
        args: &[String],
        on_line: &mut StatusLineSink<'_>,
    ) -> Result<bool, PostProcessError>;
}

/// ffmpeg and ffprobe run as subprocesses.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    config: PostProcessConfig,
}

impl FfmpegTool {
    pub fn new(config: PostProcessConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(PostProcessConfig::default())
    }

    async fn ffprobe(&self, args: &[&str], path: &Path) -> Result<String, PostProcessError> {
        let output = Command::new(&self.config.ffprobe_path)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PostProcessError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    PostProcessError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(PostProcessError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe_stream(&self, path: &Path) -> Result<StreamInfo, PostProcessError> {
        let json = self
            .ffprobe(
                &[
                    "-v",
                    "quiet",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "stream=nb_frames,r_frame_rate,duration",
                    "-of",
                    "json",
                ],
                path,
            )
            .await?;
        parse_stream_probe(&json)
    }

    async fn probe_tags(&self, path: &Path) -> Result<ContainerTags, PostProcessError> {
        let json = self
            .ffprobe(&["-v", "quiet", "-show_format", "-of", "json"], path)
            .await?;
        parse_format_tags(&json)
    }

    async fn encode(
        &self,
        args: &[String],
        on_line: &mut StatusLineSink<'_>,
    ) -> Result<bool, PostProcessError> {
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PostProcessError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    PostProcessError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| PostProcessError::tool_failed("stderr was not captured"))?;
        let mut reader = BufReader::new(stderr);
        read_status_lines(&mut reader, on_line).await?;

        let status = child.wait().await?;
        Ok(status.success())
    }
}

/// Splits a status stream on both `\r` and `\n`.
///
/// `-stats` redraws its line with carriage returns, so newline-only
/// splitting would hold every update back until the encode ends.
pub async fn read_status_lines<R, F>(reader: &mut R, on_line: &mut F) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin + ?Sized,
    F: FnMut(&str) + ?Sized,
{
    let mut pending: Vec<u8> = Vec::new();
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            break;
        }
        let len = buf.len();
        for &byte in buf {
            if byte == b'\r' || byte == b'\n' {
                emit_line(&mut pending, on_line);
            } else {
                pending.push(byte);
            }
        }
        reader.consume(len);
    }
    emit_line(&mut pending, on_line);
    Ok(())
}

fn emit_line<F>(pending: &mut Vec<u8>, on_line: &mut F)
where
    F: FnMut(&str) + ?Sized,
{
    {
        let line = String::from_utf8_lossy(pending);
        let line = line.trim();
        if !line.is_empty() {
            on_line(line);
        }
    }
    pending.clear();
}

/// Parses `-show_entries stream=nb_frames,r_frame_rate,duration -of json`.
pub fn parse_stream_probe(json: &str) -> Result<StreamInfo, PostProcessError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        nb_frames: Option<String>,
        r_frame_rate: Option<String>,
        duration: Option<String>,
    }

    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| PostProcessError::probe_failed(format!("invalid ffprobe JSON: {e}")))?;

    let Some(stream) = probe.streams.into_iter().next() else {
        return Ok(StreamInfo::default());
    };

    Ok(StreamInfo {
        total_frames: stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0),
        fps: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
        duration_secs: stream
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0),
    })
}

/// Parses `30000/1001` or `25`. Zero or invalid rates yield `None`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Parses `-show_format -of json` into its tag map.
pub fn parse_format_tags(json: &str) -> Result<ContainerTags, PostProcessError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: Option<ProbeFormat>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        #[serde(default)]
        tags: HashMap<String, String>,
    }

    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| PostProcessError::probe_failed(format!("invalid ffprobe JSON: {e}")))?;

    let format = probe
        .format
        .ok_or_else(|| PostProcessError::probe_failed("no format section"))?;
    Ok(ContainerTags::new(format.tags))
}

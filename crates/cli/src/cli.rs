use clap::Parser;
use std::path::PathBuf;

use vidfetch_core::Config;

#[derive(Debug, Parser)]
#[command(name = "vidfetch")]
#[command(author, version, about = "Download a channel, playlist or video and normalize it to MP4")]
pub struct Cli {
    /// Channel, playlist or single-video URL
    #[arg(long)]
    pub channel_url: String,

    /// Directory for media and log files
    #[arg(long)]
    pub output_path: Option<PathBuf>,

    /// Retries per download strategy
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Constant rate factor for transcodes (0-51, lower is better)
    #[arg(long)]
    pub crf_quality: Option<u8>,

    /// Only download videos uploaded after this date (YYYYMMDD)
    #[arg(long)]
    pub after_date: Option<String>,

    /// Only download videos whose title contains this text
    #[arg(long)]
    pub keyword_filter: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Disable the live post-processing progress line
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Flags win over the file and environment layers.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.output_path {
            config.output_dir = path.clone();
        }
        if let Some(retries) = self.max_retries {
            config.downloader.max_retries = retries;
        }
        if let Some(crf) = self.crf_quality {
            config.post_process.crf = crf;
        }
        if let Some(date) = &self.after_date {
            config.filter.after_date = Some(date.clone());
        }
        if let Some(keyword) = &self.keyword_filter {
            config.filter.keyword = Some(keyword.clone());
        }
        if self.no_progress {
            config.post_process.show_progress = false;
        }
    }
}

use super::{types::Config, ConfigError};

/// Highest constant rate factor x264 accepts.
pub const MAX_CRF: u8 = 51;

/// Validate configuration
/// Currently validates:
/// - CRF is within 0..=51
/// - Retry delay is shorter than the strategy-switch delay
/// - Binary paths are not empty
/// - Render and poll intervals are not zero
/// - The after-date filter is a valid `YYYYMMDD` date
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let post = &config.post_process;
    let dl = &config.downloader;

    if post.crf > MAX_CRF {
        return Err(ConfigError::ValidationError(format!(
            "post_process.crf must be between 0 and {MAX_CRF}, got {}",
            post.crf
        )));
    }

    let both_zero = dl.retry_delay_ms == 0 && dl.strategy_delay_ms == 0;
    if dl.retry_delay_ms >= dl.strategy_delay_ms && !both_zero {
        return Err(ConfigError::ValidationError(format!(
            "downloader.retry_delay_ms ({}) must be less than downloader.strategy_delay_ms ({})",
            dl.retry_delay_ms, dl.strategy_delay_ms
        )));
    }

    for (name, path) in [
        ("downloader.binary", &dl.binary),
        ("post_process.ffmpeg_path", &post.ffmpeg_path),
        ("post_process.ffprobe_path", &post.ffprobe_path),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!("{name} cannot be empty")));
        }
    }

    if post.render_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "post_process.render_interval_ms cannot be 0".to_string(),
        ));
    }

    if post.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "post_process.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if post.default_fps <= 0.0 || !post.default_fps.is_finite() {
        return Err(ConfigError::ValidationError(
            "post_process.default_fps must be positive".to_string(),
        ));
    }

    if let Some(raw) = &config.filter.after_date {
        if config.filter.after_date().is_none() {
            return Err(ConfigError::ValidationError(format!(
                "filter.after_date must be YYYYMMDD, got {raw:?}"
            )));
        }
    }

    Ok(())
}

//! Progress tracking for ffmpeg's `-stats` output.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 30;
const UNKNOWN_ETA: &str = "??:??:??";

static FRAME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"frame=\s*(\d+)").ok());
static FPS_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"fps=\s*(\d+(?:\.\d+)?)").ok());
static SPEED_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"speed=\s*(\d+(?:\.\d+)?)x").ok());
static TIME_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"time=(\d{2}):(\d{2}):(\d{2}(?:\.\d+)?)").ok());

fn capture<'a>(re: &Lazy<Option<Regex>>, line: &'a str) -> Option<regex_lite::Captures<'a>> {
    re.as_ref()?.captures(line)
}

/// Turns encoder status lines into a renderable progress line.
///
/// Owned by whoever runs the job. Fields only move when a line carries them.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    title: String,
    total_frames: u64,
    current_frame: u64,
    fps: f64,
    speed: f64,
    media_time: Option<Duration>,
    started: Instant,
    last_render: Option<Instant>,
    render_interval: Duration,
}

impl ProgressTracker {
    /// `total_frames` of zero means unknown.
    pub fn new(title: impl Into<String>, total_frames: u64) -> Self {
        Self {
            title: title.into(),
            total_frames,
            current_frame: 0,
            fps: 0.0,
            speed: 0.0,
            media_time: None,
            started: Instant::now(),
            last_render: None,
            render_interval: Duration::from_millis(500),
        }
    }

    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Parses one status line.
    pub fn feed(&mut self, line: &str) {
        if let Some(frame) = capture(&FRAME_RE, line).and_then(|c| c[1].parse::<u64>().ok()) {
            self.current_frame = self.current_frame.max(frame);
        }
        if let Some(fps) = capture(&FPS_RE, line).and_then(|c| c[1].parse::<f64>().ok()) {
            self.fps = fps;
        }
        if let Some(speed) = capture(&SPEED_RE, line).and_then(|c| c[1].parse::<f64>().ok()) {
            self.speed = speed;
        }
        if let Some(caps) = capture(&TIME_RE, line) {
            let hours = caps[1].parse::<u64>().unwrap_or(0);
            let minutes = caps[2].parse::<u64>().unwrap_or(0);
            let seconds = caps[3].parse::<f64>().unwrap_or(0.0);
            self.media_time = Some(
                Duration::from_secs(hours * 3600 + minutes * 60)
                    + Duration::from_secs_f64(seconds),
            );
        }
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Media position reported by the last `time=` token.
    pub fn media_time(&self) -> Option<Duration> {
        self.media_time
    }

    /// Fraction done in `0.0..=1.0`, if the total is known.
    pub fn fraction(&self) -> Option<f64> {
        (self.total_frames > 0)
            .then(|| (self.current_frame as f64 / self.total_frames as f64).min(1.0))
    }

    /// Remaining frames over current fps, once both are known.
    pub fn eta(&self) -> Option<Duration> {
        if self.total_frames == 0 || self.fps <= 0.0 {
            return None;
        }
        let remaining = self.total_frames.saturating_sub(self.current_frame);
        Some(Duration::from_secs_f64(remaining as f64 / self.fps))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current progress line.
    pub fn render(&self) -> String {
        let Some(fraction) = self.fraction() else {
            return format!(
                "🔄 {} | Frame: {} | FPS: {:.0} | Speed: {:.1}x",
                self.title,
                group_thousands(self.current_frame),
                self.fps,
                self.speed
            );
        };

        let filled = ((BAR_WIDTH as f64) * fraction) as usize;
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
        let eta = self
            .eta()
            .map(format_hms)
            .unwrap_or_else(|| UNKNOWN_ETA.to_string());

        format!(
            "🔄 {} | {} | {:.1}% | Frame: {}/{} | FPS: {:.0} | Speed: {:.1}x | Time: {} | ETA: {}",
            self.title,
            bar,
            fraction * 100.0,
            group_thousands(self.current_frame),
            group_thousands(self.total_frames),
            self.fps,
            self.speed,
            format_hms(self.elapsed()),
            eta
        )
    }

    /// Returns a fresh render if the render interval has passed since the
    /// last one.
    pub fn poll_render(&mut self) -> Option<String> {
        self.poll_render_at(Instant::now())
    }

    pub fn poll_render_at(&mut self, now: Instant) -> Option<String> {
        if let Some(last) = self.last_render {
            if now.saturating_duration_since(last) < self.render_interval {
                return None;
            }
        }
        self.last_render = Some(now);
        Some(self.render())
    }

    /// Terminal summary line.
    pub fn finish(&self, success: bool) -> String {
        let elapsed = format_hms(self.elapsed());
        if success {
            format!("✅ {} | Completed in {}", self.title, elapsed)
        } else {
            format!("❌ {} | Failed after {}", self.title, elapsed)
        }
    }
}

/// Formats as `H:MM:SS`.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_updates_fields() {
        let mut tracker = ProgressTracker::new("clip", 1000);
        tracker.feed("frame=100 fps=25 speed=1.2x");
        tracker.feed("frame=250 fps=30 speed=1.5x time=00:00:10");

        assert_eq!(tracker.current_frame(), 250);
        assert_eq!(tracker.fps(), 30.0);
        assert_eq!(tracker.speed(), 1.5);
        assert_eq!(tracker.media_time(), Some(Duration::from_secs(10)));
        assert_eq!(tracker.eta(), Some(Duration::from_secs(25)));
    }

    #[test]
    fn test_missing_fields_are_unchanged() {
        let mut tracker = ProgressTracker::new("clip", 0);
        tracker.feed("frame=  120 fps= 24 q=28.0 size=1024kB time=00:00:05.00 speed=2.01x");
        tracker.feed("frame=  130");

        assert_eq!(tracker.current_frame(), 130);
        assert_eq!(tracker.fps(), 24.0);
        assert_eq!(tracker.speed(), 2.01);
        assert_eq!(tracker.media_time(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_frame_counter_never_goes_back() {
        let mut tracker = ProgressTracker::new("clip", 0);
        tracker.feed("frame=500");
        tracker.feed("frame=20");
        assert_eq!(tracker.current_frame(), 500);
    }

    #[test]
    fn test_eta_unknown_without_total_or_fps() {
        let mut tracker = ProgressTracker::new("clip", 0);
        tracker.feed("frame=10 fps=30");
        assert!(tracker.eta().is_none());

        let tracker = ProgressTracker::new("clip", 100);
        assert!(tracker.eta().is_none());
        assert!(tracker.render().contains("ETA: ??:??:??"));
    }

    #[test]
    fn test_eta_is_zero_past_total() {
        let mut tracker = ProgressTracker::new("clip", 100);
        tracker.feed("frame=150 fps=30");
        assert_eq!(tracker.eta(), Some(Duration::ZERO));
        assert_eq!(tracker.fraction(), Some(1.0));
    }

    #[test]
    fn test_render_with_total() {
        let mut tracker = ProgressTracker::new("clip", 2000);
        tracker.feed("frame=1000 fps=50 speed=2.0x");
        let line = tracker.render();

        assert!(line.contains("50.0%"));
        assert!(line.contains("Frame: 1,000/2,000"));
        assert!(line.contains("Speed: 2.0x"));
        assert!(line.contains("ETA: 0:00:20"));
        assert_eq!(line.matches('█').count(), 15);
        assert_eq!(line.matches('░').count(), 15);
    }

    #[test]
    fn test_render_without_total() {
        let mut tracker = ProgressTracker::new("clip", 0);
        tracker.feed("frame=1234567 fps=60 speed=1.0x");
        assert_eq!(
            tracker.render(),
            "🔄 clip | Frame: 1,234,567 | FPS: 60 | Speed: 1.0x"
        );
    }

    #[test]
    fn test_poll_render_is_throttled() {
        let mut tracker =
            ProgressTracker::new("clip", 0).with_render_interval(Duration::from_millis(500));
        let start = Instant::now();

        assert!(tracker.poll_render_at(start).is_some());
        assert!(tracker
            .poll_render_at(start + Duration::from_millis(100))
            .is_none());
        assert!(tracker
            .poll_render_at(start + Duration::from_millis(500))
            .is_some());
    }

    #[test]
    fn test_finish() {
        let tracker = ProgressTracker::new("clip", 0);
        assert!(tracker.finish(true).starts_with("✅ clip | Completed in 0:00:0"));
        assert!(tracker.finish(false).starts_with("❌ clip | Failed after 0:00:0"));
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_hms(Duration::ZERO), "0:00:00");
    }
}

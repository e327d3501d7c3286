//! Post-process queue and worker integration tests.
//!
//! These tests run the background worker against a mock media tool:
//! - In-place remux through a temp file
//! - Transcode replacing the intermediate container
//! - Failure and error outcomes in the outcome log
//! - Completion callbacks
//! - Draining many jobs, including jobs added while draining

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use vidfetch_core::{
    create_post_process_queue,
    ledger::AppendLog,
    postprocess::{
        estimate_total_frames, EmbeddedMetadata, JobMode, PostProcessJob, PostProcessQueue,
        StreamInfo,
    },
    testing::{fixtures, MockMediaTool},
    PostProcessConfig, PostProcessWorker, WorkerHandle,
};

/// Test helper holding a running worker and its collaborators.
struct TestHarness {
    queue: PostProcessQueue,
    handle: WorkerHandle,
    tool: MockMediaTool,
    outcome_log: AppendLog,
    dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        Self::with_tool(MockMediaTool::new()).await
    }

    async fn with_tool(tool: MockMediaTool) -> Self {
        let dir = TempDir::new().unwrap();
        let outcome_log = AppendLog::new(dir.path().join("transcode.log"));
        let config = PostProcessConfig::default()
            .with_show_progress(false)
            .with_poll_interval(Duration::from_millis(20));

        let (queue, receiver) = create_post_process_queue();
        let worker = PostProcessWorker::new(
            receiver,
            Arc::new(tool.clone()),
            config,
            outcome_log.clone(),
        );
        let handle = worker.spawn();

        Self {
            queue,
            handle,
            tool,
            outcome_log,
            dir,
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    async fn write(&self, name: &str) -> PathBuf {
        let path = self.path().join(name);
        tokio::fs::write(&path, b"raw").await.unwrap();
        path
    }

    async fn outcomes(&self) -> Vec<String> {
        self.outcome_log.read_lines().await.unwrap()
    }

    async fn finish(self) -> (vidfetch_core::WorkerStats, TempDir, Vec<String>) {
        tokio::time::timeout(Duration::from_secs(5), self.queue.drain())
            .await
            .expect("queue did not drain");
        let lines = self.outcome_log.read_lines().await.unwrap();
        let stats = self.handle.stop().await;
        (stats, self.dir, lines)
    }
}

type Calls = Arc<Mutex<Vec<(PathBuf, bool)>>>;

fn recorder() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

fn record_into(calls: &Calls) -> impl FnOnce(&Path, bool) + Send + Sync + 'static {
    let calls = calls.clone();
    move |path: &Path, success: bool| calls.lock().unwrap().push((path.to_path_buf(), success))
}

#[tokio::test]
async fn test_remux_in_place_replaces_source() {
    let harness = TestHarness::new().await;
    let source = harness.write("Clip [abcdefgh123].mp4").await;
    let thumb = harness.write("Clip [abcdefgh123].jpg").await;
    let calls = recorder();

    harness.queue.enqueue(
        PostProcessJob::new(&source, JobMode::Remux)
            .with_metadata(EmbeddedMetadata {
                title: Some("Clip".to_string()),
                uploader: Some("Chan".to_string()),
                ..Default::default()
            })
            .on_complete(record_into(&calls)),
    );

    let tool = harness.tool.clone();
    let (stats, dir, lines) = harness.finish().await;

    assert_eq!(stats.succeeded, 1);
    assert_eq!(tokio::fs::read(&source).await.unwrap(), b"encoded");
    assert!(!thumb.exists());
    assert!(!dir.path().join("Clip [abcdefgh123].tmp.mp4").exists());
    assert_eq!(
        lines,
        vec!["OK: Clip [abcdefgh123].mp4 -> Clip [abcdefgh123].mp4".to_string()]
    );

    let runs = tool.encode_runs().await;
    assert_eq!(runs.len(), 1);
    let args = &runs[0];
    assert!(args.iter().any(|a| a.ends_with("Clip [abcdefgh123].tmp.mp4")));
    assert!(args.iter().any(|a| a == "copy"));
    assert!(args.iter().any(|a| a == "title=Clip"));
    assert!(args.iter().any(|a| a == "attached_pic"));

    assert_eq!(*calls.lock().unwrap(), vec![(source, true)]);
}

#[tokio::test]
async fn test_transcode_removes_intermediate() {
    let harness = TestHarness::new().await;
    let source = harness.write("Talk [zyxwvuts987].webm").await;
    let calls = recorder();

    harness.queue.enqueue(
        PostProcessJob::new(&source, JobMode::Transcode { crf: 28 }).on_complete(record_into(&calls)),
    );

    let tool = harness.tool.clone();
    let (stats, dir, lines) = harness.finish().await;
    let output = dir.path().join("Talk [zyxwvuts987].mp4");

    assert_eq!(stats.succeeded, 1);
    assert!(!source.exists());
    assert!(output.exists());
    assert_eq!(
        lines,
        vec!["OK: Talk [zyxwvuts987].webm -> Talk [zyxwvuts987].mp4".to_string()]
    );

    let args = &tool.encode_runs().await[0];
    let crf = args.iter().position(|a| a == "-crf").unwrap();
    assert_eq!(args[crf + 1], "28");

    assert_eq!(*calls.lock().unwrap(), vec![(output, true)]);
}

#[tokio::test]
async fn test_failed_encode_keeps_source() {
    let harness = TestHarness::new().await;
    harness.tool.set_exit_success(false).await;
    let source = harness.write("Bad [badbadbad01].webm").await;
    let calls = recorder();

    harness.queue.enqueue(
        PostProcessJob::new(&source, JobMode::Transcode { crf: 23 })
            .on_complete(record_into(&calls)),
    );

    let (stats, _dir, lines) = harness.finish().await;

    assert_eq!(stats.failed, 1);
    assert!(source.exists());
    assert_eq!(
        lines,
        vec!["FAIL: Bad [badbadbad01].webm -> Bad [badbadbad01].mp4".to_string()]
    );
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(!calls.lock().unwrap()[0].1);
}

#[tokio::test]
async fn test_missing_output_is_failure() {
    let tool = MockMediaTool::new();
    tool.set_create_output(false).await;
    let harness = TestHarness::with_tool(tool).await;
    let source = harness.write("Gone [gonegone001].mkv").await;

    harness
        .queue
        .enqueue(PostProcessJob::new(&source, JobMode::Transcode { crf: 23 }));

    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.failed, 1);
    assert!(source.exists());
    assert!(lines[0].starts_with("FAIL: "));
}

#[tokio::test]
async fn test_failed_in_place_remux_cleans_temp() {
    let tool = MockMediaTool::new();
    tool.set_exit_success(false).await;
    let harness = TestHarness::with_tool(tool).await;
    let source = harness.write("Keep [keepkeep001].mp4").await;

    harness.queue.enqueue(PostProcessJob::new(&source, JobMode::Remux));

    let (stats, dir, _lines) = harness.finish().await;
    assert_eq!(stats.failed, 1);
    assert_eq!(tokio::fs::read(&source).await.unwrap(), b"raw");
    assert!(!dir.path().join("Keep [keepkeep001].tmp.mp4").exists());
}

#[tokio::test]
async fn test_encode_error_logged_as_error() {
    let harness = TestHarness::new().await;
    harness
        .tool
        .set_encode_error(Some("encoder exploded".to_string()))
        .await;
    let source = harness.write("Err [errerrerr01].webm").await;
    let calls = recorder();

    harness.queue.enqueue(
        PostProcessJob::new(&source, JobMode::Transcode { crf: 23 })
            .on_complete(record_into(&calls)),
    );

    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.errored, 1);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with(&format!("ERROR: {} | ", source.display())));
    assert!(lines[0].contains("encoder exploded"));
    assert_eq!(*calls.lock().unwrap(), vec![(source, false)]);
}

#[tokio::test]
async fn test_panicking_encode_does_not_kill_worker() {
    let harness = TestHarness::new().await;
    harness.tool.set_panic_on_encode(true).await;
    let first = harness.write("One [oneoneone01].webm").await;

    harness
        .queue
        .enqueue(PostProcessJob::new(&first, JobMode::Transcode { crf: 23 }));
    tokio::time::timeout(Duration::from_secs(5), harness.queue.drain())
        .await
        .unwrap();

    harness.tool.set_panic_on_encode(false).await;
    let second = harness.write("Two [twotwotwo02].webm").await;
    harness
        .queue
        .enqueue(PostProcessJob::new(&second, JobMode::Transcode { crf: 23 }));

    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.errored, 1);
    assert_eq!(stats.succeeded, 1);
    assert!(lines[0].starts_with("ERROR: "));
    assert!(lines[0].contains("mock encoder crashed"));
    assert!(lines[1].starts_with("OK: "));
}

#[tokio::test]
async fn test_stream_info_failure_still_encodes() {
    let harness = TestHarness::new().await;
    harness.tool.set_stream_info(None).await;
    let source = harness.write("Unknown [unknownunk1].webm").await;

    let config = PostProcessConfig::default();
    assert_eq!(
        estimate_total_frames(&harness.tool, &source, config.default_fps).await,
        0
    );

    harness
        .queue
        .enqueue(PostProcessJob::new(&source, JobMode::Transcode { crf: 23 }));

    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.succeeded, 1);
    assert!(lines[0].starts_with("OK: "));
}

#[tokio::test]
async fn test_panicking_callback_is_contained() {
    let harness = TestHarness::new().await;
    let first = harness.write("A [aaaaaaaaaa1].webm").await;
    let second = harness.write("B [bbbbbbbbbb2].webm").await;

    harness.queue.enqueue(
        PostProcessJob::new(&first, JobMode::Transcode { crf: 23 })
            .on_complete(|_, _| panic!("callback blew up")),
    );
    harness
        .queue
        .enqueue(PostProcessJob::new(&second, JobMode::Transcode { crf: 23 }));

    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.succeeded, 2);
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_drain_waits_for_every_job() {
    let harness = TestHarness::new().await;
    harness.tool.set_encode_delay(Duration::from_millis(5)).await;

    let mut sources = Vec::new();
    for i in 0..12 {
        let source = harness.write(&format!("Item {i} [item{i:07}].webm")).await;
        harness
            .queue
            .enqueue(PostProcessJob::new(&source, JobMode::Transcode { crf: 23 }));
        sources.push(source);
    }
    assert!(harness.queue.pending() > 0);

    let queue = harness.queue.clone();
    let (stats, dir, lines) = harness.finish().await;

    assert_eq!(queue.pending(), 0);
    assert_eq!(stats.succeeded, 12);
    assert_eq!(lines.len(), 12);
    for (i, source) in sources.iter().enumerate() {
        assert!(!source.exists());
        assert!(dir.path().join(format!("Item {i} [item{i:07}].mp4")).exists());
    }
    // FIFO order
    assert!(lines[0].contains("Item 0 "));
    assert!(lines[11].contains("Item 11 "));
}

#[tokio::test]
async fn test_drain_with_nothing_queued_returns() {
    let harness = TestHarness::new().await;
    assert!(harness.outcomes().await.is_empty());
    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.processed(), 0);
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_output_dir_redirects_final_file() {
    let harness = TestHarness::new().await;
    let target = TempDir::new().unwrap();
    let source = harness.write("Move [movemove001].webm").await;

    harness.queue.enqueue(
        PostProcessJob::new(&source, JobMode::Transcode { crf: 23 })
            .with_output_dir(target.path()),
    );

    let (stats, _dir, _lines) = harness.finish().await;
    assert_eq!(stats.succeeded, 1);
    assert!(target.path().join("Move [movemove001].mp4").exists());
}

#[tokio::test]
async fn test_frame_estimate_from_duration() {
    let tool = MockMediaTool::new();
    tool.set_stream_info(Some(StreamInfo {
        total_frames: None,
        fps: Some(25.0),
        duration_secs: Some(12.0),
    }))
    .await;
    let harness = TestHarness::with_tool(tool).await;
    let source = fixtures::write_media_file(harness.path(), "Est", "estestest01", "webm").await;
    let default_fps = PostProcessConfig::default().default_fps;

    assert_eq!(
        estimate_total_frames(&harness.tool, &source, default_fps).await,
        300
    );

    // Without a frame rate the configured default applies.
    harness
        .tool
        .set_stream_info(Some(StreamInfo {
            total_frames: None,
            fps: None,
            duration_secs: Some(12.0),
        }))
        .await;
    assert_eq!(
        estimate_total_frames(&harness.tool, &source, default_fps).await,
        (12.0 * default_fps) as u64
    );

    harness
        .queue
        .enqueue(PostProcessJob::new(&source, JobMode::Transcode { crf: 23 }));

    let (stats, _dir, _lines) = harness.finish().await;
    assert_eq!(stats.succeeded, 1);
}

#[tokio::test]
async fn test_drain_waits_for_jobs_enqueued_while_draining() {
    let harness = TestHarness::new().await;
    harness.tool.set_encode_delay(Duration::from_millis(100)).await;

    let first = harness.write("Early [earlyearly1].webm").await;
    harness
        .queue
        .enqueue(PostProcessJob::new(&first, JobMode::Transcode { crf: 23 }));

    let late = vec![
        harness.write("Late [latelate001].webm").await,
        harness.write("Late [latelate002].webm").await,
    ];
    let producer = harness.queue.clone();
    let enqueue_late = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        for source in late {
            producer.enqueue(PostProcessJob::new(&source, JobMode::Transcode { crf: 23 }));
        }
    });

    tokio::time::timeout(Duration::from_secs(5), harness.queue.drain())
        .await
        .expect("queue did not drain");
    enqueue_late.await.unwrap();

    assert_eq!(harness.tool.encode_count().await, 3);
    assert_eq!(harness.queue.pending(), 0);

    let (stats, _dir, lines) = harness.finish().await;
    assert_eq!(stats.succeeded, 3);
    assert_eq!(lines.len(), 3);
}

#[tokio::test]
async fn test_remux_uppercase_extension_rewrites_in_place() {
    let harness = TestHarness::new().await;
    let source = harness.write("Loud [loudloud001].MP4").await;
    let calls = recorder();

    harness
        .queue
        .enqueue(PostProcessJob::new(&source, JobMode::Remux).on_complete(record_into(&calls)));

    let tool = harness.tool.clone();
    let (stats, dir, lines) = harness.finish().await;

    assert_eq!(stats.succeeded, 1);
    assert_eq!(tokio::fs::read(&source).await.unwrap(), b"encoded");
    assert!(!dir.path().join("Loud [loudloud001].tmp.mp4").exists());
    assert_eq!(
        lines,
        vec!["OK: Loud [loudloud001].MP4 -> Loud [loudloud001].MP4".to_string()]
    );

    let args = &tool.encode_runs().await[0];
    assert!(args.iter().any(|a| a.ends_with("Loud [loudloud001].tmp.mp4")));
    assert_eq!(*calls.lock().unwrap(), vec![(source, true)]);
}

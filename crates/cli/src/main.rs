mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidfetch_core::{
    create_post_process_queue, filter_items, is_single_video, load_config, validate_config,
    Acquirer, AppendLog, Catalog, Config, DedupLedger, Driver, FfmpegTool, MediaTool,
    MetadataLookup, PostProcessQueue, PostProcessWorker, ReconcileScanner, RunSummary, YtDlp,
    YtDlpCatalog,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let mut config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    cli.apply_overrides(&mut config);
    validate_config(&config).context("Configuration validation failed")?;

    info!("Output directory: {}", config.output_dir.display());
    info!(
        max_retries = config.downloader.max_retries,
        crf = config.post_process.crf,
        "Configuration loaded"
    );

    // Output directory and log files
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
    let outcome_log = AppendLog::new(config.outcome_log_path());
    let error_log = AppendLog::new(config.error_log_path());
    for log in [&outcome_log, &error_log, &AppendLog::new(config.ledger_path())] {
        log.touch()
            .await
            .with_context(|| format!("Failed to create {}", log.path().display()))?;
    }
    let ledger = DedupLedger::open(config.ledger_path())
        .await
        .context("Failed to load download ledger")?;
    info!(
        entries = ledger.len(),
        path = %ledger.path().display(),
        "Loaded download ledger"
    );

    // Post-processing worker
    let media_tool: Arc<dyn MediaTool> = Arc::new(FfmpegTool::new(config.post_process.clone()));
    let (queue, receiver) = create_post_process_queue();
    let worker = PostProcessWorker::new(
        receiver,
        Arc::clone(&media_tool),
        config.post_process.clone(),
        outcome_log,
    )
    .spawn();

    let catalog = Arc::new(YtDlpCatalog::new(config.downloader.binary.clone()));
    let acquirer = Acquirer::new(Arc::new(YtDlp::new(config.downloader.clone())), &config.downloader);
    let driver = Driver::new(
        acquirer,
        ledger,
        error_log,
        queue.clone(),
        config.output_dir.clone(),
    )
    .with_max_retries(config.downloader.max_retries)
    .with_crf(config.post_process.crf);

    let pipeline = run_pipeline(
        &config,
        &cli.channel_url,
        media_tool,
        catalog,
        driver,
        &queue,
    );

    let summary = tokio::select! {
        summary = pipeline => Some(summary),
        _ = shutdown_signal() => {
            warn!("Interrupted, stopping after the current post-processing job");
            None
        }
    };

    let stats = worker.stop().await;

    match summary {
        Some(summary) => info!(
            successes = summary.successes,
            failures = summary.failures,
            skipped = summary.skipped,
            "Download complete! Successful: {}, Failed: {}",
            summary.successes,
            summary.failures
        ),
        None => info!(pending = queue.pending(), "Run interrupted"),
    }
    info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        errored = stats.errored,
        "Post-processing finished"
    );
    info!(
        "See {} and {} for details",
        config.error_log_path().display(),
        config.outcome_log_path().display()
    );

    Ok(())
}

/// Reconcile, list, filter, acquire, then wait for post-processing.
async fn run_pipeline(
    config: &Config,
    url: &str,
    media_tool: Arc<dyn MediaTool>,
    catalog: Arc<YtDlpCatalog>,
    mut driver: Driver,
    queue: &PostProcessQueue,
) -> RunSummary {
    let output_dir = config.output_dir.as_path();
    let lookup: Arc<dyn MetadataLookup> = catalog.clone();
    reconcile(output_dir, media_tool, lookup, queue, config.post_process.crf).await;

    info!("Fetching video list from {url}");
    let items = match catalog.list(url).await {
        Ok(items) => items,
        Err(e) => {
            error!(error = %e, "Failed to list {url}");
            Vec::new()
        }
    };

    let items = if is_single_video(url, &items) {
        info!("Single video detected, skipping filters");
        items
    } else {
        let total = items.len();
        let items = filter_items(items, config.filter.after_date(), config.filter.keyword());
        info!(total, kept = items.len(), "Filtered listing");
        items
    };

    let summary = driver.run(&items).await;

    if queue.pending() > 0 {
        info!(pending = queue.pending(), "Waiting for post-processing to finish");
    }
    queue.drain().await;
    summary
}

async fn reconcile(
    output_dir: &Path,
    media_tool: Arc<dyn MediaTool>,
    lookup: Arc<dyn MetadataLookup>,
    queue: &PostProcessQueue,
    crf: u8,
) {
    let scanner = ReconcileScanner::new(media_tool, lookup);
    match scanner.scan(output_dir, queue, crf).await {
        Ok(report) if report.queued > 0 => {
            info!(queued = report.queued, "Resuming unfinished post-processing");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Reconciliation scan failed"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

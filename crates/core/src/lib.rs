pub mod acquisition;
pub mod catalog;
pub mod config;
pub mod ledger;
pub mod postprocess;
pub mod reconcile;
pub mod runner;
pub mod testing;

pub use acquisition::{AcquireError, Acquirer, AcquisitionTool, DownloaderConfig, MediaItem, YtDlp};
pub use catalog::{
    filter_items, is_single_video, Catalog, CatalogError, MetadataLookup, YtDlpCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, FilterConfig,
};
pub use ledger::{AppendLog, DedupLedger, LedgerError};
pub use postprocess::{
    create_post_process_queue, FfmpegTool, JobMode, MediaTool, PostProcessConfig,
    PostProcessError, PostProcessJob, PostProcessQueue, PostProcessWorker, WorkerHandle,
    WorkerStats,
};
pub use reconcile::{ReconcileScanner, ScanReport};
pub use runner::{Driver, RunSummary};

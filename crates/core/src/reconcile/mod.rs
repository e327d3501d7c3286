//! Startup reconciliation of the output directory.
//!
//! Runs once before any new acquisition. It deletes partial downloads,
//! queues raw intermediate containers for transcoding, and queues finalized
//! MP4s that still have a thumbnail next to them for a metadata remux.
//! Files that already carry title and artist tags are left alone, so running
//! the scan twice queues nothing new.

mod scanner;

pub use scanner::{ReconcileScanner, ScanReport, INTERMEDIATE_EXTENSIONS, LEFTOVER_SUFFIXES};

//! Remote catalog boundary.
//!
//! Listing a channel and looking up one identifier both go through yt-dlp's
//! `-J` JSON dump. Only `id`, `title`, `uploader`/`channel`, `upload_date`
//! and `webpage_url`/`url` are read.

mod error;
mod filter;
mod traits;
mod ytdlp;

pub use error::CatalogError;
pub use filter::{filter_items, is_single_video};
pub use traits::{Catalog, MetadataLookup};
pub use ytdlp::{parse_listing, YtDlpCatalog};

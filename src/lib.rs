//! Bulk exporter for the publication.pravo.gov.ru document registry.
//!
//! Pages through the registry's catalogue API for a fixed query and downloads
//! the PDF behind every record into a local directory, skipping files that
//! are already there.

use std::time::Duration;

mod download;
mod error;
mod fetch;
mod filter;
mod macros;
mod parse;
pub mod process;
mod request;

pub use download::{derive_filename, download_all, BatchReport, DownloadOutcome};
pub use error::{Error, Result};
pub use fetch::{fetch_all, Catalogue, PageFailurePolicy};
pub use filter::{PageParam, QueryFilter, RunMode, RunProfile, SortDirection};
pub use parse::{PageResult, RecordDescriptor, SignatoryAuthority};
pub use request::{ApiClient, Endpoints};

// Re-exported for `info_time!`.
#[doc(hidden)]
pub use chrono;
#[doc(hidden)]
pub use tracing;

const CATALOGUE_URL: &str = "http://publication.pravo.gov.ru/api/Documents";
const DOWNLOAD_URL: &str = "http://publication.pravo.gov.ru/file/pdf";
/// Directory the download profile writes into, relative to the working dir.
pub const DOWNLOAD_DIR: &str = "downloaded_documents";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Size of the buffered writes a download body goes through.
const DOWNLOAD_CHUNK_SIZE: usize = 8192;
/// Pause after every file download attempt.
pub const DOWNLOAD_DELAY: Duration = Duration::from_secs(1);

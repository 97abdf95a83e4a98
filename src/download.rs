use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header;
use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
    time::sleep,
};
use tracing::{info, warn};

use crate::{info_time, ApiClient, Error, RecordDescriptor, Result, DOWNLOAD_CHUNK_SIZE};

/// Longest sanitized title kept in a filename, in characters.
const MAX_TITLE_CHARS: usize = 50;
/// Length of the `YYYY-MM-DD` prefix of a document date.
const DATE_PREFIX_CHARS: usize = 10;
const PART_SUFFIX: &str = ".part";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The target file was already on disk. Holds its size.
    Skipped(u64),
    /// Holds the number of bytes written.
    Downloaded(u64),
    Failed(String),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DownloadOutcome::Failed(_))
    }
}

/// Tallies of one `download_all` run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<RecordDescriptor>,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    /// Downloaded and already present files both count.
    pub fn successful(&self) -> usize {
        self.downloaded + self.skipped
    }

    fn tally(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Downloaded(_) => self.downloaded += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Builds `{number}_{title}_{date}.pdf` for a record, with spaces replaced
/// by underscores.
///
/// The name depends on the record only, which is what lets a later run
/// recognise files it already has.
pub fn derive_filename(record: &RecordDescriptor) -> String {
    let number = record.number.as_deref().unwrap_or("number");
    let title = sanitize_title(record.title.as_deref().unwrap_or("document"));
    let date: String = record
        .document_date
        .as_deref()
        .unwrap_or("documentDate")
        .chars()
        .take(DATE_PREFIX_CHARS)
        .collect();

    format!("{number}_{title}_{date}.pdf").replace(' ', "_")
}

/// Keeps alphanumerics, spaces, `-` and `_`, trims, and cuts the result to
/// `MAX_TITLE_CHARS` characters.
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Downloads the file behind every record into `dest_dir`, one at a time.
///
/// Network failures are counted per record and never stop the batch. Only
/// filesystem errors are returned.
pub async fn download_all(
    client: &ApiClient,
    records: Vec<RecordDescriptor>,
    dest_dir: &Path,
    delay: Duration,
) -> Result<BatchReport> {
    let start_time = Local::now();
    fs::create_dir_all(dest_dir).await?;

    let total = records.len();
    info!("Starting download of {total} documents...");

    let mut report = BatchReport::default();
    for (i, record) in records.iter().enumerate() {
        let position = i + 1;
        let outcome = download_record(client, record, dest_dir, position, total, delay).await?;
        report.tally(&outcome);
    }
    report.records = records;

    info_time!(
        start_time,
        "Downloaded: {}, already present: {}, failed: {}",
        report.downloaded,
        report.skipped,
        report.failed
    );
    Ok(report)
}

async fn download_record(
    client: &ApiClient,
    record: &RecordDescriptor,
    dest_dir: &Path,
    position: usize,
    total: usize,
    delay: Duration,
) -> Result<DownloadOutcome> {
    let Some(eo_number) = record.eo_number.as_deref().filter(|s| !s.is_empty()) else {
        warn!("[{position}/{total}] No eoNumber, skipping");
        return Ok(DownloadOutcome::Failed("missing identifier".to_string()));
    };

    let filename = derive_filename(record);
    let path = dest_dir.join(&filename);
    if !stays_in_dir(&filename, &path, dest_dir) {
        warn!("[{position}/{total}] Unsafe filename for {eo_number}: {filename:?}");
        return Ok(DownloadOutcome::Failed("unsafe filename".to_string()));
    }

    match fs::metadata(&path).await {
        Ok(meta) => {
            info!(
                "[{position}/{total}] Already downloaded: {filename} ({} bytes)",
                meta.len()
            );
            return Ok(DownloadOutcome::Skipped(meta.len()));
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    info!("[{position}/{total}] Downloading: {eo_number}");
    info!("Title: {}", record.title.as_deref().unwrap_or("N/A"));

    let outcome = match fetch_to_file(client, eo_number, &path, &filename).await {
        Ok(size) => {
            info!("Saved: {filename} ({size} bytes)");
            DownloadOutcome::Downloaded(size)
        }
        Err(Error::Network(e)) => {
            warn!("Failed to download {eo_number}: {e}");
            DownloadOutcome::Failed(e.to_string())
        }
        Err(e) => return Err(e),
    };

    sleep(delay).await;
    Ok(outcome)
}

/// Streams the file into `<path>.part` and renames it to `path` once the
/// body is complete. The part file is removed when anything fails.
async fn fetch_to_file(
    client: &ApiClient,
    eo_number: &str,
    path: &Path,
    filename: &str,
) -> Result<u64> {
    let part_path = part_path(path);
    let res = stream_to_file(client, eo_number, &part_path, filename).await;

    match res {
        Ok(written) => {
            fs::rename(&part_path, path).await?;
            Ok(written)
        }
        Err(e) => {
            // The part file may never have been created.
            let _ = fs::remove_file(&part_path).await;
            Err(e)
        }
    }
}

async fn stream_to_file(
    client: &ApiClient,
    eo_number: &str,
    part_path: &Path,
    filename: &str,
) -> Result<u64> {
    let mut res = client.request_file(eo_number).await?;

    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.to_lowercase().contains("pdf") {
        warn!("File may not be a PDF (Content-Type: {content_type})");
    }

    let progress = progress_bar(filename, res.content_length().unwrap_or(0));

    let mut file = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, File::create(part_path).await?);
    let mut written = 0u64;
    while let Some(chunk) = res.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress.set_position(written);
    }
    file.flush().await?;
    file.into_inner().sync_all().await?;
    progress.finish_and_clear();

    Ok(written)
}

/// Byte progress for one file. Hidden when the server didn't announce a
/// length.
fn progress_bar(filename: &str, total: u64) -> ProgressBar {
    if total == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::with_template(
        "{msg} {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec})",
    ) {
        pb.set_style(style.progress_chars("█  "));
    }
    pb.set_message(filename.to_string());
    pb
}

/// Record fields end up in the filename verbatim, so a name that would leave
/// `dest_dir` (separators, absolute paths, NUL) is refused.
fn stays_in_dir(filename: &str, path: &Path, dest_dir: &Path) -> bool {
    !filename.contains(['/', '\\', '\0'])
        && path.parent() == Some(dest_dir)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

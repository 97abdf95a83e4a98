use std::path::Path;

use chrono::Local;
use tracing::info;

use crate::{
    download_all, fetch_all, info_time, ApiClient, BatchReport, Endpoints, PageFailurePolicy,
    RecordDescriptor, Result, RunMode, RunProfile, DOWNLOAD_DIR,
};

/// Number of records previewed before a download run starts.
const PREVIEW_LEN: usize = 3;
const RULE_WIDTH: usize = 60;

/// Runs one of the fixed profiles against the live registry.
pub async fn process_catalogue(mode: RunMode) -> Result<()> {
    let profile = RunProfile::for_mode(mode);
    let client = ApiClient::new(Endpoints::default(), profile.user_agent)?;

    match mode {
        RunMode::Download => {
            download_catalogue(&client, &profile, Path::new(DOWNLOAD_DIR)).await?;
        }
        RunMode::ListOnly => {
            list_catalogue(&client, &profile).await?;
        }
    }
    Ok(())
}

/// Fetches the catalogue and downloads every record into `dest_dir`.
/// Returns `None` when the catalogue is empty.
pub async fn download_catalogue(
    client: &ApiClient,
    profile: &RunProfile,
    dest_dir: &Path,
) -> Result<Option<BatchReport>> {
    let start_time = Local::now();
    log_query(profile);

    let catalogue = fetch_all(client, profile, PageFailurePolicy::default()).await?;
    if catalogue.records.is_empty() {
        info!("No documents match the query.");
        return Ok(None);
    }

    info!("First documents:");
    for (i, record) in catalogue.records.iter().take(PREVIEW_LEN).enumerate() {
        log_record(i + 1, record);
    }

    let report = download_all(client, catalogue.records, dest_dir, profile.download_delay).await?;

    let rule = "=".repeat(RULE_WIDTH);
    info!("{rule}");
    info!("DONE!");
    info!("Total documents: {}", report.records.len());
    info!("Successfully downloaded: {}", report.successful());
    info!("Failed to download: {}", report.failed);
    info!("Documents saved to '{}'", dest_dir.display());
    info!("{rule}");
    info_time!(start_time, "Full download run finished");

    Ok(Some(report))
}

/// Fetches the catalogue and logs every record with its download link.
pub async fn list_catalogue(
    client: &ApiClient,
    profile: &RunProfile,
) -> Result<Vec<RecordDescriptor>> {
    let start_time = Local::now();
    let catalogue = fetch_all(client, profile, PageFailurePolicy::default()).await?;

    info!("{}", "=".repeat(RULE_WIDTH));
    for (i, record) in catalogue.records.iter().enumerate() {
        log_record(i + 1, record);
        info!(
            "  Publish date: {}",
            record.publish_date.as_deref().unwrap_or("N/A")
        );
        info!(
            "  Link: {}",
            client
                .endpoints()
                .file_link(record.eo_number.as_deref().unwrap_or_default())
        );
    }
    info_time!(start_time, "Listed {} documents", catalogue.records.len());

    Ok(catalogue.records)
}

fn log_query(profile: &RunProfile) {
    info!("Query parameters:");
    for (key, value) in profile.filter.query_pairs(1) {
        info!("  {key}: {value}");
    }
}

fn log_record(position: usize, record: &RecordDescriptor) {
    let or_na = |field: &Option<String>| field.as_deref().unwrap_or("N/A").to_string();

    info!("Document {position}:");
    info!("  eoNumber: {}", or_na(&record.eo_number));
    info!("  Title: {}", or_na(&record.title));
    info!("  Number: {}", or_na(&record.number));
    info!("  Document date: {}", or_na(&record.document_date));
    if let Some(name) = record.authority_name() {
        info!("  Authority: {name}");
    }
}

use chrono::Local;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{info_time, ApiClient, RecordDescriptor, Result, RunProfile};

/// What to do when a page after the discovery request fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageFailurePolicy {
    /// Stop the whole fetch and drop everything collected so far.
    #[default]
    Abort,
    /// Log the page, remember it in [`Catalogue::skipped_pages`] and go on.
    Skip,
}

/// Every record the catalogue returned for a filter, in page order.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    /// `totalCount` announced by the first page.
    pub total_count: u64,
    pub pages_total_count: u32,
    pub records: Vec<RecordDescriptor>,
    /// Pages dropped under [`PageFailurePolicy::Skip`].
    pub skipped_pages: Vec<u32>,
}

/// Discovers the page count with a first request, then walks every page from
/// 1 to that count, concatenating the items.
///
/// Any failure of the discovery request is returned as is. Failures on the
/// walk are returned or skipped depending on `policy`.
pub async fn fetch_all(
    client: &ApiClient,
    profile: &RunProfile,
    policy: PageFailurePolicy,
) -> Result<Catalogue> {
    let start_time = Local::now();
    let filter = &profile.filter;

    info!("Requesting the number of pages...");
    let first_page = client.request_page(filter, 1).await?;
    let pages_total_count = first_page.pages_total_count();
    info!(
        total_count = first_page.total_count(),
        page_size = first_page.page_size(),
        pages_total_count,
        "Catalogue size"
    );

    let mut catalogue = Catalogue {
        total_count: first_page.total_count(),
        pages_total_count,
        ..Default::default()
    };

    for page in 1..=pages_total_count {
        info!("Processing page {page}/{pages_total_count}...");

        match client.request_page(filter, page).await {
            Ok(result) => match result.items {
                Some(items) => {
                    info!("Page {page}: added {} documents", items.len());
                    catalogue.records.extend(items);
                }
                None => warn!("Page {page}: no 'items' key in the response"),
            },
            Err(e) if policy == PageFailurePolicy::Skip => {
                warn!("Page {page}: skipped, {e}");
                catalogue.skipped_pages.push(page);
            }
            Err(e) => return Err(e),
        }

        sleep(profile.page_delay).await;
    }

    info_time!(
        start_time,
        "Collected {} documents from {} pages",
        catalogue.records.len(),
        pages_total_count
    );
    Ok(catalogue)
}

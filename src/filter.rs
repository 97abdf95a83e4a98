use std::time::Duration;

use chrono::NaiveDate;

const DOCUMENT_TYPE_ID: &str = "7ff5b3b5-3757-44f1-bb76-3766cabe3593";
const SIGNATORY_AUTHORITY_ID: &str = "8005d8c9-4b6d-48d3-861a-2a37e69fccb3";
/// The registry's "default" search mode for every `*SearchType` flag.
const DEFAULT_SEARCH_TYPE: &str = "0";
const SORT_FIELD: u8 = 6;
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Which of the two fixed run profiles the entry point executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Fetch the catalogue and download every PDF.
    Download,
    /// Fetch the catalogue and print the records without downloading.
    ListOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn as_param(self) -> &'static str {
        match self {
            SortDirection::Ascending => "0",
            SortDirection::Descending => "1",
        }
    }
}

/// How a request names the page it wants.
///
/// The two run profiles address pages differently and both shapes are kept
/// as they are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageParam {
    /// `index=<n>`
    Index,
    /// `index=1` stays fixed and `Page=<n>` selects the page.
    Page,
}

/// Catalogue query. Never mutated during a run, the page is passed to
/// [`QueryFilter::query_pairs`] per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub document_type: String,
    pub signatory_authority: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub sorted_by: u8,
    pub sort_direction: SortDirection,
    pub page_size: u32,
    pub page_param: PageParam,
}

impl QueryFilter {
    /// Query string for the given 1-based page.
    pub fn query_pairs(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("DocumentTypes", self.document_type.clone()),
            ("SignatoryAuthorityId", self.signatory_authority.clone()),
            ("PublishDateSearchType", DEFAULT_SEARCH_TYPE.to_string()),
            ("NumberSearchType", DEFAULT_SEARCH_TYPE.to_string()),
            ("DocumentDateSearchType", DEFAULT_SEARCH_TYPE.to_string()),
            ("DocumentDateFrom", fmt_date(self.date_from)),
            ("DocumentDateTo", fmt_date(self.date_to)),
            ("JdRegSearchType", DEFAULT_SEARCH_TYPE.to_string()),
            ("SortedBy", self.sorted_by.to_string()),
            ("SortDestination", self.sort_direction.as_param().to_string()),
            ("PageSize", self.page_size.to_string()),
        ];
        match self.page_param {
            PageParam::Index => pairs.push(("index", page.to_string())),
            PageParam::Page => {
                pairs.push(("index", "1".to_string()));
                pairs.push(("Page", page.to_string()));
            }
        }
        pairs
    }
}

#[inline]
fn fmt_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Everything a run needs besides the endpoints.
#[derive(Debug, Clone)]
pub struct RunProfile {
    pub mode: RunMode,
    pub filter: QueryFilter,
    pub user_agent: &'static str,
    /// Pause after every page request while iterating the catalogue.
    pub page_delay: Duration,
    /// Pause after every file download attempt.
    pub download_delay: Duration,
}

impl RunProfile {
    pub fn for_mode(mode: RunMode) -> Self {
        match mode {
            RunMode::Download => Self::full_download(),
            RunMode::ListOnly => Self::listing_only(),
        }
    }

    /// Second half of October 2025, 30 records per page.
    pub fn full_download() -> Self {
        Self {
            mode: RunMode::Download,
            filter: QueryFilter {
                document_type: DOCUMENT_TYPE_ID.to_string(),
                signatory_authority: SIGNATORY_AUTHORITY_ID.to_string(),
                date_from: ymd(2025, 10, 16),
                date_to: ymd(2025, 10, 31),
                sorted_by: SORT_FIELD,
                sort_direction: SortDirection::Ascending,
                page_size: 30,
                page_param: PageParam::Index,
            },
            user_agent: BROWSER_USER_AGENT,
            page_delay: Duration::from_millis(500),
            download_delay: crate::DOWNLOAD_DELAY,
        }
    }

    /// January to mid-September 2025, 200 records per page.
    pub fn listing_only() -> Self {
        Self {
            mode: RunMode::ListOnly,
            filter: QueryFilter {
                document_type: DOCUMENT_TYPE_ID.to_string(),
                signatory_authority: SIGNATORY_AUTHORITY_ID.to_string(),
                date_from: ymd(2025, 1, 1),
                date_to: ymd(2025, 9, 12),
                sorted_by: SORT_FIELD,
                sort_direction: SortDirection::Descending,
                page_size: 200,
                page_param: PageParam::Page,
            },
            user_agent: "Mozilla/5.0",
            page_delay: Duration::from_millis(300),
            download_delay: crate::DOWNLOAD_DELAY,
        }
    }

    /// Drops both pauses. Used against local servers.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.download_delay = Duration::ZERO;
        self
    }
}

// Profile dates are compile-time literals.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Vec<&'a str> {
        pairs
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn download_profile_pages_by_index() {
        let filter = RunProfile::full_download().filter;
        let pairs = filter.query_pairs(3);

        assert_eq!(value(&pairs, "index"), vec!["3"]);
        assert!(value(&pairs, "Page").is_empty());
        assert_eq!(value(&pairs, "PageSize"), vec!["30"]);
        assert_eq!(value(&pairs, "DocumentDateFrom"), vec!["16.10.2025"]);
        assert_eq!(value(&pairs, "DocumentDateTo"), vec!["31.10.2025"]);
        assert_eq!(value(&pairs, "SortDestination"), vec!["0"]);
    }

    #[test]
    fn listing_profile_keeps_index_fixed_and_pages_by_page() {
        let filter = RunProfile::listing_only().filter;
        let pairs = filter.query_pairs(4);

        assert_eq!(value(&pairs, "index"), vec!["1"]);
        assert_eq!(value(&pairs, "Page"), vec!["4"]);
        assert_eq!(value(&pairs, "PageSize"), vec!["200"]);
        assert_eq!(value(&pairs, "DocumentDateFrom"), vec!["01.01.2025"]);
        assert_eq!(value(&pairs, "SortDestination"), vec!["1"]);
    }

    #[test]
    fn search_type_flags_use_default_mode() {
        let pairs = RunProfile::full_download().filter.query_pairs(1);
        for key in [
            "PublishDateSearchType",
            "NumberSearchType",
            "DocumentDateSearchType",
            "JdRegSearchType",
        ] {
            assert_eq!(value(&pairs, key), vec!["0"], "{key}");
        }
    }

    #[test]
    fn query_pairs_do_not_depend_on_call_order() {
        let filter = RunProfile::full_download().filter;
        let first = filter.query_pairs(1);
        let _ = filter.query_pairs(7);
        assert_eq!(filter.query_pairs(1), first);
    }

    #[test]
    fn for_mode_selects_matching_profile() {
        assert_eq!(RunProfile::for_mode(RunMode::Download).mode, RunMode::Download);
        assert_eq!(RunProfile::for_mode(RunMode::ListOnly).mode, RunMode::ListOnly);
        assert_eq!(
            RunProfile::listing_only().page_delay,
            Duration::from_millis(300)
        );
    }
}

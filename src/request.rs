use std::time::Duration;

use reqwest::{header, Client, Response};
use tracing::debug;

use crate::parse::{parse_page, PageResult};
use crate::{QueryFilter, Result, CATALOGUE_URL, DOWNLOAD_URL, REQUEST_TIMEOUT};

/// Where the catalogue and the files are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub catalogue_url: String,
    pub download_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalogue_url: CATALOGUE_URL.to_string(),
            download_url: DOWNLOAD_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Both endpoints under a different origin, keeping the registry's paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            catalogue_url: format!("{base}/api/Documents"),
            download_url: format!("{base}/file/pdf"),
        }
    }

    /// Browser-facing link to a record's PDF.
    pub fn file_link(&self, eo_number: &str) -> String {
        format!("{}?eoNumber={eo_number}", self.download_url)
    }
}

/// HTTP client for both registry endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
    timeout: Duration,
}

impl ApiClient {
    /// Connecting and every single read are bounded by the timeout.
    /// Catalogue pages additionally get it as a total deadline, file bodies
    /// may stream for as long as data keeps arriving.
    pub fn new(endpoints: Endpoints, user_agent: &str) -> Result<Self> {
        Self::with_timeout(endpoints, user_agent, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoints: Endpoints, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoints,
            timeout,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Requests one catalogue page and decodes it.
    /// Transport errors and non-success statuses surface as `Error::Network`,
    /// undecodable bodies as `Error::Schema`.
    pub(crate) async fn request_page(&self, filter: &QueryFilter, page: u32) -> Result<PageResult> {
        debug!(page, url = %self.endpoints.catalogue_url, "requesting catalogue page");
        let body = self
            .client
            .get(&self.endpoints.catalogue_url)
            .query(&filter.query_pairs(page))
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_page(&body)
    }

    /// Starts the download of one file. The body is left unread for the
    /// caller to stream.
    pub(crate) async fn request_file(&self, eo_number: &str) -> Result<Response> {
        debug!(eo_number, url = %self.endpoints.download_url, "requesting file");
        let res = self
            .client
            .get(&self.endpoints.download_url)
            .query(&[("eoNumber", eo_number)])
            .send()
            .await?
            .error_for_status()?;
        Ok(res)
    }
}

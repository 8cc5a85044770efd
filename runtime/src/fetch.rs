//! HTTP access to the generator's static output.

use crate::member_index::MemberIndex;
use crate::model::NavManifest;
use crate::model::PageMetadata;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching generator output
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport failure, non-success status, or undecodable body
    #[error("request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A fetched page body plus its sidecar metadata. Both requests are joined
/// before the pair is handed to the navigator, so a page is never displayed
/// half-updated.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub html: String,
    pub metadata: PageMetadata,
}

/// Client for the read-only resources a documentation build serves.
#[derive(Clone, Debug)]
pub struct DocsClient {
    http: reqwest::Client,
    base_url: String,
}

impl DocsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the navigation tree descriptions for both tabs.
    pub async fn nav(&self) -> Result<NavManifest, FetchError> {
        self.fetch_json(format!("{}/nav.json", self.base_url)).await
    }

    /// Fetch the supplementary member index. The generator omits the file
    /// entirely when there are no members, so a 404 is an empty index, not
    /// an error.
    pub async fn member_index(&self) -> Result<MemberIndex, FetchError> {
        let url = format!("{}/functions.json", self.base_url);
        let wrap = |source| FetchError::Request {
            url: url.clone(),
            source,
        };
        let resp = self.http.get(&url).send().await.map_err(wrap)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(MemberIndex::default());
        }
        let resp = resp.error_for_status().map_err(wrap)?;
        let names: Vec<String> = resp.json().await.map_err(wrap)?;
        Ok(MemberIndex::from_names(names))
    }

    /// Fetch one page's markup and metadata concurrently, resolving both
    /// before returning.
    pub async fn page(&self, path: &str) -> Result<FetchedPage, FetchError> {
        let content_url = self.resource_url(path, "content.html");
        let metadata_url = self.resource_url(path, "metadata.json");
        let (html, metadata) = tokio::try_join!(
            self.fetch_text(content_url),
            self.fetch_json::<PageMetadata>(metadata_url)
        )?;
        Ok(FetchedPage { html, metadata })
    }

    fn resource_url(&self, path: &str, file: &str) -> String {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            format!("{}/{file}", self.base_url)
        } else {
            format!("{}/{trimmed}/{file}", self.base_url)
        }
    }

    async fn fetch_text(&self, url: String) -> Result<String, FetchError> {
        let wrap = |source| FetchError::Request {
            url: url.clone(),
            source,
        };
        let resp = self.http.get(&url).send().await.map_err(wrap)?;
        let resp = resp.error_for_status().map_err(wrap)?;
        resp.text().await.map_err(wrap)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        let wrap = |source| FetchError::Request {
            url: url.clone(),
            source,
        };
        let resp = self.http.get(&url).send().await.map_err(wrap)?;
        let resp = resp.error_for_status().map_err(wrap)?;
        resp.json().await.map_err(wrap)
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::download::DownloadError;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("metadata lookup is not configured")]
    Unavailable,
    #[error("invalid lookup endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("metadata request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("metadata service returned status {0}")]
    Status(StatusCode),
    #[error("unexpected metadata response shape: {0}")]
    Malformed(String),
}

/// One entry of a search result set. Every field is optional because the
/// service omits whatever it does not know.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Vec<Thumbnail>>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub result: Vec<VideoRecord>,
}

#[async_trait]
pub trait VideoLookup: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoRecord>, LookupError>;
}

/// Stand-in used when no search endpoint is configured or the caller asked to
/// stay offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLookup;

#[async_trait]
impl VideoLookup for UnavailableLookup {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<VideoRecord>, LookupError> {
        Err(LookupError::Unavailable)
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub api_base: Option<Url>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl LookupConfig {
    pub fn new(
        api_base: Option<&str>,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Result<Self, LookupError> {
        let api_base = api_base
            .map(|raw| Url::parse(raw).map_err(|_| LookupError::InvalidEndpoint(raw.to_string())))
            .transpose()?;
        Ok(Self {
            api_base,
            timeout,
            user_agent: user_agent.into(),
        })
    }

    fn build_http(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
    }
}

/// Queries a JSON search endpoint: `GET <api_base>?query=<q>&limit=<n>`
/// answering `{"result": [...]}`.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    api_base: Url,
}

impl SearchClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let api_base = config.api_base.clone().ok_or(LookupError::Unavailable)?;
        let http = config.build_http()?;
        Ok(Self { http, api_base })
    }

    fn search_url(&self, query: &str, limit: usize) -> Url {
        let mut url = self.api_base.clone();
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string());
        url
    }
}

#[async_trait]
impl VideoLookup for SearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<VideoRecord>, LookupError> {
        let url = self.search_url(query, limit);
        debug!(%url, "querying metadata service");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }
        let body = response.text().await?;
        match serde_json::from_str::<SearchResponse>(&body) {
            Ok(payload) => Ok(payload.result),
            Err(err) => {
                let snippet = body.chars().take(200).collect::<String>();
                Err(LookupError::Malformed(format!(
                    "{err}; first 200 bytes: {snippet}"
                )))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &LookupConfig) -> Result<Self, DownloadError> {
        let http = config.build_http()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        let mut response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let mut body = Vec::new();
        if status == 200 {
            while let Some(chunk) = response.chunk().await? {
                body.extend_from_slice(&chunk);
            }
        }
        Ok(FetchResponse { status, body })
    }
}

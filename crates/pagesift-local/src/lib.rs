//! Local backends: a reqwest fetcher and the scraper-based page model.

use futures_util::StreamExt;
use pagesift_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub mod html;
pub mod pipeline;

pub use pipeline::{search_markup, search_page, SearchOutcome};

/// Browser-like default; some origins serve stripped pages to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct LocalFetcherConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Used when a request carries no `FetchRequest::timeout_ms`; a per-request value replaces it.
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for LocalFetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_millis(pagesift_core::DEFAULT_FETCH_TIMEOUT_MS),
            max_redirects: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new(cfg: LocalFetcherConfig) -> Result<Self> {
        reqwest::Client::builder()
            .user_agent(cfg.user_agent)
            .redirect(reqwest::redirect::Policy::limited(cfg.max_redirects))
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.timeout)
            .build()
            .map(|client| Self { client })
            .map_err(|e| Error::Fetch(format!("client setup: {e}")))
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(LocalFetcherConfig::default())
    }
}

/// Decode a fetched body using the declared charset, UTF-8 when absent or unknown.
///
/// A byte-order mark overrides the declared charset.
pub fn decode_body(resp: &FetchResponse) -> String {
    let encoding = resp
        .charset()
        .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let (text, used, had_errors) = encoding.decode(&resp.bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), url = %resp.url, "body had undecodable bytes");
    }
    text.into_owned()
}

/// Caller headers minus credentials; malformed names or values are skipped.
fn forwardable_headers(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (k, v) in headers {
        let Ok(name) = HeaderName::from_bytes(k.as_bytes()) else {
            continue;
        };
        // HeaderName is normalized to lower case.
        if matches!(name.as_str(), "authorization" | "cookie" | "proxy-authorization") {
            tracing::debug!(header = %name, "dropping credential header");
            continue;
        }
        if let Ok(value) = HeaderValue::from_str(v) {
            out.insert(name, value);
        }
    }
    out
}

/// Drain the body, keeping at most `cap` bytes. Returns the bytes and whether any were cut.
async fn read_capped(resp: reqwest::Response, cap: usize) -> Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    let mut chunks = resp.bytes_stream();
    while let Some(next) = chunks.next().await {
        let chunk = next.map_err(|e| Error::Fetch(format!("body read: {e}")))?;
        let room = cap - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let started = Instant::now();
        let target = url::Url::parse(&req.url).map_err(|e| Error::InvalidInput(e.to_string()))?;

        let mut call = self
            .client
            .get(target)
            .headers(forwardable_headers(&req.headers));
        if let Some(limit) = req.timeout() {
            call = call.timeout(limit);
        }
        let resp = call
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{}: {e}", req.url)))?;

        let final_url = resp.url().as_str().to_owned();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let cap = usize::try_from(req.max_bytes.unwrap_or(u64::MAX)).unwrap_or(usize::MAX);
        let (bytes, truncated) = read_capped(resp, cap).await?;

        let mut timings_ms = BTreeMap::new();
        timings_ms.insert("network_fetch".to_owned(), started.elapsed().as_millis());
        tracing::debug!(
            url = %req.url,
            status,
            bytes = bytes.len(),
            truncated,
            "fetched"
        );
        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            truncated,
            timings_ms,
        })
    }
}

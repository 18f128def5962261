use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod extract;
pub mod present;
pub mod rank;
pub mod tree;

pub use extract::extract_fragments;
pub use rank::rank_fragments;
pub use tree::{DocNode, NodeItem};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("ranking failed: {0}")]
    Ranking(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Default bound on the origin fetch (network + body read).
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
/// Default hard cap on response body bytes.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Bounds applied while walking the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractLimits {
    /// Traversal stops once this many fragments have been emitted.
    pub max_fragments: usize,
    /// Minimum normalized text length, in characters.
    pub min_chars: usize,
    /// Minimum number of whitespace-delimited words.
    pub min_words: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_fragments: 50,
            min_chars: 10,
            min_words: 5,
        }
    }
}

/// Bounds applied while scoring and presenting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankLimits {
    pub max_results: usize,
    /// Query tokens shorter than this (in characters) are ignored.
    pub min_token_chars: usize,
    pub title_max_chars: usize,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            max_results: 10,
            min_token_chars: 3,
            title_max_chars: 100,
        }
    }
}

/// A candidate excerpt taken from one element of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub sequence_id: usize,
    /// Whitespace-collapsed plain text.
    pub text: String,
    /// Serialized markup of the element, for rendering.
    pub markup: String,
    /// Tag name (`p`, `h2`, `div`, ...).
    pub element_kind: String,
    pub word_count: usize,
    /// Slash-delimited ancestor kinds below `body`, e.g. `/article/p`.
    pub path: String,
    pub relevance_score: f64,
}

/// A fragment that survived ranking, with presentation fields.
///
/// Field names on the wire follow the JSON API consumed by the search UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(rename = "id")]
    pub sequence_id: usize,
    pub title: String,
    #[serde(rename = "content")]
    pub text: String,
    #[serde(rename = "html_content")]
    pub markup: String,
    pub path: String,
    pub relevance_score: f64,
    pub match_percentage: u8,
    pub word_count: usize,
    #[serde(rename = "element_type")]
    pub element_kind: String,
}

/// A validated URL + query pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub url: String,
    pub query: String,
}

impl SearchRequest {
    /// Trim both fields and check that the URL is absolute with a host.
    ///
    /// Runs before any network activity; every failure is `Error::InvalidInput`.
    pub fn validated(url: &str, query: &str) -> Result<Self> {
        let url = url.trim();
        let query = query.trim();
        if url.is_empty() || query.is_empty() {
            return Err(Error::InvalidInput(
                "Both URL and query are required".to_string(),
            ));
        }
        let parsed =
            url::Url::parse(url).map_err(|_| Error::InvalidInput("Invalid URL format".into()))?;
        let has_host = parsed.host_str().map(|h| !h.is_empty()).unwrap_or(false);
        if parsed.scheme().is_empty() || !has_host {
            return Err(Error::InvalidInput("Invalid URL format".to_string()));
        }
        Ok(Self {
            url: url.to_string(),
            query: query.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the operation (network + body read).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
    /// Optional headers to add (the adapter drops credentials).
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: Some(DEFAULT_FETCH_TIMEOUT_MS),
            max_bytes: Some(DEFAULT_MAX_BYTES),
            headers: BTreeMap::new(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
    pub timings_ms: BTreeMap<String, u128>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `charset` parameter of `Content-Type`, if the origin declared one.
    pub fn charset(&self) -> Option<&str> {
        self.content_type
            .as_deref()?
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(k, _)| k.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, v)| v.trim().trim_matches('"'))
            .filter(|v| !v.is_empty())
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_trims_and_accepts_absolute_urls() {
        let r = SearchRequest::validated("  https://example.com/docs  ", " setup ").unwrap();
        assert_eq!(r.url, "https://example.com/docs");
        assert_eq!(r.query, "setup");
    }

    #[test]
    fn validated_rejects_missing_fields() {
        for (u, q) in [("", "q"), ("https://example.com", "   "), ("  ", "")] {
            let err = SearchRequest::validated(u, q).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
            assert!(err.to_string().contains("required"));
        }
    }

    #[test]
    fn validated_rejects_relative_or_hostless_urls() {
        for u in ["example.com/page", "/just/a/path", "mailto:someone@example.com"] {
            let err = SearchRequest::validated(u, "query").unwrap_err();
            assert!(
                err.to_string().contains("Invalid URL format"),
                "url={u:?} err={err}"
            );
        }
    }

    #[test]
    fn fetch_response_success_is_2xx_only() {
        let mut r = FetchResponse {
            url: "https://x".into(),
            final_url: "https://x".into(),
            status: 200,
            content_type: None,
            bytes: Vec::new(),
            truncated: false,
            timings_ms: BTreeMap::new(),
        };
        assert!(r.is_success());
        r.status = 204;
        assert!(r.is_success());
        r.status = 301;
        assert!(!r.is_success());
        r.status = 404;
        assert!(!r.is_success());
    }

    #[test]
    fn charset_is_read_from_content_type_params() {
        let mut r = FetchResponse {
            url: "https://x".into(),
            final_url: "https://x".into(),
            status: 200,
            content_type: Some("text/html; Charset=\"ISO-8859-1\"".into()),
            bytes: Vec::new(),
            truncated: false,
            timings_ms: BTreeMap::new(),
        };
        assert_eq!(r.charset(), Some("ISO-8859-1"));
        r.content_type = Some("text/html".into());
        assert_eq!(r.charset(), None);
        r.content_type = Some("text/html; boundary=x; charset=".into());
        assert_eq!(r.charset(), None);
        r.content_type = None;
        assert_eq!(r.charset(), None);
    }

    #[test]
    fn default_limits_match_reference_caps() {
        let e = ExtractLimits::default();
        assert_eq!((e.max_fragments, e.min_chars, e.min_words), (50, 10, 5));
        let r = RankLimits::default();
        assert_eq!((r.max_results, r.min_token_chars, r.title_max_chars), (10, 3, 100));
    }

    #[test]
    fn scored_result_uses_api_field_names() {
        let r = ScoredResult {
            sequence_id: 4,
            title: "Install".into(),
            text: "Install the crate".into(),
            markup: "<p>Install the crate</p>".into(),
            path: "/main/p".into(),
            relevance_score: 0.5,
            match_percentage: 50,
            word_count: 3,
            element_kind: "p".into(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["id"], 4);
        assert_eq!(v["content"], "Install the crate");
        assert_eq!(v["html_content"], "<p>Install the crate</p>");
        assert_eq!(v["element_type"], "p");
        assert!(v.get("sequence_id").is_none());
    }
}

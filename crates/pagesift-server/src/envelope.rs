//! JSON response envelopes shared by the HTTP API and the `search` subcommand.

use axum::http::StatusCode;
use pagesift_core::Error;
use pagesift_local::SearchOutcome;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidInput,
    FetchFailed,
    ExtractionFailed,
    RankingFailed,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::FetchFailed => "fetch_failed",
            Self::ExtractionFailed => "extraction_failed",
            Self::RankingFailed => "ranking_failed",
        }
    }

    /// Retrying the same request may succeed (the origin was flaky).
    pub fn retryable(self) -> bool {
        match self {
            Self::FetchFailed => true,
            Self::InvalidInput | Self::ExtractionFailed | Self::RankingFailed => false,
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::FetchFailed | Self::ExtractionFailed | Self::RankingFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<&Error> for ErrorCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::InvalidInput(_) => Self::InvalidInput,
            Error::Fetch(_) => Self::FetchFailed,
            Error::Extraction(_) => Self::ExtractionFailed,
            Error::Ranking(_) => Self::RankingFailed,
        }
    }
}

#[derive(Debug, Serialize)]
struct SuccessBody<'a> {
    schema_version: u64,
    success: bool,
    results: &'a [pagesift_core::ScoredResult],
    /// Number of results returned (name kept for existing clients).
    total_chunks: usize,
    fragments_considered: usize,
    elapsed_ms: u128,
    /// Per-stage wall time (`network_fetch`, `extract`, `rank`).
    timings_ms: &'a BTreeMap<String, u128>,
}

pub fn success(outcome: &SearchOutcome, elapsed_ms: u128) -> serde_json::Value {
    let body = SuccessBody {
        schema_version: SCHEMA_VERSION,
        success: true,
        results: &outcome.results,
        total_chunks: outcome.results.len(),
        fragments_considered: outcome.fragments_considered,
        elapsed_ms,
        timings_ms: &outcome.timings_ms,
    };
    serde_json::to_value(body).unwrap_or_else(|e| {
        serde_json::json!({
            "error": "Internal server error",
            "details": e.to_string(),
        })
    })
}

/// Error body plus the HTTP status it should travel with.
///
/// Invalid input keeps its own message in `error`; everything else reports a generic
/// `error` with the underlying message in `details`.
pub fn error(e: &Error) -> (StatusCode, serde_json::Value) {
    let code = ErrorCode::from(e);
    let mut body = match e {
        Error::InvalidInput(msg) => serde_json::json!({ "error": msg }),
        other => serde_json::json!({
            "error": "Internal server error",
            "details": other.to_string(),
        }),
    };
    body["schema_version"] = serde_json::json!(SCHEMA_VERSION);
    body["code"] = serde_json::json!(code.as_str());
    body["retryable"] = serde_json::json!(code.retryable());
    (code.status(), body)
}

pub fn health() -> serde_json::Value {
    serde_json::json!({
        "status": "healthy",
        "message": "Search API is running",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400_with_plain_message() {
        let (status, body) = error(&Error::InvalidInput("Invalid URL format".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid URL format");
        assert!(body.get("details").is_none());
        assert_eq!(body["code"], "invalid_input");
        assert_eq!(body["retryable"], false);
    }

    #[test]
    fn pipeline_errors_map_to_500_with_details() {
        for (e, code, retryable) in [
            (Error::Fetch("HTTP 404".into()), "fetch_failed", true),
            (Error::Extraction("bad".into()), "extraction_failed", false),
            (Error::Ranking("bad".into()), "ranking_failed", false),
        ] {
            let (status, body) = error(&e);
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"], "Internal server error");
            assert_eq!(body["details"], e.to_string());
            assert_eq!(body["code"], code);
            assert_eq!(body["retryable"], retryable);
        }
    }

    #[test]
    fn success_counts_results_and_fragments() {
        let outcome = SearchOutcome {
            results: Vec::new(),
            fragments_considered: 12,
            timings_ms: BTreeMap::from([("extract".to_string(), 3), ("rank".to_string(), 1)]),
        };
        let v = success(&outcome, 5);
        assert_eq!(v["timings_ms"]["extract"], 3);
        assert_eq!(v["timings_ms"]["rank"], 1);
        assert_eq!(v["elapsed_ms"], 5);
        assert_eq!(v["success"], true);
        assert_eq!(v["total_chunks"], 0);
        assert_eq!(v["fragments_considered"], 12);
        assert_eq!(v["schema_version"], SCHEMA_VERSION);
        assert!(v["results"].as_array().unwrap().is_empty());
    }
}

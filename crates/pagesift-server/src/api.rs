//! HTTP surface: `POST /api/search/` and `GET /api/health/`.

use crate::envelope;
use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use pagesift_core::{Error, FetchBackend, SearchRequest};
use pagesift_local::pipeline::{search_page, SearchOptions};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Immutable per-process state; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn FetchBackend>,
    pub opts: Arc<SearchOptions>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    #[serde(default)]
    url: String,
    #[serde(default)]
    query: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health/", get(health))
        .route("/api/search/", post(search))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(envelope::health())
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Form posts are read as form fields; everything else must be JSON.
async fn read_body(req: Request) -> Result<SearchBody, String> {
    if is_form(&req) {
        Form::<SearchBody>::from_request(req, &())
            .await
            .map(|Form(b)| b)
            .map_err(|e| e.body_text())
    } else {
        Json::<SearchBody>::from_request(req, &())
            .await
            .map(|Json(b)| b)
            .map_err(|e| e.body_text())
    }
}

async fn search(
    State(state): State<AppState>,
    req: Request,
) -> (StatusCode, Json<serde_json::Value>) {
    let started = Instant::now();
    let body = match read_body(req).await {
        Ok(b) => b,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "rejected search body");
            let (status, payload) =
                envelope::error(&Error::InvalidInput("Both URL and query are required".into()));
            return (status, Json(payload));
        }
    };

    let req = match SearchRequest::validated(&body.url, &body.query) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "invalid search request");
            let (status, payload) = envelope::error(&e);
            return (status, Json(payload));
        }
    };

    match search_page(state.fetcher.as_ref(), &req, &state.opts).await {
        Ok(outcome) => {
            let elapsed_ms = started.elapsed().as_millis();
            tracing::info!(
                url = %req.url,
                results = outcome.results.len(),
                elapsed_ms = elapsed_ms as u64,
                "search complete"
            );
            (StatusCode::OK, Json(envelope::success(&outcome, elapsed_ms)))
        }
        Err(e) => {
            tracing::error!(url = %req.url, error = %e, "error in search");
            let (status, payload) = envelope::error(&e);
            (status, Json(payload))
        }
    }
}

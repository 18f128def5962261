//! End-to-end search: fetch → parse → extract → rank.
//!
//! Every stage is all-or-nothing: the first error aborts the request and no partial
//! results are returned.

use crate::decode_body;
use crate::html::ParsedPage;
use pagesift_core::{
    extract_fragments, rank_fragments, Error, ExtractLimits, FetchBackend, FetchRequest,
    RankLimits, Result, ScoredResult, SearchRequest,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<ScoredResult>,
    /// Fragments produced by extraction, before ranking dropped or truncated any.
    pub fragments_considered: usize,
    pub timings_ms: BTreeMap<String, u128>,
}

/// Limits and fetch knobs for one search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub extract: ExtractLimits,
    pub rank: RankLimits,
    pub timeout_ms: Option<u64>,
    pub max_bytes: Option<u64>,
}

/// CPU-only part of the pipeline, for markup already in hand.
pub fn search_markup(
    markup: &str,
    query: &str,
    extract: &ExtractLimits,
    rank: &RankLimits,
) -> Result<SearchOutcome> {
    let mut timings_ms = BTreeMap::new();

    let t0 = Instant::now();
    let page = ParsedPage::parse(markup)?;
    let fragments = extract_fragments(&page.root(), extract)?;
    timings_ms.insert("extract".to_string(), t0.elapsed().as_millis());
    let fragments_considered = fragments.len();
    tracing::info!(
        fragments = fragments_considered,
        pruned = page.pruned(),
        "created fragments"
    );

    let t1 = Instant::now();
    let results = rank_fragments(fragments, query, rank)?;
    timings_ms.insert("rank".to_string(), t1.elapsed().as_millis());
    tracing::info!(results = results.len(), "ranked fragments");

    Ok(SearchOutcome {
        results,
        fragments_considered,
        timings_ms,
    })
}

/// Fetch `req.url` with `fetcher` and rank the page's fragments against `req.query`.
///
/// A non-2xx origin status is a fetch failure; extraction never runs on error pages.
pub async fn search_page(
    fetcher: &dyn FetchBackend,
    req: &SearchRequest,
    opts: &SearchOptions,
) -> Result<SearchOutcome> {
    let req = SearchRequest::validated(&req.url, &req.query)?;

    tracing::info!(url = %req.url, "fetching page");
    let mut fetch_req = FetchRequest::new(req.url.clone());
    if opts.timeout_ms.is_some() {
        fetch_req.timeout_ms = opts.timeout_ms;
    }
    if opts.max_bytes.is_some() {
        fetch_req.max_bytes = opts.max_bytes;
    }
    let resp = fetcher.fetch(&fetch_req).await.inspect_err(|e| {
        tracing::error!(url = %req.url, error = %e, "fetch failed");
    })?;
    if !resp.is_success() {
        tracing::error!(url = %req.url, status = resp.status, "origin returned an error status");
        return Err(Error::Fetch(format!(
            "{} returned HTTP {}",
            resp.final_url, resp.status
        )));
    }
    if resp.truncated {
        tracing::warn!(url = %req.url, bytes = resp.bytes.len(), "body truncated at max_bytes");
    }

    let markup = decode_body(&resp);
    let query = req.query.clone();
    let (extract, rank) = (opts.extract, opts.rank);
    // Parsing and scoring are CPU-bound; keep them off the async workers.
    let mut out =
        tokio::task::spawn_blocking(move || search_markup(&markup, &query, &extract, &rank))
            .await
            .map_err(|e| Error::Extraction(format!("search task failed: {e}")))?
            .inspect_err(|e| tracing::error!(error = %e, "search failed"))?;
    for (k, v) in resp.timings_ms {
        out.timings_ms.insert(k, v);
    }
    Ok(out)
}

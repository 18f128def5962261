//! Lexical relevance ranking over extracted fragments.
//!
//! The score is additive and explainable:
//! - each query token found in the fragment adds `2 * occurrences / word_count`
//! - while iterating tokens, a verbatim match of the whole query adds `PHRASE_BONUS`
//!   (once per matching token, not once per fragment)
//! - `h1`..`h3` add `HEADING_BONUS`; fragments over `LONG_FRAGMENT_WORDS` words add `LENGTH_BONUS`
//!
//! The result is clamped to `1.0`; non-positive scores are dropped.

use crate::present::to_scored_result;
use crate::{Error, Fragment, RankLimits, Result, ScoredResult};

const DENSITY_WEIGHT: f64 = 2.0;
const PHRASE_BONUS: f64 = 0.5;
const HEADING_BONUS: f64 = 0.3;
const LENGTH_BONUS: f64 = 0.1;
const LONG_FRAGMENT_WORDS: usize = 20;
const MAX_SCORE: f64 = 1.0;

/// Lower-cased query tokens plus the lower-cased whole query for the phrase check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    pub tokens: Vec<String>,
    pub phrase: String,
}

impl QueryTerms {
    pub fn parse(query: &str, min_token_chars: usize) -> Self {
        let tokens = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .filter(|t| t.chars().count() >= min_token_chars)
            .collect();
        Self {
            tokens,
            phrase: query.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn is_title_heading(kind: &str) -> bool {
    matches!(kind, "h1" | "h2" | "h3")
}

/// Unclamped score for one fragment.
pub fn raw_score(fragment: &Fragment, terms: &QueryTerms) -> Result<f64> {
    if fragment.word_count == 0 {
        return Err(Error::Ranking(format!(
            "fragment {} has zero words",
            fragment.sequence_id
        )));
    }
    let hay = fragment.text.to_lowercase();
    let words = fragment.word_count as f64;
    let has_phrase = !terms.phrase.is_empty() && hay.contains(&terms.phrase);

    let mut score = 0.0;
    for tok in &terms.tokens {
        let occurrences = hay.matches(tok.as_str()).count();
        if occurrences == 0 {
            continue;
        }
        score += occurrences as f64 / words * DENSITY_WEIGHT;
        if has_phrase {
            score += PHRASE_BONUS;
        }
    }

    if is_title_heading(&fragment.element_kind) {
        score += HEADING_BONUS;
    }
    if fragment.word_count > LONG_FRAGMENT_WORDS {
        score += LENGTH_BONUS;
    }
    Ok(score)
}

/// Score, filter, sort and truncate. Ties keep document order.
pub fn rank_fragments(
    fragments: Vec<Fragment>,
    query: &str,
    limits: &RankLimits,
) -> Result<Vec<ScoredResult>> {
    let terms = QueryTerms::parse(query, limits.min_token_chars);
    if terms.is_empty() {
        tracing::debug!("query has no usable tokens");
        return Ok(Vec::new());
    }

    let mut kept: Vec<Fragment> = Vec::with_capacity(fragments.len());
    for mut f in fragments {
        let score = raw_score(&f, &terms)?;
        if score > 0.0 {
            f.relevance_score = score.min(MAX_SCORE);
            kept.push(f);
        }
    }

    // `sort_by` is stable, so equal scores stay in document order.
    kept.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    kept.truncate(limits.max_results);
    tracing::debug!(matched = kept.len(), "ranked fragments");

    Ok(kept
        .into_iter()
        .map(|f| to_scored_result(f, limits.title_max_chars))
        .collect())
}

//! Presentation helpers shared by the ranker and the HTTP layer.

use crate::{Fragment, ScoredResult};

const ELLIPSIS: &str = "...";

fn truncate_chars(s: &str, max_chars: usize) -> (String, bool) {
    let mut out = String::new();
    for (n, ch) in s.chars().enumerate() {
        if n >= max_chars {
            return (out, true);
        }
        out.push(ch);
    }
    (out, false)
}

fn clip_with_ellipsis(s: &str, max_chars: usize) -> String {
    match truncate_chars(s, max_chars) {
        (mut out, true) => {
            out.push_str(ELLIPSIS);
            out
        }
        (out, false) => out,
    }
}

/// First sentence of `text` (split on literal `.`), clipped to `max_chars`.
///
/// Falls back to the head of the whole text when the text starts with a period.
pub fn derive_title(text: &str, max_chars: usize) -> String {
    match text.split('.').next() {
        Some(first) if !first.is_empty() => clip_with_ellipsis(first.trim(), max_chars),
        _ => clip_with_ellipsis(text, max_chars),
    }
}

/// `score * 100`, truncated toward zero.
pub fn match_percentage(score: f64) -> u8 {
    (score.clamp(0.0, 1.0) * 100.0) as u8
}

pub fn to_scored_result(f: Fragment, title_max_chars: usize) -> ScoredResult {
    ScoredResult {
        title: derive_title(&f.text, title_max_chars),
        match_percentage: match_percentage(f.relevance_score),
        sequence_id: f.sequence_id,
        text: f.text,
        markup: f.markup,
        path: f.path,
        relevance_score: f.relevance_score,
        word_count: f.word_count,
        element_kind: f.element_kind,
    }
}

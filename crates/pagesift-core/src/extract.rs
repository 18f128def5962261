//! Fragment extraction: document tree → bounded list of candidate excerpts.

use crate::tree::{collect_text, DocNode, NodeItem};
use crate::{ExtractLimits, Fragment, Result};

/// Subtrees rooted at these elements never contribute text or fragments.
pub const NON_CONTENT_KINDS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Elements that may become fragments.
pub const CANDIDATE_KINDS: &[&str] = &[
    "div", "section", "article", "p", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Element at which the path walk stops (exclusive).
const CONTENT_ROOT: &str = "body";
const FALLBACK_PATH: &str = "/content";

pub fn is_non_content(kind: &str) -> bool {
    NON_CONTENT_KINDS.contains(&kind)
}

fn is_candidate(kind: &str) -> bool {
    CANDIDATE_KINDS.contains(&kind)
}

pub(crate) fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Slash-joined element kinds from just below `body` down to `node` (inclusive).
pub fn element_path<N: DocNode>(node: &N) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        if n.kind() == CONTENT_ROOT {
            break;
        }
        parts.push(n.kind().to_string());
        cur = n.parent();
    }
    if parts.is_empty() {
        return FALLBACK_PATH.to_string();
    }
    parts.reverse();
    format!("/{}", parts.join("/"))
}

struct Walk<'l> {
    limits: &'l ExtractLimits,
    out: Vec<Fragment>,
}

impl Walk<'_> {
    fn full(&self) -> bool {
        self.out.len() >= self.limits.max_fragments
    }

    /// Pre-order visit. Returns early once the cap is hit.
    fn visit<N: DocNode>(&mut self, node: &N) -> Result<()> {
        if self.full() || is_non_content(node.kind()) {
            return Ok(());
        }
        if is_candidate(node.kind()) {
            self.consider(node)?;
        }
        for child in node.children() {
            if self.full() {
                break;
            }
            if let NodeItem::Element(el) = child {
                self.visit(&el)?;
            }
        }
        Ok(())
    }

    fn consider<N: DocNode>(&mut self, node: &N) -> Result<()> {
        let text = norm_ws(&collect_text(node, &is_non_content));
        if text.is_empty() || text.chars().count() < self.limits.min_chars {
            return Ok(());
        }
        let word_count = text.split_whitespace().count();
        if word_count < self.limits.min_words {
            return Ok(());
        }
        let markup = node.to_markup()?;
        self.out.push(Fragment {
            sequence_id: self.out.len(),
            text,
            markup,
            element_kind: node.kind().to_string(),
            word_count,
            path: element_path(node),
            relevance_score: 0.0,
        });
        Ok(())
    }
}

/// Walk `root` in document order and emit candidate fragments.
///
/// Traversal stops as soon as `limits.max_fragments` fragments exist. Any serialization
/// failure aborts the whole run.
pub fn extract_fragments<N: DocNode>(root: &N, limits: &ExtractLimits) -> Result<Vec<Fragment>> {
    let mut walk = Walk {
        limits,
        out: Vec::new(),
    };
    walk.visit(root)?;
    tracing::debug!(fragments = walk.out.len(), "extracted fragments");
    Ok(walk.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixture::{build, el, text, Shape};
    use crate::Error;
    use proptest::prelude::*;

    fn body(children: Vec<Shape>) -> crate::tree::fixture::El {
        build(el("html", vec![el("head", vec![]), el("body", children)]))
    }

    #[test]
    fn emits_headings_and_paragraphs_in_document_order() {
        let root = body(vec![
            el("h1", vec![text("Getting Started Guide for New Users")]),
            el(
                "p",
                vec![text("This is a short paragraph about setup and installation procedures.")],
            ),
        ]);
        let frags = extract_fragments(&root, &ExtractLimits::default()).unwrap();
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].element_kind, "h1");
        assert_eq!(frags[0].sequence_id, 0);
        assert_eq!(frags[0].path, "/h1");
        assert_eq!(frags[1].element_kind, "p");
        assert_eq!(frags[1].sequence_id, 1);
        assert_eq!(frags[1].word_count, 10);
        assert_eq!(frags[1].relevance_score, 0.0);
    }

    #[test]
    fn short_heading_is_filtered_by_word_floor() {
        let root = body(vec![el("h1", vec![text("Getting Started Guide")])]);
        let frags = extract_fragments(&root, &ExtractLimits::default()).unwrap();
        assert!(frags.is_empty());
    }

    #[test]
    fn script_inside_div_does_not_count_toward_words() {
        let root = body(vec![el(
            "div",
            vec![
                el("script", vec![text("alert(1); var lots = of + words + here;")]),
                text("only three words"),
            ],
        )]);
        let frags = extract_fragments(&root, &ExtractLimits::default()).unwrap();
        assert!(frags.is_empty(), "got {frags:?}");
    }

    #[test]
    fn non_content_subtrees_are_skipped_entirely() {
        let root = body(vec![
            el(
                "nav",
                vec![el("div", vec![text("Home About Pricing Contact Careers Blog")])],
            ),
            el(
                "article",
                vec![el("p", vec![text("The article body has enough words to keep.")])],
            ),
            el("footer", vec![el("p", vec![text("Copyright notice with many words inside it")])]),
        ]);
        let frags = extract_fragments(&root, &ExtractLimits::default()).unwrap();
        assert_eq!(frags.len(), 2);
        for f in &frags {
            assert!(!f.text.contains("Pricing"));
            assert!(!f.text.contains("Copyright"));
        }
        assert_eq!(frags[0].path, "/article");
        assert_eq!(frags[1].path, "/article/p");
    }

    #[test]
    fn nested_candidates_are_both_emitted_and_text_is_normalized() {
        let root = body(vec![el(
            "section",
            vec![el("p", vec![text("  one\n two \t three   four five  ")])],
        )]);
        let frags = extract_fragments(&root, &ExtractLimits::default()).unwrap();
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].element_kind, "section");
        assert_eq!(frags[0].text, "one two three four five");
        assert_eq!(frags[1].path, "/section/p");
        assert_eq!(frags[1].markup, "<p>  one\n two \t three   four five  </p>");
    }

    #[test]
    fn char_floor_applies_even_with_enough_words() {
        // Five words, nine characters.
        let root = body(vec![el("p", vec![text("a b c d e")])]);
        assert!(extract_fragments(&root, &ExtractLimits::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn path_stops_at_tree_top_and_falls_back_at_body() {
        let root = build(el("p", vec![text("detached paragraph with five words")]));
        let frags = extract_fragments(&root, &ExtractLimits::default()).unwrap();
        assert_eq!(frags[0].path, "/p");

        let b = build(el("body", vec![]));
        assert_eq!(element_path(&b), "/content");
    }

    #[test]
    fn serialization_failure_aborts_extraction() {
        let root = body(vec![
            el("p", vec![text("first paragraph is perfectly fine here")]),
            Shape::Broken("p", vec![text("second paragraph cannot be serialized")]),
        ]);
        let err = extract_fragments(&root, &ExtractLimits::default()).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn cap_stops_traversal_and_keeps_document_order() {
        let paras: Vec<Shape> = (0..60)
            .map(|i| el("p", vec![text(format!("paragraph number {i} has several words"))]))
            .collect();
        let root = body(paras);
        let limits = ExtractLimits {
            max_fragments: 7,
            ..ExtractLimits::default()
        };
        let frags = extract_fragments(&root, &limits).unwrap();
        assert_eq!(frags.len(), 7);
        for (i, f) in frags.iter().enumerate() {
            assert_eq!(f.sequence_id, i);
            assert!(f.text.contains(&format!("number {i} ")));
        }
    }

    #[test]
    fn cap_does_not_serialize_past_the_limit() {
        // The broken element sits after the cap, so it must never be touched.
        let mut kids: Vec<Shape> = (0..3)
            .map(|i| el("p", vec![text(format!("paragraph number {i} has several words"))]))
            .collect();
        kids.push(Shape::Broken("p", vec![text("never reached by the walk at all")]));
        let limits = ExtractLimits {
            max_fragments: 3,
            ..ExtractLimits::default()
        };
        let frags = extract_fragments(&body(kids), &limits).unwrap();
        assert_eq!(frags.len(), 3);
    }

    proptest! {
        #[test]
        fn emitted_fragments_respect_floors_and_cap(
            words in prop::collection::vec(prop::collection::vec("[a-z]{1,6}", 0..9), 0..80),
        ) {
            let kids: Vec<Shape> = words
                .iter()
                .map(|ws| el("p", vec![text(ws.join(" "))]))
                .collect();
            let root = body(kids);
            let limits = ExtractLimits::default();
            let frags = extract_fragments(&root, &limits).unwrap();
            prop_assert!(frags.len() <= limits.max_fragments);
            for (i, f) in frags.iter().enumerate() {
                prop_assert_eq!(f.sequence_id, i);
                prop_assert!(f.word_count >= limits.min_words);
                prop_assert!(f.text.chars().count() >= limits.min_chars);
            }
            // Truncation keeps the first eligible paragraphs in order.
            let eligible: Vec<String> = words
                .iter()
                .map(|ws| ws.join(" "))
                .filter(|t| t.split_whitespace().count() >= 5 && t.chars().count() >= 10)
                .take(limits.max_fragments)
                .collect();
            let got: Vec<String> = frags.into_iter().map(|f| f.text).collect();
            prop_assert_eq!(got, eligible);
        }
    }
}

//! `scraper`-backed document tree.
//!
//! Parsing never fails: html5ever recovers from malformed markup the way browsers do.
//! Non-content subtrees (script/style/nav/...) are detached right after parsing so they
//! show up neither in fragment text nor in serialized fragment markup.

use html_scraper::{ElementRef, Html, Node, Selector};
use pagesift_core::extract::NON_CONTENT_KINDS;
use pagesift_core::{DocNode, Error, NodeItem, Result};

/// A parsed page with non-content subtrees already removed.
pub struct ParsedPage {
    doc: Html,
    pruned: usize,
}

impl ParsedPage {
    pub fn parse(markup: &str) -> Result<Self> {
        let mut doc = Html::parse_document(markup);
        let sel = Selector::parse(&NON_CONTENT_KINDS.join(","))
            .map_err(|e| Error::Extraction(format!("bad selector: {e:?}")))?;
        let ids: Vec<_> = doc.select(&sel).map(|el| el.id()).collect();
        let pruned = ids.len();
        for id in ids {
            // Nested matches stay addressable after their ancestor is detached.
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
        }
        if !doc.errors.is_empty() {
            tracing::debug!(parse_errors = doc.errors.len(), "markup parsed with recoveries");
        }
        Ok(Self { doc, pruned })
    }

    /// Number of non-content subtrees removed.
    pub fn pruned(&self) -> usize {
        self.pruned
    }

    /// The `<html>` element; html5ever always synthesizes one.
    pub fn root(&self) -> HtmlNode<'_> {
        HtmlNode(self.doc.root_element())
    }
}

/// Element handle implementing the traversal capabilities the extractor needs.
#[derive(Debug, Clone, Copy)]
pub struct HtmlNode<'a>(ElementRef<'a>);

impl DocNode for HtmlNode<'_> {
    fn kind(&self) -> &str {
        self.0.value().name()
    }

    fn children(&self) -> Vec<NodeItem<'_, Self>> {
        self.0
            .children()
            .filter_map(|child| match child.value() {
                Node::Text(t) => Some(NodeItem::Text(&**t)),
                Node::Element(_) => ElementRef::wrap(child).map(|el| NodeItem::Element(HtmlNode(el))),
                _ => None,
            })
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent().and_then(ElementRef::wrap).map(HtmlNode)
    }

    fn to_markup(&self) -> Result<String> {
        Ok(self.0.html())
    }
}

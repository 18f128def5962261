//! Parser-agnostic view of a document tree.
//!
//! The extractor only needs a handful of capabilities from an element: its tag name, its
//! children (elements and text runs, in document order), its parent element, and a way to
//! serialize it back to markup. Parser adapters (see `pagesift-local`) implement [`DocNode`]
//! over their own node handles.

use crate::Result;

/// One child of an element, in document order.
#[derive(Debug, Clone)]
pub enum NodeItem<'t, N> {
    Element(N),
    Text(&'t str),
}

pub trait DocNode: Sized + Clone {
    /// Lower-case tag name.
    fn kind(&self) -> &str;

    fn children(&self) -> Vec<NodeItem<'_, Self>>;

    /// Parent element, `None` at the top of the element tree.
    fn parent(&self) -> Option<Self>;

    /// Serialized outer markup of this element.
    fn to_markup(&self) -> Result<String>;
}

/// Elements that start a new line when rendered; their edges separate words.
const BLOCK_KINDS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

fn is_block(kind: &str) -> bool {
    BLOCK_KINDS.contains(&kind)
}

/// Concatenate the text runs under `node`, skipping subtrees for which `skip` returns true.
///
/// Inline markup joins its text directly (`the <a>docs</a>,` reads `the docs,`). Block
/// elements and skipped subtrees insert a space at their edges. Callers normalize
/// whitespace afterwards.
pub fn collect_text<N, F>(node: &N, skip: &F) -> String
where
    N: DocNode,
    F: Fn(&str) -> bool,
{
    let mut out = String::new();
    push_text(node, skip, &mut out);
    out
}

fn push_text<N, F>(node: &N, skip: &F, out: &mut String)
where
    N: DocNode,
    F: Fn(&str) -> bool,
{
    for child in node.children() {
        match child {
            NodeItem::Text(t) => out.push_str(t),
            NodeItem::Element(el) => {
                if skip(el.kind()) {
                    out.push(' ');
                    continue;
                }
                let block = is_block(el.kind());
                if block {
                    out.push(' ');
                }
                push_text(&el, skip, out);
                if block {
                    out.push(' ');
                }
            }
        }
    }
}

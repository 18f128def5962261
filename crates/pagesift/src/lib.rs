//! Public facade crate for `pagesift`.
//!
//! No IO and no parser lives here: this re-exports the fragment model, the [`DocNode`]
//! traversal trait, the extractor and the ranker from `pagesift-core`. Pair it with
//! `pagesift-local` for fetching and HTML parsing.

pub use pagesift_core::*;

//! `pagesift-server` library surface.
//!
//! The primary entrypoint for end users is the `pagesift` binary (CLI + HTTP API).
//! This library exists so the router and response envelopes can be embedded and tested
//! without spawning the binary.

pub mod api;
pub mod envelope;

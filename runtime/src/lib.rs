//! uisentinel runtime: evidence extraction for deceptive UI detection.
//!
//! A pass over a rendered page finds interactive and ad-like elements
//! ([`discovery`]), records bounded evidence about each one ([`extraction`])
//! and triages the result with cheap heuristics ([`scoring`]). The evidence
//! is what a downstream classifier consumes; this crate does not decide
//! whether anything is malicious.

pub mod ad_slots;
pub mod capture;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod dom;
pub mod extraction;
pub mod live;
pub mod pipeline;
pub mod renderer;
pub mod scoring;

pub use config::{ConfigError, ExtractionConfig};
pub use dom::{DocumentTree, HtmlDocument};
pub use pipeline::{run_pass, PassReport};

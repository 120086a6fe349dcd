//! Handlers that work against a live page through a [`crate::renderer::RenderContext`].

pub mod recheck;

pub use recheck::{recheck_ad_slots, DEFAULT_RECHECK_DELAYS};

//! Browser seam.
//!
//! The runtime never drives a browser itself. Whatever hosts the page (a
//! CDP session, a WebDriver client, an extension bridge) implements
//! [`RenderContext`] and hands it to the capture and recheck code.

use anyhow::Result;
use async_trait::async_trait;

/// A live page that can evaluate script.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Evaluate `script` in the page and return its completion value as JSON.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
}

//! Re-run the ad-slot check on a live page at fixed delays.
//!
//! Ad networks inject creatives asynchronously, so one check at load time
//! under-reports populated slots. Each check captures the page afresh and
//! runs an independent [`check_ad_slots_with`]; nothing carries over between
//! checks.

use crate::ad_slots::{check_ad_slots_with, AdSlotReport};
use crate::capture::capture_document;
use crate::config::ExtractionConfig;
use crate::renderer::RenderContext;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::info;

/// Check at load, then three and six seconds later.
pub const DEFAULT_RECHECK_DELAYS: [Duration; 3] = [
    Duration::from_secs(0),
    Duration::from_secs(3),
    Duration::from_secs(6),
];

/// Label for a check taken `delay` after the first one, e.g. `t=3s`.
pub fn delay_label(delay: Duration) -> String {
    if delay.subsec_millis() == 0 {
        format!("t={}s", delay.as_secs())
    } else {
        format!("t={:.1}s", delay.as_secs_f64())
    }
}

/// Run one ad-slot check per delay. Delays are offsets from the call, not
/// gaps between checks, so a slow capture does not push later checks back.
pub async fn recheck_ad_slots(
    context: &dyn RenderContext,
    config: &ExtractionConfig,
    delays: &[Duration],
) -> Result<Vec<AdSlotReport>> {
    let selector = config
        .ad_container_selector()
        .context("compiling ad-container selector")?;
    let start = Instant::now();
    let mut reports = Vec::with_capacity(delays.len());

    for &delay in delays {
        sleep_until(start + delay).await;
        let label = delay_label(delay);

        let doc = capture_document(context)
            .await
            .with_context(|| format!("capturing page for ad-slot check {label}"))?;
        let report = check_ad_slots_with(&doc, &selector, &label);

        info!(
            label = %report.label,
            slots = report.slots.len(),
            populated = report.populated_count(),
            "ad-slot recheck"
        );
        reports.push(report);
    }

    Ok(reports)
}

//! `uisentinel ad-slots <input>`: report ad-container population.

use crate::ad_slots::{check_ad_slots, AdSlot, AdSlotReport};
use crate::cli::input::{self, SourceArgs};
use crate::cli::output::{self, Styled};
use crate::config::ExtractionConfig;
use crate::dom::round_px;
use anyhow::{Context, Result};
use std::path::Path;

/// Run the ad-slots command.
pub fn run(input: &Path, source: &SourceArgs, label: &str, config: &ExtractionConfig) -> Result<()> {
    let doc = input::load_document(input, source)?;
    let report = check_ad_slots(&doc, config, label).context("checking ad slots")?;

    if output::is_json() {
        return output::print_json(&report);
    }
    print_report(&Styled::new(), &report);
    Ok(())
}

fn print_report(s: &Styled, report: &AdSlotReport) {
    output::print_header(s);
    output::print_section(
        s,
        &format!("Ad-slot check [{}]", report.label),
        report.slots.len(),
    );
    for slot in &report.slots {
        let line = format_slot(slot);
        if slot.populated {
            output::print_item(&s.green(&line));
        } else {
            output::print_item(&line);
        }
    }
}

/// One line per slot, e.g.
/// `<ins> adsbygoogle @(0,0) 300x250 children=1 iframes=1 populated=true`.
pub fn format_slot(slot: &AdSlot) -> String {
    format!(
        "<{}> {} @({},{}) {}x{} children={} iframes={} populated={}",
        slot.tag_name,
        slot.identifier,
        round_px(slot.rect.top),
        round_px(slot.rect.left),
        round_px(slot.rect.width),
        round_px(slot.rect.height),
        slot.child_count,
        slot.iframe_count,
        slot.populated
    )
}

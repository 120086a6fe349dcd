//! `uisentinel extract <input>`: run a full extraction pass.

use crate::cli::input::{self, SourceArgs};
use crate::cli::output::{self, Styled};
use crate::config::ExtractionConfig;
use crate::pipeline::{run_pass, PassReport};
use crate::scoring::{Bucket, BucketSummary};
use anyhow::{Context, Result};
use std::path::Path;

/// Run the extract command.
pub fn run(input: &Path, source: &SourceArgs, summary: bool, config: &ExtractionConfig) -> Result<()> {
    let doc = input::load_document(input, source)?;
    let report = run_pass(&doc, config).context("running extraction pass")?;

    if !summary {
        return output::print_json(&report);
    }

    let buckets = report.summary();
    if output::is_json() {
        return output::print_json(&buckets);
    }
    print_summary(&Styled::new(), &report, &buckets);
    Ok(())
}

fn print_summary(s: &Styled, report: &PassReport, buckets: &BucketSummary) {
    output::print_header(s);
    if !output::is_quiet() {
        eprintln!(
            "  {} {}",
            s.dim("page"),
            report.result.url
        );
        eprintln!(
            "  {} {} candidates, {} kept, {} packets",
            s.dim("pass"),
            report.result.candidate_count,
            report.result.capped_count,
            report.result.packets.len()
        );
        eprintln!();
    }

    for (bucket, title) in [
        (Bucket::High, "HIGH signal"),
        (Bucket::Medium, "MEDIUM signal"),
        (Bucket::Low, "LOW signal"),
    ] {
        let lines = buckets.bucket(bucket);
        output::print_section(s, title, lines.len());
        for line in lines {
            let painted = match bucket {
                Bucket::High => s.red(line),
                Bucket::Medium => s.yellow(line),
                Bucket::Low => s.dim(line),
            };
            output::print_item(&painted);
        }
    }
}

//! One extraction pass: discovery, evidence and triage.

use crate::config::{ConfigError, ExtractionConfig};
use crate::discovery::discover_with;
use crate::dom::DocumentTree;
use crate::extraction::{extract_evidence, ExtractionResult};
use crate::scoring::{self, BucketSummary, Triage};
use serde::{Deserialize, Serialize};

/// Output of a pass: the extraction result as the classifier consumes it,
/// plus the heuristic triage for each packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    #[serde(flatten)]
    pub result: ExtractionResult,
    pub triage: Vec<Triage>,
}

impl PassReport {
    pub fn summary(&self) -> BucketSummary {
        BucketSummary::from_triage(&self.result.packets, &self.triage)
    }
}

/// Run a full pass over the whole document.
///
/// The configuration is validated first; a bad selector or lexicon pattern
/// fails the pass before the document is read.
pub fn run_pass<T: DocumentTree>(
    tree: &T,
    config: &ExtractionConfig,
) -> Result<PassReport, ConfigError> {
    let compiled = config.compile()?;
    let discovery = discover_with(tree, None, &compiled);
    let result = extract_evidence(tree, &discovery, config);
    let triage = scoring::triage(&result.packets, &compiled.lexicon);
    Ok(PassReport { result, triage })
}

//! `uisentinel config`: print the effective configuration.

use crate::cli::output;
use crate::config::ExtractionConfig;
use anyhow::Result;

/// Run the config command.
pub fn run(config: &ExtractionConfig) -> Result<()> {
    output::print_json(config)
}

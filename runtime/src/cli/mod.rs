//! CLI for the `uisentinel` binary.

pub mod ad_slots_cmd;
pub mod config_cmd;
pub mod extract_cmd;
pub mod input;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use input::{ConfigOverrides, SourceArgs};
use output::OutputMode;
use std::path::PathBuf;

/// Find deceptive-UI candidates in a page and emit evidence packets.
#[derive(Parser, Debug)]
#[command(name = "uisentinel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON configuration file; missing fields keep their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Machine-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress decorative output and lower logging to warnings
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run discovery, evidence extraction and triage over a page
    Extract {
        /// HTML file, capture JSON with --capture, or - for stdin
        input: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
        /// Print packets grouped by triage bucket instead of the full report
        #[arg(long)]
        summary: bool,
    },
    /// Check which ad containers are rendered and populated
    AdSlots {
        /// HTML file, capture JSON with --capture, or - for stdin
        input: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
        /// Label recorded on the report
        #[arg(long, default_value = "t=0s")]
        label: String,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    output::init(OutputMode {
        json: cli.json,
        quiet: cli.quiet,
    });
    let config = input::load_config(cli.config.as_deref(), &cli.overrides)?;

    match cli.command {
        Commands::Extract {
            input,
            source,
            summary,
        } => extract_cmd::run(&input, &source, summary, &config),
        Commands::AdSlots {
            input,
            source,
            label,
        } => ad_slots_cmd::run(&input, &source, &label, &config),
        Commands::Config => config_cmd::run(&config),
    }
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uisentinel_runtime::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json, cli.quiet);
    cli::run(cli)
}

/// Logs go to stderr so stdout stays clean for JSON output. `RUST_LOG`
/// overrides the default level.
fn init_tracing(json: bool, quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ptf_cli::Cli;

fn main() -> Result<()> {
    // stdout is the prompt surface, so diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run()
}

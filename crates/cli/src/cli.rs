use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::commands::prompt_command;

/// Prompt a human for the outputs of one adapter call
#[derive(Parser, Debug)]
#[command(name = "ptf-console")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging (written to stderr)"
)]
pub struct Cli {
    /// Bridge request JSON, as written by the test process
    pub request: String,

    /// Read answers from FILE instead of the console
    #[arg(short = 'a', long = "answers", value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Show what would be asked without prompting or writing the result file
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        prompt_command(&self.request, self.answers.as_deref(), self.dry_run)
    }
}

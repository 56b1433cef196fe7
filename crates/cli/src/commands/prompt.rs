use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use ptf_core::bridge::{BridgeRequest, child};
use ptf_core::console::ConsolePrompter;

pub fn prompt_command(request_json: &str, answers: Option<&Path>, dry_run: bool) -> Result<()> {
    let request = BridgeRequest::from_json(request_json)?;
    debug!("Bridge request: {}", serde_json::to_string_pretty(&request)?);

    if dry_run {
        print_dry_run(&request);
        return Ok(());
    }

    let mut prompter = match answers {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open answers file {}", path.display()))?;
            ConsolePrompter::new(BufReader::new(file), io::stdout())
        }
        None => ConsolePrompter::stdio(),
    };

    let result = child::serve(&request, &mut prompter).context("Prompting failed")?;
    child::write_result(&request.out_file_path, &result).with_context(|| {
        format!(
            "Failed to write result file {}",
            request.out_file_path.display()
        )
    })?;

    info!(
        aborted = result.aborted,
        out_file = %request.out_file_path.display(),
        "result written"
    );
    Ok(())
}

fn print_dry_run(request: &BridgeRequest) {
    println!("{}", request.help_msg);
    println!();
    println!("Would ask for:");
    if let Some(ret) = &request.return_param {
        println!("  {} ({})", ret.title, ret.type_name);
    }
    for param in &request.out_params {
        println!("  {} ({})", param.title, param.type_name);
    }
    println!("Result file: {}", request.out_file_path.display());
}

use std::fs;
use std::path::PathBuf;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::command::ChildCommand;
use crate::console::compose_help;
use crate::error::{Error, Result};
use crate::marshal::ParameterTable;

use super::{BridgeRequest, BridgeResult};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    Completed(BridgeResult),
    Aborted,
}

/// Runs the prompt protocol in a spawned helper process
#[derive(Debug, Clone)]
pub struct ChildConsoleBridge {
    helper: PathBuf,
    helper_args: Vec<String>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl ChildConsoleBridge {
    pub fn new(helper: impl Into<PathBuf>) -> Self {
        Self {
            helper: helper.into(),
            helper_args: Vec::new(),
            timeout: None,
            cancel: CancellationToken::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Arguments placed before the serialized request.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.helper_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Spawn the helper for one call and block until it exits.
    pub fn call(&self, help: &str, table: &ParameterTable) -> Result<BridgeOutcome> {
        let out_file = tempfile::Builder::new()
            .prefix("ptf-bridge-")
            .suffix(".json")
            .tempfile()?
            .into_temp_path();

        let request =
            BridgeRequest::from_table(compose_help(help, table), table, out_file.to_path_buf());
        let command = ChildCommand::new_helper(&self.helper)
            .with_args(self.helper_args.iter().cloned())
            .with_arg(serde_json::to_string(&request)?);
        debug!(
            helper = %self.helper.display(),
            out_file = %out_file.display(),
            "spawning prompt helper"
        );

        let mut child = command.spawn()?;
        let status = self.wait(&mut child)?;
        if !status.success() {
            return Err(Error::ChildProcessFailed {
                helper: self.helper.clone(),
                code: status.code(),
            });
        }

        let text = fs::read_to_string(&out_file)?;
        let result: BridgeResult = serde_json::from_str(&text)
            .map_err(|e| Error::BridgeProtocol(format!("invalid result file: {e}")))?;
        result.validate(&request)?;

        if let Err(e) = out_file.close() {
            warn!("Failed to remove bridge result file: {}", e);
        }

        if result.aborted {
            Ok(BridgeOutcome::Aborted)
        } else {
            Ok(BridgeOutcome::Completed(result))
        }
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if self.cancel.is_cancelled() {
                stop(child);
                return Err(Error::Cancelled);
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    stop(child);
                    return Err(Error::Timeout(limit));
                }
            }
            thread::sleep(self.poll_interval);
        }
    }
}

fn stop(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill prompt helper {}: {}", child.id(), e);
    }
    // reap so the helper does not linger as a zombie
    let _ = child.wait();
}

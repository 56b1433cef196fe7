//! Script backend: one `<method>.sh` per method
//!
//! Inputs are passed as positional parameters in their text form and every
//! configuration property is exported as `PTFPROP_<KEY>`. The exit code is
//! the only result channel, so output parameters cannot be served.

use std::path::PathBuf;

use tracing::debug;

use crate::codec;
use crate::command::ChildCommand;
use crate::config::PtfConfig;
use crate::dispatch::{DispatchRequest, DispatchResult};
use crate::error::{Error, Result};
use crate::types::Value;

use super::AdapterBackend;

const PROPERTY_PREFIX: &str = "PTFPROP_";

pub struct ShellBackend {
    script_dir: PathBuf,
    env: Vec<(String, String)>,
}

impl ShellBackend {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            env: Vec::new(),
        }
    }

    /// Export every property to the scripts.
    pub fn with_properties(mut self, config: &PtfConfig) -> Self {
        self.env.extend(
            config
                .iter()
                .map(|(key, value)| (property_variable(key), value.to_string())),
        );
        self
    }
}

fn property_variable(key: &str) -> String {
    format!("{PROPERTY_PREFIX}{}", key.replace('.', "_"))
}

impl AdapterBackend for ShellBackend {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn invoke(&mut self, request: &DispatchRequest) -> Result<DispatchResult> {
        let method = request.method();
        if request.shape.output_count() > 0 {
            return Err(Error::Unsupported(format!(
                "shell method '{method}' declares output parameters"
            )));
        }
        let return_type = request.signature.return_type.as_ref();
        if let Some(ty) = return_type {
            if !ty.is_bool() && !ty.is_integer() {
                return Err(Error::Unsupported(format!(
                    "shell method '{method}' returns {ty}; \
                     only bool and integer returns are supported"
                )));
            }
        }

        let script = self.script_dir.join(format!("{method}.sh"));
        if !script.is_file() {
            return Err(Error::ScriptNotFound(script));
        }

        let mut command = ChildCommand::new_shell(&script)
            .with_args(
                request
                    .in_args
                    .iter()
                    .map(|v| codec::to_text(v).unwrap_or_default()),
            )
            .with_working_dir(&self.script_dir);
        for (key, value) in &self.env {
            command = command.with_env(key, value);
        }
        debug!(token = %request.token, command = %command.to_shell_command(), "running script");

        let output = command.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{}: {}", method, stdout.trim());
        }
        let Some(code) = output.status.code() else {
            return Err(Error::ChildProcessFailed {
                helper: script,
                code: None,
            });
        };

        let return_value = match return_type {
            Some(ty) if ty.is_bool() => Some(Value::Bool(code == 0)),
            Some(ty) => Some(codec::parse(ty, Some(&code.to_string()))?),
            None if code != 0 => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Ok(DispatchResult::failed(format!(
                    "{} exited with code {code}: {}",
                    script.display(),
                    stderr.trim()
                )));
            }
            None => None,
        };

        Ok(DispatchResult::ok(return_value, Vec::new()))
    }
}

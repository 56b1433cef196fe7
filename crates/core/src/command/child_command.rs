use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// Interactive helper; inherits the console so a human can answer.
    Helper,
    /// Script run through `sh`; output is captured.
    Shell,
}

#[derive(Debug, Clone)]
pub struct ChildCommand {
    pub command_type: CommandType,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ChildCommand {
    pub fn new_helper(program: impl Into<PathBuf>) -> Self {
        Self {
            command_type: CommandType::Helper,
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn new_shell(script: &Path) -> Self {
        Self {
            command_type: CommandType::Shell,
            program: PathBuf::from("sh"),
            args: vec![script.display().to_string()],
            working_dir: None,
            env: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn to_shell_command(&self) -> String {
        let mut cmd = self.program.display().to_string();
        for arg in &self.args {
            cmd.push(' ');
            if arg.contains(' ') || arg.contains('"') {
                cmd.push_str(&format!("'{arg}'"));
            } else {
                cmd.push_str(arg);
            }
        }
        cmd
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.env {
            tracing::trace!("Setting env: {}={}", key, value);
            cmd.env(key, value);
        }

        cmd
    }

    /// Start the command without waiting for it.
    pub fn spawn(&self) -> io::Result<Child> {
        let mut cmd = self.build();
        match self.command_type {
            CommandType::Helper => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            CommandType::Shell => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
        }
        cmd.spawn()
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn output(&self) -> io::Result<Output> {
        let mut cmd = self.build();
        cmd.stdin(Stdio::null());
        cmd.output()
    }
}

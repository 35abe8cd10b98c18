//! External Tool Invocation
//!
//! Every interaction with `python`, `venv` and `pip` goes through a
//! [`CommandRunner`], which captures output and turns a nonzero exit
//! status into [`EnvError::ToolFailed`].

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, error};

use crate::error::EnvError;

/// A single external command: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub envs: Vec<(String, OsString)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Arguments as lossy UTF-8, mainly for matching in logs and tests.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands and waits for them to finish.
pub trait CommandRunner {
    /// Runs the command to completion and captures its output, whatever
    /// the exit status.
    fn output(&self, command: &ToolCommand) -> io::Result<ToolOutput>;

    /// Runs the command and fails unless it exits with status zero.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, EnvError> {
        debug!("Running: {}", command);

        let output = self.output(command).map_err(|source| EnvError::Spawn {
            command: command.to_string(),
            source,
        })?;

        if output.is_success() {
            return Ok(output);
        }

        error!(
            "`{}` failed with exit code: {:?}",
            command, output.code
        );
        if !output.stderr.trim().is_empty() {
            error!("stderr:\n{}", output.stderr);
        }
        if !output.stdout.trim().is_empty() {
            debug!("stdout:\n{}", output.stdout);
        }

        Err(EnvError::ToolFailed {
            command: command.to_string(),
            code: output.code,
            stderr: output.stderr,
        })
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn output(&self, command: &ToolCommand) -> io::Result<ToolOutput> {
        (**self).output(command)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, command: &ToolCommand) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        for (key, value) in &command.envs {
            cmd.env(key, value);
        }

        let output = cmd.output()?;
        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

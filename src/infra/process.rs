use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::command::{CommandOutput, CommandRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

impl ProcessCommand {
    pub fn new(program: &str, working_dir: &Path, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
            timeout,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `program arg1 arg2`, for logs and error messages
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed to run `{command}`: {message}")]
    Launch { command: String, message: String },

    #[error("mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion. A non-zero exit is reported in the output, not as an error.
    async fn run(&self, command: ProcessCommand) -> Result<CommandOutput, ProcessError>;
}

pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<CommandOutput, ProcessError> {
        tracing::debug!("Executing subprocess: {}", command.display());

        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        let output = CommandRunner::run_captured(
            &command.program,
            &args,
            &command.working_dir,
            command.timeout,
        )
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ProcessError::CommandNotFound(command.program.clone())
            } else {
                ProcessError::Launch {
                    command: command.display(),
                    message: e.to_string(),
                }
            }
        })?;

        if output.timed_out {
            return Err(ProcessError::Timeout {
                command: command.display(),
                timeout: command.timeout,
            });
        }

        Ok(output)
    }
}

//! Generated code execution
//!
//! Writes the code into a request-scoped scratch directory and runs it with
//! the configured interpreter under a wall-clock timeout.

use std::time::Duration;

use crate::config::ExecConfig;
use crate::domain::execution::{ExecutionError, ExecutionResult};
use crate::infra::command::{CommandOutput, CommandRunner};

/// Runs source text as a separate process
#[derive(Clone, Debug)]
pub struct Executor {
    interpreter: String,
    source_file: String,
    timeout: Duration,
}

impl Executor {
    pub fn new(interpreter: impl Into<String>, source_file: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            source_file: source_file.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExecConfig) -> Self {
        Self::new(&config.interpreter, &config.source_file, config.timeout)
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Execute `code`. Any exit code counts as a completed run; the caller
    /// decides what a non-zero exit means.
    pub async fn run(&self, code: &str) -> Result<ExecutionResult, ExecutionError> {
        let scratch = tempfile::Builder::new()
            .prefix("deploy-exec-")
            .tempdir()
            .map_err(|e| ExecutionError::LaunchFailed(format!("cannot create scratch dir: {}", e)))?;

        let script = scratch.path().join(&self.source_file);
        tokio::fs::write(&script, code)
            .await
            .map_err(|e| ExecutionError::LaunchFailed(format!("cannot write source file: {}", e)))?;

        let script_arg = script.to_string_lossy().into_owned();
        let output = CommandRunner::run_captured(
            &self.interpreter,
            &[script_arg.as_str()],
            scratch.path(),
            self.timeout,
        )
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ExecutionError::EnvironmentMissing(self.interpreter.clone())
            } else {
                ExecutionError::LaunchFailed(e.to_string())
            }
        })?;

        if output.timed_out {
            tracing::warn!(
                interpreter = %self.interpreter,
                timeout = ?self.timeout,
                "Generated code timed out"
            );
            return Err(ExecutionError::Timeout(self.timeout));
        }

        tracing::info!(
            interpreter = %self.interpreter,
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Generated code finished"
        );

        Ok(output.into())
    }
}

impl From<CommandOutput> for ExecutionResult {
    fn from(output: CommandOutput) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            timed_out: output.timed_out,
        }
    }
}

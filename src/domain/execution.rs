//! 代码执行结果模型

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const SUCCESS_PREFIX: &str = "Execution Successful:";
pub const RUNTIME_ERROR_PREFIX: &str = "Execution Failed (Runtime Error):";
pub const TIMEOUT_PREFIX: &str = "Execution Failed (Timeout):";
pub const FAILED_PREFIX: &str = "Execution Failed:";
pub const UNEXPECTED_PREFIX: &str = "An unexpected error occurred during execution:";

/// 一次执行的捕获结果，生成后不再修改
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// 被信号终止时为 None
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// 作为"输出"的文本：stdout 非空取 stdout，否则取 stderr
    pub fn output(&self) -> &str {
        if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    /// 将非零退出码转换为 `RuntimeFailure`
    pub fn check(self) -> Result<Self, ExecutionError> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(ExecutionError::RuntimeFailure {
                exit_code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// 执行失败分类
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("process exited with code {exit_code:?}")]
    RuntimeFailure {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("interpreter `{0}` not found")]
    EnvironmentMissing(String),

    #[error("failed to launch code: {0}")]
    LaunchFailed(String),
}

/// 渲染 Execute 接口的输出文本
///
/// 返回值总是以固定前缀之一开头
pub fn describe(outcome: &Result<ExecutionResult, ExecutionError>) -> String {
    match outcome {
        Ok(result) => format!("{}\n\n{}", SUCCESS_PREFIX, result.stdout),
        Err(ExecutionError::RuntimeFailure { stderr, .. }) => {
            format!("{}\n\n{}", RUNTIME_ERROR_PREFIX, stderr)
        }
        Err(ExecutionError::Timeout(_)) => {
            format!("{} The code took too long to run.", TIMEOUT_PREFIX)
        }
        Err(ExecutionError::EnvironmentMissing(program)) => {
            format!("{} Interpreter `{}` not found.", FAILED_PREFIX, program)
        }
        Err(ExecutionError::LaunchFailed(message)) => {
            format!("{} {}", UNEXPECTED_PREFIX, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str, stderr: &str, exit_code: i32) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
            timed_out: false,
        }
    }

    #[test]
    fn test_output_prefers_stdout() {
        assert_eq!(result("out", "err", 0).output(), "out");
        assert_eq!(result("", "err", 1).output(), "err");
        assert_eq!(result("", "", 0).output(), "");
    }

    #[test]
    fn test_check_maps_nonzero_exit() {
        assert!(result("hi\n", "", 0).check().is_ok());
        match result("", "Traceback", 1).check() {
            Err(ExecutionError::RuntimeFailure { exit_code, stderr }) => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, "Traceback");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_describe_prefixes() {
        assert_eq!(
            describe(&Ok(result("hi\n", "", 0))),
            "Execution Successful:\n\nhi\n"
        );
        assert_eq!(
            describe(&Err(ExecutionError::Timeout(Duration::from_secs(10)))),
            "Execution Failed (Timeout): The code took too long to run."
        );
        assert!(describe(&Err(ExecutionError::RuntimeFailure {
            exit_code: Some(1),
            stderr: "boom".to_string(),
        }))
        .starts_with(RUNTIME_ERROR_PREFIX));
        assert!(describe(&Err(ExecutionError::EnvironmentMissing("python".to_string())))
            .starts_with(FAILED_PREFIX));
        assert!(describe(&Err(ExecutionError::LaunchFailed("denied".to_string())))
            .starts_with("An unexpected error"));
    }
}

//! 基础设施模块
//!
//! 封装外部依赖（子进程执行、git CLI）

pub mod command;
pub mod git;
#[cfg(test)]
pub mod mock;
pub mod process;

pub use command::{CommandOutput, CommandRunner};
pub use git::GitCli;
pub use process::{ProcessCommand, ProcessError, ProcessRunner, TokioProcessRunner};

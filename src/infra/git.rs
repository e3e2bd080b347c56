//! git 命令封装
//!
//! 每个方法对应一次 git 调用，返回原始输出，由调用方分类

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::command::CommandOutput;
use super::process::{ProcessCommand, ProcessError, ProcessRunner};

/// git CLI 客户端
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn ProcessRunner>,
    work_dir: PathBuf,
    /// 本地操作超时
    local_timeout: Duration,
}

impl GitCli {
    pub fn new(runner: Arc<dyn ProcessRunner>, work_dir: &Path, local_timeout: Duration) -> Self {
        Self {
            runner,
            work_dir: work_dir.to_path_buf(),
            local_timeout,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    async fn git(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, ProcessError> {
        let command = ProcessCommand::new("git", &self.work_dir, timeout).args(args.iter().copied());
        self.runner.run(command).await
    }

    /// `git rev-parse --git-dir`，成功表示已在版本控制下
    pub async fn rev_parse_git_dir(&self) -> Result<CommandOutput, ProcessError> {
        self.git(&["rev-parse", "--git-dir"], self.local_timeout).await
    }

    pub async fn init(&self) -> Result<CommandOutput, ProcessError> {
        self.git(&["init"], self.local_timeout).await
    }

    pub async fn remote_get_url(&self, remote: &str) -> Result<CommandOutput, ProcessError> {
        self.git(&["remote", "get-url", remote], self.local_timeout).await
    }

    pub async fn add(&self, pathspec: &str) -> Result<CommandOutput, ProcessError> {
        self.git(&["add", pathspec], self.local_timeout).await
    }

    pub async fn commit(&self, message: &str) -> Result<CommandOutput, ProcessError> {
        self.git(&["commit", "-m", message], self.local_timeout).await
    }

    /// 推送当前分支到远端的目标分支
    pub async fn push(
        &self,
        remote: &str,
        branch: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, ProcessError> {
        let refspec = format!("HEAD:{}", branch);
        self.git(&["push", remote, &refspec], timeout).await
    }
}

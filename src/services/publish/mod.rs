//! Git publish orchestration
//!
//! Drives the git CLI through repository check, optional init, remote check,
//! staging, commit and push. Each step is run and reported on its own so
//! the caller can tell a missing remote from a rejected or unauthorized push.

pub mod classify;
pub mod machine;

use std::path::Path;
use std::sync::Arc;

use crate::config::env::constants::COMMIT_MESSAGE;
use crate::config::EnvConfig;
use crate::domain::deploy::DeploymentLog;
use crate::infra::git::GitCli;
use crate::infra::process::ProcessRunner;

pub use classify::{CommitOutcome, PushFailureKind, RemoteUrl};
pub use machine::{PublishError, PublishOutcome, PublishStep, PublishTarget, StepResult, Transition};

#[derive(Clone)]
pub struct PublishOrchestrator {
    git: GitCli,
    target: PublishTarget,
}

impl PublishOrchestrator {
    pub fn new(git: GitCli, target: PublishTarget) -> Self {
        Self { git, target }
    }

    pub fn from_config(config: &EnvConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let git = GitCli::new(runner, &config.repo_dir, config.git.local_timeout);
        let target = PublishTarget {
            remote: config.git.remote.clone(),
            branch: config.git.branch.clone(),
            publish_dir: config.publish_dir.trim_matches('/').to_string(),
            push_timeout: config.git.push_timeout,
        };
        Self::new(git, target)
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    pub fn work_dir(&self) -> &Path {
        self.git.work_dir()
    }

    /// Run the machine from `CheckRepo` to a terminal outcome
    pub async fn publish(&self, auto_push: bool, log: &mut DeploymentLog) -> PublishOutcome {
        log.push("🔄 Starting automated Git deployment...");

        let mut step = PublishStep::CheckRepo;
        loop {
            let result = self.run_step(step).await;
            tracing::debug!(
                step = ?step,
                success = result.as_ref().map(|o| o.success()).unwrap_or(false),
                "Publish step finished"
            );

            match machine::transition(step, &result, &self.target, auto_push, log) {
                Transition::Next(next) => step = next,
                Transition::Finish(outcome) => {
                    tracing::info!(outcome = ?outcome, "Publish finished");
                    return outcome;
                }
            }
        }
    }

    async fn run_step(&self, step: PublishStep) -> StepResult {
        match step {
            PublishStep::CheckRepo => self.git.rev_parse_git_dir().await,
            PublishStep::InitRepo => self.git.init().await,
            PublishStep::CheckRemote | PublishStep::ResolvePagesUrl => {
                self.git.remote_get_url(&self.target.remote).await
            }
            PublishStep::StageFiles => {
                let pathspec = format!("{}/", self.target.publish_dir);
                self.git.add(&pathspec).await
            }
            PublishStep::Commit => self.git.commit(COMMIT_MESSAGE).await,
            PublishStep::Push => {
                self.git
                    .push(&self.target.remote, &self.target.branch, self.target.push_timeout)
                    .await
            }
        }
    }
}

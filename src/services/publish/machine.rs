//! Publish state machine
//!
//! Pure transition function over the git steps of one publish attempt. The
//! driver in `mod.rs` runs the command for the current step and feeds the
//! captured result back in here; nothing in this file touches a process.

use std::time::Duration;
use thiserror::Error;

use crate::domain::deploy::DeploymentLog;
use crate::infra::command::CommandOutput;
use crate::infra::process::ProcessError;

use super::classify::{classify_commit, classify_push_failure, CommitOutcome, PushFailureKind, RemoteUrl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishStep {
    CheckRepo,
    InitRepo,
    CheckRemote,
    StageFiles,
    Commit,
    Push,
    ResolvePagesUrl,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("git executable not found")]
    GitUnavailable,

    #[error("not a git repository and `git init` failed: {0}")]
    NotARepoAndInitFailed(String),

    #[error("git remote `{0}` is not configured")]
    RemoteMissing(String),

    #[error("push rejected by remote: {0}")]
    PushRejected(String),

    #[error("push authentication failed: {0}")]
    PushAuthFailure(String),

    #[error("push timed out after {0:?}")]
    PushTimeout(Duration),

    #[error("push failed: {0}")]
    PushFailedOther(String),

    #[error("{0}")]
    Process(ProcessError),
}

impl PublishError {
    /// Files were written (and possibly committed) locally; the user can finish by hand.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            PublishError::RemoteMissing(_)
                | PublishError::PushRejected(_)
                | PublishError::PushAuthFailure(_)
                | PublishError::PushTimeout(_)
                | PublishError::PushFailedOther(_)
        )
    }

    pub fn is_push_failure(&self) -> bool {
        self.is_partial() && !matches!(self, PublishError::RemoteMissing(_))
    }
}

/// Terminal state of the publish machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { pages_url: Option<String> },
    /// Committed locally; `autoPush` was off
    ManualPushPending,
    Halted(PublishError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(PublishStep),
    Finish(PublishOutcome),
}

/// Fixed parameters of the publish target
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub remote: String,
    pub branch: String,
    pub publish_dir: String,
    pub push_timeout: Duration,
}

pub type StepResult = Result<CommandOutput, ProcessError>;

pub fn transition(
    step: PublishStep,
    result: &StepResult,
    target: &PublishTarget,
    auto_push: bool,
    log: &mut DeploymentLog,
) -> Transition {
    match step {
        PublishStep::CheckRepo => match result {
            // an existing repository is assumed to carry its remote already
            Ok(out) if out.success() => Transition::Next(PublishStep::StageFiles),
            Ok(_) => Transition::Next(PublishStep::InitRepo),
            Err(e) => halt_on_process_error(e, log),
        },

        PublishStep::InitRepo => match result {
            Ok(out) if out.success() => {
                log.push("✅ Initialized Git repository");
                Transition::Next(PublishStep::CheckRemote)
            }
            Ok(out) => {
                let err = PublishError::NotARepoAndInitFailed(out.combined().trim().to_string());
                log.push(format!("❌ Error: {}", err));
                Transition::Finish(PublishOutcome::Halted(err))
            }
            Err(e) => halt_on_process_error(e, log),
        },

        PublishStep::CheckRemote => match result {
            Ok(out) if out.success() && !out.stdout.trim().is_empty() => {
                Transition::Next(PublishStep::StageFiles)
            }
            Ok(_) => {
                log.push(format!("⚠️ Git remote '{}' not configured", target.remote));
                Transition::Finish(PublishOutcome::Halted(PublishError::RemoteMissing(
                    target.remote.clone(),
                )))
            }
            Err(e) => halt_on_process_error(e, log),
        },

        PublishStep::StageFiles => {
            match result {
                Ok(out) if out.success() => log.push("✅ Added files to Git"),
                Ok(out) => log.push(format!("⚠️ Staging warning: {}", out.stderr.trim())),
                Err(e) => log.push(format!("⚠️ Staging warning: {}", e)),
            }
            // the commit step reports whatever made staging fail
            Transition::Next(PublishStep::Commit)
        }

        PublishStep::Commit => {
            match result {
                Ok(out) => match classify_commit(out) {
                    CommitOutcome::Committed => log.push("✅ Committed changes"),
                    CommitOutcome::NothingToCommit => log.push("ℹ️ No changes to commit"),
                    CommitOutcome::Failed => {
                        log.push(format!("⚠️ Commit warning: {}", out.combined().trim()))
                    }
                },
                Err(e) => log.push(format!("⚠️ Commit warning: {}", e)),
            }
            if auto_push {
                Transition::Next(PublishStep::Push)
            } else {
                Transition::Finish(PublishOutcome::ManualPushPending)
            }
        }

        PublishStep::Push => match result {
            Ok(out) if out.success() => {
                log.push(format!(
                    "✅ Pushed to {}/{} successfully!",
                    target.remote, target.branch
                ));
                log.push("🎉 DEPLOYMENT COMPLETE!");
                Transition::Next(PublishStep::ResolvePagesUrl)
            }
            Ok(out) => {
                let text = out.stderr.trim().to_string();
                log.push(format!("❌ Push failed: {}", text));
                let err = match classify_push_failure(&text) {
                    PushFailureKind::Rejected => PublishError::PushRejected(text),
                    PushFailureKind::Authentication => PublishError::PushAuthFailure(text),
                    PushFailureKind::Other => PublishError::PushFailedOther(text),
                };
                if let Some(tip) = push_tip(&err, target) {
                    log.push(tip);
                }
                Transition::Finish(PublishOutcome::Halted(err))
            }
            Err(ProcessError::Timeout { .. }) => {
                let err = PublishError::PushTimeout(target.push_timeout);
                log.push("❌ Operation timed out");
                Transition::Finish(PublishOutcome::Halted(err))
            }
            Err(e) => {
                log.push(format!("❌ Push failed: {}", e));
                Transition::Finish(PublishOutcome::Halted(PublishError::PushFailedOther(
                    e.to_string(),
                )))
            }
        },

        PublishStep::ResolvePagesUrl => {
            let pages_url = match result {
                Ok(out) if out.success() => {
                    RemoteUrl::parse(&out.stdout).and_then(|remote| remote.pages_url())
                }
                _ => None,
            };
            if let Some(ref url) = pages_url {
                log.push(format!("🌐 Your site will be live at: {}", url));
                log.push("⚠️ Note: First deployment may take 1-2 minutes");
                log.push("⚠️ Make sure GitHub Pages is enabled in repo settings!");
            }
            Transition::Finish(PublishOutcome::Published { pages_url })
        }
    }
}

fn halt_on_process_error(error: &ProcessError, log: &mut DeploymentLog) -> Transition {
    let err = match error {
        ProcessError::CommandNotFound(_) => PublishError::GitUnavailable,
        other => PublishError::Process(other.clone()),
    };
    log.push(format!("❌ Error: {}", err));
    Transition::Finish(PublishOutcome::Halted(err))
}

fn push_tip(error: &PublishError, target: &PublishTarget) -> Option<String> {
    match error {
        PublishError::PushRejected(_) => Some(format!(
            "💡 Tip: Try running 'git pull --rebase {} {}' first",
            target.remote, target.branch
        )),
        PublishError::PushAuthFailure(_) => {
            Some("💡 Tip: Check your Git credentials or use SSH keys".to_string())
        }
        _ => None,
    }
}

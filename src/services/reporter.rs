//! Deployment status reporting
//!
//! Folds the log and the terminal state of a pipeline run into the
//! `DeploymentResult` returned to the caller.

use crate::domain::deploy::{DeploymentLog, DeploymentResult, DeploymentStatus};

use super::pipeline::PipelineError;
use super::publish::{PublishError, PublishOutcome, PublishTarget};

/// Where a pipeline run stopped
#[derive(Debug)]
pub enum Terminal {
    Publish(PublishOutcome),
    Failed(PipelineError),
}

pub fn report(log: DeploymentLog, terminal: Terminal, target: &PublishTarget) -> DeploymentResult {
    match terminal {
        Terminal::Publish(PublishOutcome::Published { .. }) => DeploymentResult::new(
            DeploymentStatus::Success,
            "Automatically deployed to GitHub Pages!",
            log,
        ),
        Terminal::Publish(PublishOutcome::ManualPushPending) => DeploymentResult::new(
            DeploymentStatus::Success,
            "Files created successfully",
            log,
        )
        .with_instructions(manual_instructions(target)),
        Terminal::Publish(PublishOutcome::Halted(err)) => halted(log, err, target),
        Terminal::Failed(err) => {
            let message = match err {
                PipelineError::Execution(crate::domain::ExecutionError::Timeout(_)) => {
                    "Deployment timed out".to_string()
                }
                PipelineError::Validation(ref v) => v.to_string(),
                ref other => format!("Deployment failed: {}", other),
            };
            let result = DeploymentResult::new(DeploymentStatus::Error, message, log);
            match err {
                PipelineError::Validation(_) => result,
                other => result.with_error(other.to_string()),
            }
        }
    }
}

fn halted(log: DeploymentLog, err: PublishError, target: &PublishTarget) -> DeploymentResult {
    if let PublishError::RemoteMissing(_) = err {
        return DeploymentResult::new(
            DeploymentStatus::Partial,
            "Files created but Git remote not configured",
            log,
        )
        .with_instructions(remote_instructions(target));
    }

    if err.is_push_failure() {
        let raw = match &err {
            PublishError::PushRejected(text)
            | PublishError::PushAuthFailure(text)
            | PublishError::PushFailedOther(text) => text.clone(),
            other => other.to_string(),
        };
        return DeploymentResult::new(
            DeploymentStatus::Partial,
            "Files created and committed, but push failed",
            log,
        )
        .with_error(raw);
    }

    DeploymentResult::new(
        DeploymentStatus::Error,
        format!("Deployment failed: {}", err),
        log,
    )
    .with_error(err.to_string())
}

fn remote_instructions(target: &PublishTarget) -> String {
    format!(
        "
⚠️ Git remote not configured!

Please run these commands:
1. git remote add {} https://github.com/[username]/[repo-name].git
2. Then try deploying again for automatic push
",
        target.remote
    )
}

fn manual_instructions(target: &PublishTarget) -> String {
    format!(
        "
Manual deployment steps:
1. git add {dir}/
2. git commit -m \"Deploy to GitHub Pages\"
3. git push {remote} HEAD:{branch}
",
        dir = target.publish_dir,
        remote = target.remote,
        branch = target.branch
    )
}

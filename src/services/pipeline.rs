//! Deployment pipeline
//!
//! validate → execute → render → materialize → publish → report.
//! Every run ends in a `DeploymentResult`; no stage error escapes.

use std::sync::Arc;
use thiserror::Error;

use crate::config::EnvConfig;
use crate::domain::deploy::{DeploymentLog, DeploymentRequest, DeploymentResult};
use crate::domain::execution::ExecutionError;
use crate::infra::process::ProcessRunner;

use super::executor::Executor;
use super::publish::PublishOrchestrator;
use super::render::RenderedArtifact;
use super::reporter::{report, Terminal};
use super::site::{MaterializationError, SiteMaterializer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No code provided for deployment.")]
    EmptyCode,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Execution(#[from] ExecutionError),

    #[error("{0}")]
    Materialization(#[from] MaterializationError),
}

/// Reject a request before anything touches the host
pub fn validate(request: &DeploymentRequest) -> Result<(), ValidationError> {
    if request.code.is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    Ok(())
}

#[derive(Clone)]
pub struct DeployPipeline {
    executor: Executor,
    materializer: SiteMaterializer,
    publisher: PublishOrchestrator,
}

impl DeployPipeline {
    pub fn new(executor: Executor, materializer: SiteMaterializer, publisher: PublishOrchestrator) -> Self {
        Self {
            executor,
            materializer,
            publisher,
        }
    }

    pub fn from_config(config: &EnvConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        let executor = Executor::from_config(&config.exec);
        let materializer =
            SiteMaterializer::new(&config.repo_dir, &config.publish_dir, &config.exec.source_file);
        let publisher = PublishOrchestrator::from_config(config, runner);
        Self::new(executor, materializer, publisher)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run one deployment attempt. The caller is responsible for making sure
    /// only one attempt is in flight per working tree.
    pub async fn run(&self, request: &DeploymentRequest) -> DeploymentResult {
        let mut log = DeploymentLog::new();
        let mut site_note = None;
        let terminal = match self.stages(request, &mut log, &mut site_note).await {
            Ok(terminal) => terminal,
            Err(e) => {
                match &e {
                    PipelineError::Validation(_) => {}
                    PipelineError::Execution(ExecutionError::Timeout(_)) => {
                        log.push("❌ Operation timed out")
                    }
                    other => log.push(format!("❌ Error: {}", other)),
                }
                tracing::warn!(error = %e, "Deployment stopped early");
                Terminal::Failed(e)
            }
        };

        let result = report(log, terminal, self.publisher.target());
        match site_note {
            Some(note) if result.error.is_none() => result.with_error(note),
            _ => result,
        }
    }

    async fn stages(
        &self,
        request: &DeploymentRequest,
        log: &mut DeploymentLog,
        site_note: &mut Option<String>,
    ) -> Result<Terminal, PipelineError> {
        validate(request)?;

        let execution = self.executor.run(&request.code).await?;
        match execution.exit_code {
            Some(code) => log.push(format!("✅ Executed generated code (exit code {})", code)),
            None => log.push("✅ Executed generated code (terminated by signal)"),
        }

        let artifact =
            RenderedArtifact::from_execution(&request.code, &execution, self.executor.source_file());
        let materialized = self.materializer.materialize(&artifact, log).await?;
        if !materialized.is_complete() {
            tracing::warn!(
                failed = materialized.failed.len(),
                "Publishing with an incomplete site"
            );
            let note = incomplete_site_note(&materialized.failed);
            log.push(format!("⚠️ {}", note));
            *site_note = Some(note);
        }

        let outcome = self.publisher.publish(request.auto_push, log).await;
        Ok(Terminal::Publish(outcome))
    }
}

/// The published site is missing files; the rest still gets committed
fn incomplete_site_note(failed: &[MaterializationError]) -> String {
    let files: Vec<&str> = failed
        .iter()
        .map(|err| match err {
            MaterializationError::WriteFailed { file, .. } => file.as_str(),
            _ => "publish directory",
        })
        .collect();
    format!(
        "Site incomplete: {} file(s) failed to write ({})",
        files.len(),
        files.join(", ")
    )
}

//! Site materialization
//!
//! Writes the source file, the entry point page and the readme into the
//! publish directory. Files are first written into a request-scoped staging
//! directory next to the publish directory and then moved into place one by
//! one, so a failed write never leaves a truncated file behind.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::env::constants::{ENTRY_POINT_FILE, MANIFEST_FILE};
use crate::domain::deploy::DeploymentLog;

use super::render::{DocumentKind, RenderedArtifact};

#[derive(Debug, Error)]
pub enum MaterializationError {
    /// Fatal: nothing can be written
    #[error("cannot create publish directory {path}: {message}")]
    DirectoryCreateFailed { path: String, message: String },

    /// Non-fatal: recorded and the remaining files are still written
    #[error("failed to write {file}: {message}")]
    WriteFailed { file: String, message: String },
}

/// Which files made it into the publish directory
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub written: Vec<String>,
    pub failed: Vec<MaterializationError>,
}

impl MaterializeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct SiteMaterializer {
    repo_dir: PathBuf,
    publish_dir: String,
    source_file: String,
}

impl SiteMaterializer {
    pub fn new(repo_dir: &Path, publish_dir: &str, source_file: &str) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            publish_dir: publish_dir.trim_matches('/').to_string(),
            source_file: source_file.to_string(),
        }
    }

    pub fn publish_path(&self) -> PathBuf {
        self.repo_dir.join(&self.publish_dir)
    }

    pub async fn materialize(
        &self,
        artifact: &RenderedArtifact,
        log: &mut DeploymentLog,
    ) -> Result<MaterializeReport, MaterializationError> {
        let target = self.publish_path();
        let dir_error = |e: std::io::Error| MaterializationError::DirectoryCreateFailed {
            path: target.display().to_string(),
            message: e.to_string(),
        };

        tokio::fs::create_dir_all(&target).await.map_err(dir_error)?;
        log.push(format!("✅ Created /{} directory", self.publish_dir));

        let staging_parent = target.parent().unwrap_or(self.repo_dir.as_path()).to_path_buf();
        let staging = tempfile::Builder::new()
            .prefix(".deploy-staging-")
            .tempdir_in(&staging_parent)
            .map_err(dir_error)?;

        let page_entry = match artifact.kind {
            DocumentKind::Markup => "✅ Generated HTML page",
            DocumentKind::PlainText => "✅ Created HTML wrapper",
        };
        let files = [
            (self.source_file.as_str(), artifact.source.as_str(), "✅ Saved source code"),
            (ENTRY_POINT_FILE, artifact.document.as_str(), page_entry),
            (MANIFEST_FILE, artifact.manifest.as_str(), "✅ Created README.md"),
        ];

        let mut report = MaterializeReport::default();
        for (file, contents, entry) in files {
            match promote(staging.path(), &target, file, contents).await {
                Ok(()) => {
                    log.push(entry);
                    report.written.push(file.to_string());
                }
                Err(e) => {
                    tracing::warn!(file = %file, error = %e, "Failed to write site file");
                    let err = MaterializationError::WriteFailed {
                        file: file.to_string(),
                        message: e.to_string(),
                    };
                    log.push(format!("⚠️ {}", err));
                    report.failed.push(err);
                }
            }
        }

        tracing::info!(
            publish_dir = %target.display(),
            written = report.written.len(),
            failed = report.failed.len(),
            "Site materialized"
        );

        Ok(report)
    }
}

/// Write into staging, then move into the publish directory
async fn promote(staging: &Path, target: &Path, file: &str, contents: &str) -> std::io::Result<()> {
    let staged = staging.join(file);
    tokio::fs::write(&staged, contents.as_bytes()).await?;
    tokio::fs::rename(&staged, target.join(file)).await
}

//! 健康检查 API
//!
//! 包含 /health, /status 端点

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::VERSION;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    started_at: String,
    /// 是否有部署持有部署锁
    deploying: bool,
    /// 进行中和排队中的部署数量
    active_deploys: usize,
    publish_dir: String,
    remote: String,
    branch: String,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(health_check))
}

/// 健康检查 - 返回状态、版本、运行时间等信息
///
/// GET /health, GET /status
/// 无需认证
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "pages-deploy-agent",
        version: VERSION,
        timestamp: chrono::Utc::now().to_rfc3339(),
        started_at: state.started_at.to_rfc3339(),
        deploying: state.is_deploying(),
        active_deploys: state.deployments.active_count().await,
        publish_dir: state.config.publish_dir.clone(),
        remote: state.config.git.remote.clone(),
        branch: state.config.git.branch.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;

    #[tokio::test]
    async fn test_health_reports_idle_agent() {
        let dir = tempfile::tempdir().unwrap();
        let state = Arc::new(AppState::new(EnvConfig::for_repo(dir.path())));

        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.status, "ok");
        assert!(!health.deploying);
        assert_eq!(health.active_deploys, 0);
        assert_eq!(health.publish_dir, "docs");
        assert_eq!(health.remote, "origin");
    }
}

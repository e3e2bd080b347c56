//! 部署管理 API
//!
//! 包含 /publish, /deployments/* 端点

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::env::constants::MAX_DEPLOY_HISTORY;
use crate::domain::deploy::{
    DeploymentLog, DeploymentRecord, DeploymentRequest, DeploymentResult, DeploymentStatus,
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireApiKey;
use crate::services::pipeline::validate;
use crate::state::AppState;

/// 发布响应：部署 ID + 部署结果
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    /// 校验失败的请求不会登记，因此没有 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub result: DeploymentResult,
}

/// 部署历史查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 返回数量限制，默认 20
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// 状态过滤 (running, success, partial, error)
    pub status: Option<String>,
}

fn default_limit() -> usize {
    20
}

/// 部署历史响应
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub deployments: Vec<DeploymentRecord>,
    pub total: usize,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/publish", post(publish))
        .route("/deployments/recent", get(get_recent_deployments))
        .route("/deployments/:id", get(get_deployment))
}

/// 发布生成的代码
///
/// POST /publish
/// 需要 API Key（如已配置）
///
/// 同一时间只运行一个部署，后到的请求等待部署锁。部署在独立任务中运行，
/// 客户端断开不会中断进行中的 git 操作
async fn publish(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeploymentRequest>,
) -> Json<PublishResponse> {
    if let Err(e) = validate(&request) {
        tracing::warn!(error = %e, "Rejected publish request");
        return Json(PublishResponse {
            id: None,
            result: DeploymentResult::new(DeploymentStatus::Error, e.to_string(), DeploymentLog::new()),
        });
    }

    let id = uuid::Uuid::new_v4().to_string();
    state
        .deployments
        .create(DeploymentRecord::new(id.clone(), request.auto_push))
        .await;

    if state.is_deploying() {
        tracing::info!(deploy_id = %id, "Waiting for the running deployment to finish");
    }

    let task_state = state.clone();
    let task_id = id.clone();
    let joined = tokio::spawn(async move {
        let _slot = task_state.acquire_deploy_slot().await;
        tracing::info!(deploy_id = %task_id, auto_push = request.auto_push, "Deployment started");

        let result = task_state.pipeline.run(&request).await;
        tracing::info!(
            deploy_id = %task_id,
            status = result.status.as_str(),
            log_entries = result.log.len(),
            "Deployment finished"
        );

        task_state.deployments.finish(&task_id, result.clone()).await;
        result
    })
    .await;

    // 任务 panic 时仍返回完整的部署结果
    let result = match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(deploy_id = %id, error = %e, "Deployment task aborted");
            let failed = DeploymentResult::new(
                DeploymentStatus::Error,
                format!("Deployment failed: {}", e),
                DeploymentLog::new(),
            )
            .with_error(e.to_string());
            state.deployments.finish(&id, failed.clone()).await;
            failed
        }
    };

    Json(PublishResponse {
        id: Some(id),
        result,
    })
}

/// 获取部署记录
///
/// GET /deployments/:id
/// 无需认证，进行中和已完成的部署都可以查到
async fn get_deployment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeploymentRecord>> {
    let record = state
        .deployments
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Deployment '{}'", id)))?;

    Ok(Json(record))
}

/// 获取最近的部署
///
/// GET /deployments/recent
/// 无需认证，进行中的部署排在前面
async fn get_recent_deployments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    if query.limit == 0 {
        return Err(ApiError::bad_request("limit must be positive"));
    }
    let limit = query.limit.min(MAX_DEPLOY_HISTORY);

    // 先过滤再截断，保证 limit 作用于匹配的记录
    let mut all = state.deployments.running().await;
    all.extend(state.deployments.recent(MAX_DEPLOY_HISTORY).await);

    let deployments: Vec<DeploymentRecord> = all
        .into_iter()
        .filter(|record| {
            query
                .status
                .as_ref()
                .map_or(true, |s| record.status.as_str() == s)
        })
        .take(limit)
        .collect();
    let total = deployments.len();

    Ok(Json(HistoryResponse { deployments, total }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::domain::deploy::RecordStatus;
    use crate::infra::{CommandOutput, ProcessCommand, ProcessError, ProcessRunner};

    fn sh_state(repo: &std::path::Path) -> Arc<AppState> {
        let mut config = EnvConfig::for_repo(repo);
        config.exec.interpreter = "sh".to_string();
        config.exec.source_file = "generated_code.sh".to_string();
        Arc::new(AppState::new(config))
    }

    async fn publish_code(state: &Arc<AppState>, code: &str) -> PublishResponse {
        let Json(response) = publish(
            RequireApiKey,
            State(state.clone()),
            Json(DeploymentRequest::new(code, true)),
        )
        .await;
        response
    }

    /// git 调用时 panic 的进程执行器
    struct PanickingRunner;

    #[async_trait::async_trait]
    impl ProcessRunner for PanickingRunner {
        async fn run(&self, _command: ProcessCommand) -> Result<CommandOutput, ProcessError> {
            panic!("git runner crashed");
        }
    }

    #[tokio::test]
    async fn test_panicking_deployment_still_returns_result() {
        let repo = tempfile::tempdir().unwrap();
        let mut config = EnvConfig::for_repo(repo.path());
        config.exec.interpreter = "sh".to_string();
        config.exec.source_file = "generated_code.sh".to_string();
        let state = Arc::new(AppState::with_runner(config, Arc::new(PanickingRunner)));

        let response = publish_code(&state, "echo hi").await;
        let id = response.id.clone().unwrap();
        assert_eq!(response.result.status, DeploymentStatus::Error);
        assert!(response.result.message.starts_with("Deployment failed:"));
        assert!(response.result.error.is_some());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["log"].is_array());

        // 记录已结束，部署锁已释放
        let Json(record) = get_deployment(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(record.status, RecordStatus::Error);
        assert!(!state.is_deploying());
    }

    #[tokio::test]
    async fn test_status_filter_applies_before_limit() {
        let repo = tempfile::tempdir().unwrap();
        let state = sh_state(repo.path());

        state.deployments.create(DeploymentRecord::new("older".to_string(), true)).await;
        state
            .deployments
            .finish(
                "older",
                DeploymentResult::new(DeploymentStatus::Partial, "push failed", DeploymentLog::new()),
            )
            .await;
        state.deployments.create(DeploymentRecord::new("newer".to_string(), true)).await;
        state
            .deployments
            .finish(
                "newer",
                DeploymentResult::new(DeploymentStatus::Success, "ok", DeploymentLog::new()),
            )
            .await;

        let Json(history) = get_recent_deployments(
            State(state),
            Query(HistoryQuery {
                limit: 1,
                status: Some("partial".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.deployments[0].id, "older");
    }

    #[tokio::test]
    async fn test_publish_empty_code_is_not_recorded() {
        let repo = tempfile::tempdir().unwrap();
        let state = sh_state(repo.path());

        let response = publish_code(&state, "").await;
        assert!(response.id.is_none());
        assert_eq!(response.result.status, DeploymentStatus::Error);
        assert!(response.result.log.is_empty());
        assert_eq!(state.deployments.history_count().await, 0);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["status"], "error");
        assert_eq!(json["log"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_publish_is_recorded_and_queryable() {
        let repo = tempfile::tempdir().unwrap();
        let state = sh_state(repo.path());

        // fresh directory without a remote ends partial
        let response = publish_code(&state, "echo hi").await;
        let id = response.id.clone().unwrap();
        assert_eq!(response.result.status, DeploymentStatus::Partial);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["status"], "partial");
        assert!(json["instructions"].as_str().unwrap().contains("add origin"));

        let Json(record) = get_deployment(State(state.clone()), Path(id.clone()))
            .await
            .unwrap();
        assert_eq!(record.status, RecordStatus::Partial);

        let Json(history) = get_recent_deployments(
            State(state.clone()),
            Query(HistoryQuery {
                limit: 10,
                status: Some("partial".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(history.total, 1);
        assert_eq!(history.deployments[0].id, id);
    }

    #[tokio::test]
    async fn test_concurrent_publishes_are_serialized() {
        let repo = tempfile::tempdir().unwrap();
        let state = sh_state(repo.path());

        let (a, b) = tokio::join!(
            publish_code(&state, "echo first"),
            publish_code(&state, "echo second")
        );

        // each attempt has a complete, uninterleaved log
        for response in [&a, &b] {
            let entries = response.result.log.entries();
            assert!(entries[0].starts_with("✅ Executed generated code"));
            assert_eq!(
                entries.iter().filter(|e| e.starts_with("✅ Executed")).count(),
                1
            );
        }
        assert_eq!(state.deployments.history_count().await, 2);
        assert!(!state.is_deploying());
    }

    #[tokio::test]
    async fn test_unknown_deployment_is_not_found() {
        let repo = tempfile::tempdir().unwrap();
        let state = sh_state(repo.path());

        let err = get_deployment(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_zero_limit_is_bad_request() {
        let repo = tempfile::tempdir().unwrap();
        let state = sh_state(repo.path());

        let err = get_recent_deployments(
            State(state),
            Query(HistoryQuery {
                limit: 0,
                status: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

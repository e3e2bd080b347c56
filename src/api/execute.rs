//! 代码执行 API
//!
//! POST /execute：运行一段代码并以带前缀的文本返回结果

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::execution::{describe, ExecutionResult};
use crate::middleware::RequireApiKey;
use crate::state::AppState;

const NO_CODE_MESSAGE: &str = "Error: No code provided for execution.";

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub output: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/execute", post(execute_code))
}

/// 执行代码
///
/// POST /execute
/// 需要 API Key（如已配置）。执行失败也返回 200，失败信息在 `output` 前缀中
async fn execute_code(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Json<ExecuteResponse> {
    if request.code.is_empty() {
        return Json(ExecuteResponse {
            output: NO_CODE_MESSAGE.to_string(),
        });
    }

    let outcome = state
        .pipeline
        .executor()
        .run(&request.code)
        .await
        .and_then(ExecutionResult::check);

    if let Err(ref e) = outcome {
        tracing::info!(error = %e, "Execution did not succeed");
    }

    Json(ExecuteResponse {
        output: describe(&outcome),
    })
}

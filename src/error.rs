//! 统一错误处理
//!
//! HTTP 边界上的 `ApiError`，实现 `IntoResponse` 输出 JSON 错误体。
//! 部署本身的失败不走这里：它们总是以完整的 `DeploymentResult` 返回，包括部署任务 panic。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 统一 API 错误类型
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401 - API Key 无效或缺失
    #[error("Unauthorized")]
    Unauthorized,
    /// 404 - 部署记录不存在
    #[error("Not found: {0}")]
    NotFound(String),
    /// 400 - 查询参数无效
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Unauthorized => {
                ErrorResponse::new("unauthorized", "Invalid or missing API key")
            }
            ApiError::NotFound(resource) => {
                ErrorResponse::new("not_found", format!("{} not found", resource))
            }
            ApiError::BadRequest(msg) => {
                ErrorResponse::new("bad_request", "Invalid query parameters").with_details(msg)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// 便捷类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_new() {
        let resp = ErrorResponse::new("test_error", "Test message");
        assert_eq!(resp.error, "test_error");
        assert_eq!(resp.message, "Test message");
        assert!(resp.details.is_none());
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::unauthorized(), StatusCode::UNAUTHORIZED),
            (ApiError::not_found("Deployment 'x'"), StatusCode::NOT_FOUND),
            (ApiError::bad_request("limit must be positive"), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_bad_request_carries_details() {
        let resp = ErrorResponse::new("bad_request", "Invalid query parameters")
            .with_details("limit must be positive");
        assert_eq!(resp.details.as_deref(), Some("limit must be positive"));
    }
}

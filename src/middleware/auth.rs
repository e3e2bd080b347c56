//! 发布与执行接口的 API Key 校验
//!
//! 配置了 `DEPLOY_AGENT_API_KEY` 时，`/execute` 与 `/publish` 要求请求携带相同的
//! `x-api-key`；未配置时所有请求放行。查询类接口不做校验。

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HeaderMap, request::Parts},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// 携带 API Key 的请求头
pub const API_KEY_HEADER: &str = "x-api-key";

/// 放在 handler 参数中即要求通过 API Key 校验
#[derive(Debug, Clone)]
pub struct RequireApiKey;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authorize(&parts.headers, state.api_key.as_deref())?;
        Ok(RequireApiKey)
    }
}

/// 请求头与配置的 key 比对
///
/// `expected` 为 `None` 表示未启用认证
pub fn authorize(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match headers.get(API_KEY_HEADER).map(|value| value.to_str()) {
        Some(Ok(provided)) if provided == expected => Ok(()),
        Some(_) => {
            tracing::warn!(header = API_KEY_HEADER, "Rejected request with a wrong API key");
            Err(ApiError::unauthorized())
        }
        None => {
            tracing::warn!(header = API_KEY_HEADER, "Rejected request without an API key");
            Err(ApiError::unauthorized())
        }
    }
}

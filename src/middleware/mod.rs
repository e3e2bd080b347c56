//! 中间件模块

pub mod auth;

pub use auth::{authorize, RequireApiKey, API_KEY_HEADER};

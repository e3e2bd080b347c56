//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod deploy;
pub mod execution;

pub use deploy::{
    DeploymentLog, DeploymentRecord, DeploymentRequest, DeploymentResult, DeploymentStatus,
    RecordStatus,
};
pub use execution::{ExecutionError, ExecutionResult};

//! 运行时状态模块
//!
//! 管理应用状态、部署锁和部署记录

pub mod app_state;
pub mod deploy_store;

pub use app_state::AppState;
pub use deploy_store::DeploymentStore;

//! 应用状态

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// 全局 shutdown token，用于优雅关闭 HTTP 服务
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN
        .get_or_init(CancellationToken::new)
        .clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

use crate::config::env::EnvConfig;
use crate::infra::process::{ProcessRunner, TokioProcessRunner};
use crate::services::pipeline::DeployPipeline;

use super::deploy_store::DeploymentStore;

/// 应用状态
pub struct AppState {
    // ========== 核心配置 ==========
    /// API 密钥（未配置时 publish 不做认证）
    pub api_key: Option<String>,
    /// 环境配置
    pub config: EnvConfig,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,

    // ========== 部署 ==========
    /// 部署流水线
    pub pipeline: DeployPipeline,
    /// 部署锁：同一工作区同时只允许一个部署
    deploy_lock: Mutex<()>,
    /// 部署记录
    pub deployments: DeploymentStore,
}

impl AppState {
    /// 使用真实子进程创建应用状态
    pub fn new(config: EnvConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioProcessRunner))
    }

    /// 使用指定的进程执行器创建应用状态
    pub fn with_runner(config: EnvConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        tracing::info!(
            auth_enabled = config.api_key.is_some(),
            port = config.port,
            repo_dir = %config.repo_dir.display(),
            publish_dir = %config.publish_dir,
            interpreter = %config.exec.interpreter,
            remote = %config.git.remote,
            branch = %config.git.branch,
            "Loaded configuration"
        );

        Self {
            api_key: config.api_key.clone(),
            started_at: Utc::now(),
            pipeline: DeployPipeline::from_config(&config, runner),
            deploy_lock: Mutex::new(()),
            deployments: DeploymentStore::new(),
            config,
        }
    }

    /// 获取部署锁，已有部署进行中时排队等待
    pub async fn acquire_deploy_slot(&self) -> MutexGuard<'_, ()> {
        self.deploy_lock.lock().await
    }

    /// 是否有部署正在进行
    pub fn is_deploying(&self) -> bool {
        self.deploy_lock.try_lock().is_err()
    }
}

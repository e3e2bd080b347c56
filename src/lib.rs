//! Pages Deploy Agent - 生成代码的执行与 GitHub Pages 发布代理
//!
//! 执行一段生成的代码，把输出渲染成静态页面写入发布目录，
//! 再通过 git 提交并推送到远端

pub mod error;
pub mod middleware;
pub mod infra;
pub mod domain;
pub mod config;
pub mod state;
pub mod api;
pub mod services;

use std::sync::Arc;

pub use config::{EnvConfig, RuntimeConfig};

use state::app_state::{get_shutdown_token, trigger_shutdown};
use state::AppState;

/// 加载环境配置、应用命令行覆盖并运行
pub async fn init_and_run_agent_with_config(runtime: RuntimeConfig) -> std::io::Result<()> {
    let config = EnvConfig::from_env().apply(&runtime);
    run_agent(config).await
}

/// 启动 HTTP 服务，直到收到 Ctrl+C 或 shutdown token 被触发
pub async fn run_agent(config: EnvConfig) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        version = config::env::constants::VERSION,
        "Pages deploy agent listening"
    );

    let shutdown = get_shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    trigger_shutdown();
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested");
                }
            }
        })
        .await
}

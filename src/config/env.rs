//! 环境变量配置加载

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use self::constants::{
    DEFAULT_BRANCH, DEFAULT_REMOTE, EXEC_TIMEOUT_SECS, GIT_TIMEOUT_SECS, PUSH_TIMEOUT_SECS,
};

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// API 密钥（为空时 publish 接口不做认证）
    pub api_key: Option<String>,
    /// 服务监听端口
    pub port: u16,
    /// git 工作目录
    pub repo_dir: PathBuf,
    /// 发布目录（相对 repo_dir）
    pub publish_dir: String,
    /// 执行配置
    pub exec: ExecConfig,
    /// git 发布配置
    pub git: GitConfig,
}

/// 代码执行配置
#[derive(Clone, Debug)]
pub struct ExecConfig {
    /// 解释器程序
    pub interpreter: String,
    /// 源文件名
    pub source_file: String,
    pub timeout: Duration,
}

/// git 发布配置
#[derive(Clone, Debug)]
pub struct GitConfig {
    pub remote: String,
    pub branch: String,
    /// 本地 git 操作超时
    pub local_timeout: Duration,
    /// push 超时
    pub push_timeout: Duration,
}

/// 命令行覆盖项
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub port_override: Option<u16>,
    pub repo_dir_override: Option<PathBuf>,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let api_key = env::var("DEPLOY_AGENT_API_KEY").ok().filter(|s| !s.is_empty());

        let port = parse_var("PORT").unwrap_or(5000);

        let repo_dir = env::var("REPO_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let publish_dir = env::var("PUBLISH_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| constants::DEFAULT_PUBLISH_DIR.to_string());

        // Interpreter - 支持旧名称兼容
        if env::var("INTERPRETER").is_err() && env::var("PYTHON_PATH").is_ok() {
            warn!("Deprecated environment variable PYTHON_PATH detected. Please use INTERPRETER");
        }
        let interpreter = load_with_fallback("INTERPRETER", "PYTHON_PATH")
            .unwrap_or_else(|| constants::DEFAULT_INTERPRETER.to_string());

        let exec = ExecConfig {
            interpreter,
            source_file: env::var("SOURCE_FILE")
                .unwrap_or_else(|_| constants::DEFAULT_SOURCE_FILE.to_string()),
            timeout: Duration::from_secs(parse_var("EXEC_TIMEOUT_SECS").unwrap_or(EXEC_TIMEOUT_SECS)),
        };

        let git = GitConfig {
            remote: env::var("GIT_REMOTE").unwrap_or_else(|_| DEFAULT_REMOTE.to_string()),
            branch: env::var("GIT_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string()),
            local_timeout: Duration::from_secs(
                parse_var("GIT_TIMEOUT_SECS").unwrap_or(GIT_TIMEOUT_SECS),
            ),
            push_timeout: Duration::from_secs(
                parse_var("PUSH_TIMEOUT_SECS").unwrap_or(PUSH_TIMEOUT_SECS),
            ),
        };

        Self {
            api_key,
            port,
            repo_dir,
            publish_dir,
            exec,
            git,
        }
    }

    /// 以给定目录为工作区的默认配置（不读取环境变量）
    pub fn for_repo(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: None,
            port: 5000,
            repo_dir: repo_dir.into(),
            publish_dir: constants::DEFAULT_PUBLISH_DIR.to_string(),
            exec: ExecConfig {
                interpreter: constants::DEFAULT_INTERPRETER.to_string(),
                source_file: constants::DEFAULT_SOURCE_FILE.to_string(),
                timeout: Duration::from_secs(EXEC_TIMEOUT_SECS),
            },
            git: GitConfig {
                remote: DEFAULT_REMOTE.to_string(),
                branch: DEFAULT_BRANCH.to_string(),
                local_timeout: Duration::from_secs(GIT_TIMEOUT_SECS),
                push_timeout: Duration::from_secs(PUSH_TIMEOUT_SECS),
            },
        }
    }

    /// 应用命令行覆盖
    pub fn apply(mut self, runtime: &RuntimeConfig) -> Self {
        if let Some(port) = runtime.port_override {
            self.port = port;
        }
        if let Some(ref dir) = runtime.repo_dir_override {
            self.repo_dir = dir.clone();
        }
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// 加载环境变量，支持 fallback
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).ok().or_else(|| env::var(fallback).ok())
}

/// 常量
pub mod constants {
    /// 代码执行超时（秒）
    pub const EXEC_TIMEOUT_SECS: u64 = 10;

    /// push 超时（秒），网络延迟为主
    pub const PUSH_TIMEOUT_SECS: u64 = 30;

    /// 本地 git 操作超时（秒）
    pub const GIT_TIMEOUT_SECS: u64 = 15;

    /// 部署历史最大保存数量
    pub const MAX_DEPLOY_HISTORY: usize = 50;

    pub const DEFAULT_PUBLISH_DIR: &str = "docs";
    pub const DEFAULT_INTERPRETER: &str = "python";
    pub const DEFAULT_SOURCE_FILE: &str = "generated_code.py";
    pub const DEFAULT_REMOTE: &str = "origin";
    pub const DEFAULT_BRANCH: &str = "main";

    /// 入口文件名
    pub const ENTRY_POINT_FILE: &str = "index.html";

    /// 说明文件名
    pub const MANIFEST_FILE: &str = "README.md";

    /// 自动提交信息
    pub const COMMIT_MESSAGE: &str = "Auto-deploy: Generated code to GitHub Pages";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

//! 部署相关领域模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 发布请求
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentRequest {
    /// 生成的源代码
    #[serde(default)]
    pub code: String,
    /// 是否自动 push 到远端（默认 true）
    #[serde(rename = "autoPush", alias = "auto_push", default = "default_auto_push")]
    pub auto_push: bool,
}

fn default_auto_push() -> bool {
    true
}

impl DeploymentRequest {
    pub fn new(code: impl Into<String>, auto_push: bool) -> Self {
        Self {
            code: code.into(),
            auto_push,
        }
    }
}

/// 部署结果状态
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// 文件已生成并已推送（或按要求停在手动发布）
    Success,
    /// 文件已生成，但发布没有完成
    Partial,
    /// 没有任何持久进展
    Error,
}

impl DeploymentStatus {
    /// 转换为字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Success => "success",
            DeploymentStatus::Partial => "partial",
            DeploymentStatus::Error => "error",
        }
    }
}

/// 部署日志
///
/// 只追加，顺序即执行顺序；不去重、不重排
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DeploymentLog {
    entries: Vec<String>,
}

impl DeploymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条日志
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否有任意一条日志包含给定片段
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }
}

/// 一次部署尝试对外可见的唯一结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub status: DeploymentStatus,
    pub message: String,
    pub log: DeploymentLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentResult {
    pub fn new(status: DeploymentStatus, message: impl Into<String>, log: DeploymentLog) -> Self {
        Self {
            status,
            message: message.into(),
            log,
            instructions: None,
            error: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// 历史记录中的部署状态
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Running,
    Success,
    Partial,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Running => "running",
            RecordStatus::Success => "success",
            RecordStatus::Partial => "partial",
            RecordStatus::Error => "error",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecordStatus::Running)
    }
}

impl From<DeploymentStatus> for RecordStatus {
    fn from(status: DeploymentStatus) -> Self {
        match status {
            DeploymentStatus::Success => RecordStatus::Success,
            DeploymentStatus::Partial => RecordStatus::Partial,
            DeploymentStatus::Error => RecordStatus::Error,
        }
    }
}

/// 部署历史记录
#[derive(Clone, Debug, Serialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub status: RecordStatus,
    pub auto_push: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DeploymentResult>,
}

impl DeploymentRecord {
    /// 创建运行中的记录
    pub fn new(id: String, auto_push: bool) -> Self {
        Self {
            id,
            status: RecordStatus::Running,
            auto_push,
            started_at: Utc::now(),
            finished_at: None,
            result: None,
        }
    }

    /// 记录完成
    pub fn complete(&mut self, result: DeploymentResult) {
        self.status = result.status.into();
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }
}

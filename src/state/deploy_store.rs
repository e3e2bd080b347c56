//! 部署记录存储
//!
//! 保存进行中的部署与最近的历史记录

use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::config::env::constants::MAX_DEPLOY_HISTORY;
use crate::domain::deploy::{DeploymentRecord, DeploymentResult};

/// 部署记录存储
pub struct DeploymentStore {
    /// 进行中的部署
    active: RwLock<HashMap<String, DeploymentRecord>>,
    /// 历史记录（最新的在前）
    history: RwLock<VecDeque<DeploymentRecord>>,
    /// 最大历史记录数
    max_history: usize,
}

impl DeploymentStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DEPLOY_HISTORY)
    }

    /// 使用自定义历史容量创建
    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            active: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::new()),
            max_history,
        }
    }

    /// 登记一次新的部署
    pub async fn create(&self, record: DeploymentRecord) -> String {
        let id = record.id.clone();
        let mut active = self.active.write().await;
        active.insert(id.clone(), record);
        id
    }

    /// 完成部署并移入历史记录
    pub async fn finish(&self, id: &str, result: DeploymentResult) {
        let record = {
            let mut active = self.active.write().await;
            active.remove(id).map(|mut record| {
                record.complete(result);
                record
            })
        };

        if let Some(record) = record {
            let mut history = self.history.write().await;
            history.push_front(record);
            while history.len() > self.max_history {
                history.pop_back();
            }
        }
    }

    /// 获取部署（优先进行中，然后查历史记录）
    pub async fn get(&self, id: &str) -> Option<DeploymentRecord> {
        if let Some(record) = self.active.read().await.get(id) {
            return Some(record.clone());
        }
        let history = self.history.read().await;
        history.iter().find(|r| r.id == id).cloned()
    }

    /// 最近的部署记录（最新的在前）
    pub async fn recent(&self, limit: usize) -> Vec<DeploymentRecord> {
        let history = self.history.read().await;
        history.iter().take(limit).cloned().collect()
    }

    /// 进行中或排队等待部署锁的记录
    pub async fn running(&self) -> Vec<DeploymentRecord> {
        let active = self.active.read().await;
        let mut records: Vec<DeploymentRecord> = active
            .values()
            .filter(|record| !record.status.is_terminal())
            .cloned()
            .collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    pub async fn history_count(&self) -> usize {
        self.history.read().await.len()
    }
}

impl Default for DeploymentStore {
    fn default() -> Self {
        Self::new()
    }
}

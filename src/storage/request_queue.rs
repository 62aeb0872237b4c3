//! 工作队列
//!
//! 约定：
//! - 去重键相同的条目只保留一个（重复提交被吸收）
//! - 每个条目同一时间只交给一个 worker
//! - 失败的条目会被重新投递，超过重试上限后不再投递

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, StorageError};
use crate::models::{Priority, QueueEntry};

/// 入队结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// 新条目
    Accepted,
    /// 去重键已存在，被吸收
    Absorbed,
}

/// 归还失败条目的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// 重新排队，稍后重试
    Requeued,
    /// 重试次数用完，附带历次错误
    Exhausted(Vec<String>),
}

/// 队列中的请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    /// 队列内标识（即去重键）
    pub id: String,
    pub entry: QueueEntry,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub handled: bool,
}

/// 队列计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub handled: usize,
}

/// 持久化工作队列
#[async_trait]
pub trait RequestQueue: Send + Sync {
    /// 提交条目；`Priority::Front` 的条目插到队首
    async fn add_entry(&self, entry: QueueEntry) -> AppResult<AddOutcome>;

    /// 取出下一个待处理条目
    async fn fetch_next(&self) -> AppResult<Option<QueuedRequest>>;

    /// 标记处理完成
    async fn mark_handled(&self, id: &str) -> AppResult<()>;

    /// 归还处理失败的条目
    async fn reclaim(&self, id: &str, error: String) -> AppResult<ReclaimOutcome>;

    /// 队列计数
    async fn counts(&self) -> AppResult<QueueCounts>;

    /// 没有待处理也没有处理中的条目
    async fn is_finished(&self) -> AppResult<bool> {
        let counts = self.counts().await?;
        Ok(counts.pending == 0 && counts.in_progress == 0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueState {
    requests: HashMap<String, QueuedRequest>,
    pending: VecDeque<String>,
    in_progress: Vec<String>,
}

/// 本地工作队列
///
/// 状态保存在内存中；设置了快照路径时每次变更后写入 JSON 快照，
/// 重新打开时处理中的条目回到待处理（上次运行中断时它们没有完成）。
pub struct LocalRequestQueue {
    state: Mutex<QueueState>,
    max_retries: u32,
    snapshot_path: Option<PathBuf>,
}

impl LocalRequestQueue {
    /// 纯内存队列
    pub fn in_memory(max_retries: u32) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_retries,
            snapshot_path: None,
        }
    }

    /// 带快照的队列；快照存在时从中恢复
    pub async fn open(snapshot_path: impl AsRef<Path>, max_retries: u32) -> AppResult<Self> {
        let path = snapshot_path.as_ref().to_path_buf();
        let mut state = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<QueueState>(&content).map_err(|e| {
                AppError::Storage(StorageError::Corrupted {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => QueueState::default(),
            Err(e) => return Err(AppError::read_failed(path.display().to_string(), e)),
        };

        let interrupted = std::mem::take(&mut state.in_progress);
        if !interrupted.is_empty() {
            info!("🔁 恢复 {} 个上次未完成的请求", interrupted.len());
        }
        for id in interrupted.into_iter().rev() {
            state.pending.push_front(id);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::write_failed(parent.display().to_string(), e))?;
        }

        Ok(Self {
            state: Mutex::new(state),
            max_retries,
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, state: &QueueState) -> AppResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let tmp_path = path.with_extension("tmp");
        let content = serde_json::to_string(state)?;
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| AppError::write_failed(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| AppError::write_failed(path.display().to_string(), e))?;
        Ok(())
    }

    fn unknown(id: &str) -> AppError {
        AppError::Storage(StorageError::UnknownRequest { id: id.to_string() })
    }
}

#[async_trait]
impl RequestQueue for LocalRequestQueue {
    async fn add_entry(&self, entry: QueueEntry) -> AppResult<AddOutcome> {
        let mut state = self.state.lock().await;
        let front = entry.priority == Priority::Front;
        let id = entry.effective_key().to_string();
        if state.requests.contains_key(&id) {
            debug!("去重键已存在，忽略: {}", id);
            return Ok(AddOutcome::Absorbed);
        }

        state.requests.insert(
            id.clone(),
            QueuedRequest {
                id: id.clone(),
                entry,
                retry_count: 0,
                error_messages: Vec::new(),
                handled: false,
            },
        );
        if front {
            state.pending.push_front(id);
        } else {
            state.pending.push_back(id);
        }
        self.persist(&state).await?;
        Ok(AddOutcome::Accepted)
    }

    async fn fetch_next(&self) -> AppResult<Option<QueuedRequest>> {
        let mut state = self.state.lock().await;
        let Some(id) = state.pending.pop_front() else {
            return Ok(None);
        };
        state.in_progress.push(id.clone());
        let request = state.requests.get(&id).cloned().ok_or_else(|| Self::unknown(&id))?;
        self.persist(&state).await?;
        Ok(Some(request))
    }

    async fn mark_handled(&self, id: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.in_progress.retain(|p| p != id);
        let request = state.requests.get_mut(id).ok_or_else(|| Self::unknown(id))?;
        request.handled = true;
        self.persist(&state).await?;
        Ok(())
    }

    async fn reclaim(&self, id: &str, error: String) -> AppResult<ReclaimOutcome> {
        let mut state = self.state.lock().await;
        state.in_progress.retain(|p| p != id);
        let max_retries = self.max_retries;
        let request = state.requests.get_mut(id).ok_or_else(|| Self::unknown(id))?;
        request.error_messages.push(error);
        request.retry_count += 1;

        let outcome = if request.retry_count > max_retries {
            request.handled = true;
            warn!("请求 {} 已重试 {} 次，放弃", id, max_retries);
            ReclaimOutcome::Exhausted(request.error_messages.clone())
        } else {
            debug!("请求 {} 第 {} 次重试", id, request.retry_count);
            state.pending.push_back(id.to_string());
            ReclaimOutcome::Requeued
        };
        self.persist(&state).await?;
        Ok(outcome)
    }

    async fn counts(&self) -> AppResult<QueueCounts> {
        let state = self.state.lock().await;
        Ok(QueueCounts {
            pending: state.pending.len(),
            in_progress: state.in_progress.len(),
            handled: state.requests.values().filter(|r| r.handled).count(),
        })
    }
}

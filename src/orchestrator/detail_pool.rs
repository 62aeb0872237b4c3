//! 详情 worker 池 - 编排层
//!
//! ## 职责
//!
//! 1. **并发控制**：固定数量的 worker，每个 worker 一个独立会话
//! 2. **单条超时**：每个条目的提取都有整体超时，超时只影响该条目
//! 3. **重试**：失败的条目还给队列，重试用完后写入失败记录
//! 4. **会话轮换**：处理一定数量的条目后，或条目失败后，更换会话

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::error::{AppResult, CrawlError};
use crate::infrastructure::{RenderingSession, SessionFactory};
use crate::models::{EntryLabel, FailedRecord, PlaceRecord};
use crate::storage::{QueuedRequest, RecordSink, ReclaimOutcome, RequestQueue};
use crate::utils::logging::truncate_text;
use crate::workflow::DetailExtractor;

/// worker 池配置
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub concurrency: usize,
    pub retire_session_after: usize,
    pub item_timeout: Duration,
    /// 队列暂时为空时的等待间隔
    pub idle_poll: Duration,
}

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub succeeded: usize,
    pub failed: usize,
    pub retried: usize,
}

impl PoolStats {
    fn merge(&mut self, other: PoolStats) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.retried += other.retried;
    }
}

/// 详情 worker 池
pub struct DetailPool<F: SessionFactory> {
    factory: Arc<F>,
    queue: Arc<dyn RequestQueue>,
    sink: Arc<dyn RecordSink>,
    extractor: DetailExtractor,
    settings: PoolSettings,
    discovery_done: AtomicBool,
}

impl<F: SessionFactory + 'static> DetailPool<F> {
    pub fn new(
        factory: Arc<F>,
        queue: Arc<dyn RequestQueue>,
        sink: Arc<dyn RecordSink>,
        extractor: DetailExtractor,
        settings: PoolSettings,
    ) -> Self {
        Self {
            factory,
            queue,
            sink,
            extractor,
            settings,
            discovery_done: AtomicBool::new(false),
        }
    }

    /// 列表阶段结束，不会再有新条目；队列清空后 worker 退出
    pub fn finish_discovery(&self) {
        self.discovery_done.store(true, Ordering::SeqCst);
    }

    /// 启动所有 worker 并等待它们结束
    pub async fn run(self: Arc<Self>) -> AppResult<PoolStats> {
        let concurrency = self.settings.concurrency.max(1);
        info!("👷 启动 {} 个详情 worker", concurrency);

        let mut handles = Vec::with_capacity(concurrency);
        for worker_id in 1..=concurrency {
            let pool = Arc::clone(&self);
            handles.push((worker_id, tokio::spawn(async move { pool.worker(worker_id).await })));
        }

        let mut stats = PoolStats::default();
        let mut first_error = None;
        for (worker_id, handle) in handles {
            match handle.await {
                Ok(Ok(worker_stats)) => stats.merge(worker_stats),
                Ok(Err(e)) => {
                    error!("[worker {}] ❌ 异常退出: {}", worker_id, e);
                    first_error.get_or_insert(e);
                }
                Err(e) => error!("[worker {}] 任务执行失败: {}", worker_id, e),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    async fn worker(&self, worker_id: usize) -> AppResult<PoolStats> {
        let mut stats = PoolStats::default();
        let mut session: Option<F::Session> = None;
        let mut served = 0;

        loop {
            let Some(request) = self.queue.fetch_next().await? else {
                if self.discovery_done.load(Ordering::SeqCst) && self.queue.is_finished().await? {
                    break;
                }
                sleep(self.settings.idle_poll).await;
                continue;
            };

            if request.entry.user_data.label != EntryLabel::Detail {
                warn!("[worker {}] 忽略非详情条目: {}", worker_id, request.entry.url);
                self.queue.mark_handled(&request.id).await?;
                continue;
            }

            if session.is_none() {
                match self.factory.open().await {
                    Ok(opened) => session = Some(opened),
                    Err(e) => {
                        error!("[worker {}] ❌ 打开浏览器会话失败: {}", worker_id, e);
                        self.settle_failure(&request, e.to_string(), &mut stats).await?;
                        continue;
                    }
                }
            }
            let Some(active) = session.as_ref() else {
                continue;
            };

            let mut retire = false;
            match self.process(active, &request).await {
                Ok(record) => {
                    self.sink.push_record(&record).await?;
                    self.queue.mark_handled(&request.id).await?;
                    stats.succeeded += 1;
                    info!("[worker {}] ✅ 完成: {}", worker_id, request.entry.url);
                }
                Err(e) => {
                    warn!(
                        "[worker {}] ⚠️ 提取失败 {}: {}",
                        worker_id,
                        request.entry.url,
                        truncate_text(&e.to_string(), 200)
                    );
                    self.settle_failure(&request, e.to_string(), &mut stats).await?;
                    // 失败后页面状态不可信
                    retire = true;
                }
            }

            served += 1;
            if retire || served >= self.settings.retire_session_after {
                if let Some(old) = session.take() {
                    debug!("[worker {}] 更换会话（已处理 {} 个）", worker_id, served);
                    if let Err(e) = old.close().await {
                        debug!("关闭会话失败: {}", e);
                    }
                }
                served = 0;
            }
        }

        if let Some(old) = session.take() {
            if let Err(e) = old.close().await {
                debug!("关闭会话失败: {}", e);
            }
        }
        debug!("[worker {}] 队列已清空，退出", worker_id);
        Ok(stats)
    }

    /// 导航 + 提取，整体受单条超时约束
    async fn process(&self, session: &F::Session, request: &QueuedRequest) -> AppResult<PlaceRecord> {
        let url = &request.entry.url;
        let work = async {
            session.navigate(url).await?;
            self.extractor.extract(session, &request.entry).await
        };
        match timeout(self.settings.item_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::ItemTimeout {
                url: url.clone(),
                timeout: self.settings.item_timeout,
            }
            .into()),
        }
    }

    async fn settle_failure(&self, request: &QueuedRequest, error: String, stats: &mut PoolStats) -> AppResult<()> {
        match self.queue.reclaim(&request.id, error).await? {
            ReclaimOutcome::Requeued => stats.retried += 1,
            ReclaimOutcome::Exhausted(errors) => {
                error!("❌ 放弃 {}（共失败 {} 次）", request.entry.url, errors.len());
                self.sink
                    .push_failed(&FailedRecord::new(request.entry.url.clone(), errors))
                    .await?;
                stats.failed += 1;
            }
        }
        Ok(())
    }
}

//! 抓取入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、存储目录、检查点、队列快照、数据集
//! 2. **并行运行**：列表遍历（单会话顺序执行）与详情 worker 池同时运行
//! 3. **全局统计**：汇总入队、成功、失败数量

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromeSessionFactory, SessionFactory};
use crate::orchestrator::detail_pool::{DetailPool, PoolSettings, PoolStats};
use crate::orchestrator::listing_driver::ListingDriver;
use crate::storage::{
    CheckpointStore, FileCheckpointStore, JsonlDataset, LocalRequestQueue, RecordSink, RequestQueue,
};
use crate::utils::logging;
use crate::workflow::{DetailEnqueuer, DetailExtractor, ListingCtx, ListingWalker, WalkOutcome};

/// 一次抓取的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub walk: Option<WalkOutcome>,
    pub enqueued: usize,
    pub details: PoolStats,
}

/// 运行一次完整抓取：列表遍历 + 详情提取
///
/// 列表遍历彻底失败时，已经入队的条目仍会被处理完，然后返回遍历的错误。
pub async fn crawl<F>(
    config: &Config,
    factory: Arc<F>,
    checkpoints: Arc<dyn CheckpointStore>,
    queue: Arc<dyn RequestQueue>,
    sink: Arc<dyn RecordSink>,
) -> AppResult<CrawlStats>
where
    F: SessionFactory + 'static,
{
    let ctx = ListingCtx::from_config(config);
    let enqueuer = DetailEnqueuer::new(Arc::clone(&queue), config.timeouts.clone());
    let walker = ListingWalker::new(checkpoints, enqueuer, config.timeouts.clone());
    let driver = ListingDriver::new(
        Arc::clone(&factory),
        walker,
        config.start_url(),
        config.max_listing_attempts,
    );

    let pool = Arc::new(DetailPool::new(
        factory,
        queue,
        sink,
        DetailExtractor::new(config),
        PoolSettings {
            concurrency: config.max_concurrency,
            retire_session_after: config.retire_session_after.max(1),
            item_timeout: config.timeouts.item,
            idle_poll: Duration::from_millis(500).max(config.timeouts.poll_interval),
        },
    ));

    let listing = async {
        let result = driver.run(&ctx).await;
        pool.finish_discovery();
        result
    };
    let (walk_result, pool_result) = tokio::join!(listing, Arc::clone(&pool).run());

    let details = pool_result?;
    let enqueued = driver.walker().enqueuer().accepted_count();
    let walk = walk_result?;
    Ok(CrawlStats {
        walk: Some(walk),
        enqueued,
        details,
    })
}

/// 应用主结构
pub struct App {
    config: Config,
    factory: Arc<ChromeSessionFactory>,
    checkpoints: Arc<FileCheckpointStore>,
    queue: Arc<LocalRequestQueue>,
    dataset: Arc<JsonlDataset>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file, &config)
            .with_context(|| format!("无法创建日志文件 {}", config.output_log_file))?;

        logging::log_startup(&config);

        let storage_dir = Path::new(&config.storage_dir);
        let checkpoints = FileCheckpointStore::open(storage_dir)
            .await
            .context("无法打开检查点存储")?;
        let queue = LocalRequestQueue::open(storage_dir.join("queue.json"), config.max_request_retries)
            .await
            .context("无法打开请求队列")?;
        let dataset = JsonlDataset::open(&config.dataset_file)
            .await
            .context("无法打开结果数据集")?;

        Ok(Self {
            factory: Arc::new(ChromeSessionFactory::new(&config)),
            checkpoints: Arc::new(checkpoints),
            queue: Arc::new(queue),
            dataset: Arc::new(dataset),
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let result = crawl(
            &self.config,
            Arc::clone(&self.factory),
            self.checkpoints.clone(),
            self.queue.clone(),
            self.dataset.clone(),
        )
        .await;

        let counts = self.queue.counts().await?;
        match result {
            Ok(stats) => {
                info!("列表遍历结果: {:?}", stats.walk);
                logging::print_final_stats(
                    stats.details.succeeded,
                    stats.details.failed,
                    stats.enqueued,
                    &self.config.output_log_file,
                );
                info!("📦 队列: 已处理 {} | 待处理 {}", counts.handled, counts.pending);
                Ok(())
            }
            Err(e) => {
                error!("❌ 抓取失败: {}", e);
                Err(e).context("抓取失败")
            }
        }
    }
}

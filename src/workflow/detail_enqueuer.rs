//! 详情入队 - 流程层
//!
//! 核心职责：把当前列表分页上的每个条目变成一个详情队列条目
//!
//! 每个条目的流程：
//! 1. 等待列表稳定，重新查询条目（旧句柄在返回列表后会失效）
//! 2. 打开条目，等待详情页标记（失败时重试一次）
//! 3. 从地址和 plus code 生成去重键，提交到队首
//! 4. 检查预算
//! 5. 返回列表（返回按钮 → 浏览器后退）

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::error::{AppError, AppResult, CrawlError};
use crate::infrastructure::wait::{wait_for_count, wait_for_idle, wait_for_selector};
use crate::infrastructure::RenderingSession;
use crate::models::QueueEntry;
use crate::selectors;
use crate::storage::{AddOutcome, RequestQueue};
use crate::utils::text::extract_place_token;
use crate::workflow::listing_ctx::ListingCtx;

/// 单个分页的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// 分页处理完，可以继续翻页
    Continue,
    /// 达到预算，停止发现
    BudgetReached,
}

/// 详情入队流程
///
/// 不持有会话；会话由列表遍历器顺序地借给它。
pub struct DetailEnqueuer {
    queue: Arc<dyn RequestQueue>,
    timeouts: Timeouts,
    accepted: AtomicUsize,
    absorbed: AtomicUsize,
}

impl DetailEnqueuer {
    pub fn new(queue: Arc<dyn RequestQueue>, timeouts: Timeouts) -> Self {
        Self {
            queue,
            timeouts,
            accepted: AtomicUsize::new(0),
            absorbed: AtomicUsize::new(0),
        }
    }

    /// 新入队的条目数量
    pub fn accepted_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// 因去重键重复被吸收的条目数量
    pub fn absorbed_count(&self) -> usize {
        self.absorbed.load(Ordering::SeqCst)
    }

    /// 处理当前分页上的所有条目
    ///
    /// `page_offset` 是本页第一个条目在完整列表中的排名。
    pub async fn enqueue_from_page<S: RenderingSession>(
        &self,
        session: &S,
        ctx: &ListingCtx,
        page_offset: u64,
    ) -> AppResult<PageOutcome> {
        // 条目数量只测一次；之后每次访问前重新查询
        let item_count = session.query(selectors::LISTING_ITEM).await?.len();
        debug!("{} 本页共 {} 个条目，起始排名 {}", ctx, item_count, page_offset);

        for index in 0..item_count {
            self.wait_for_listing(session, index).await?;

            let is_advertisement = self.is_sponsored(session, index).await?;
            self.open_item(session, index).await?;

            let url = session.current_url().await?;
            let rank = page_offset + index as u64;
            self.submit(session, ctx, url.clone(), is_advertisement, rank)
                .await?;

            if ctx.budget_exhausted_at(rank) {
                info!(
                    "{} 🛑 已达到最大抓取数量 {}，停止入队",
                    ctx,
                    ctx.item_budget.unwrap_or_default()
                );
                return Ok(PageOutcome::BudgetReached);
            }

            sleep(self.timeouts.enqueue_settle).await;
            self.back_to_listing(session, &url).await?;
        }

        Ok(PageOutcome::Continue)
    }

    /// 搜索直接落在单个详情页上：只入队这一个条目
    pub async fn enqueue_single<S: RenderingSession>(
        &self,
        session: &S,
        ctx: &ListingCtx,
    ) -> AppResult<()> {
        let url = session.current_url().await?;
        info!("{} 搜索结果是单个地点: {}", ctx, url);
        self.submit(session, ctx, url, false, 0).await
    }

    async fn wait_for_listing<S: RenderingSession>(&self, session: &S, index: usize) -> AppResult<()> {
        let t = &self.timeouts;
        wait_for_selector(session, selectors::SEARCH_BOX_CLASS, t.default_wait, t.poll_interval).await?;
        wait_for_idle(session, t.default_wait, t.poll_interval).await?;
        wait_for_count(
            session,
            selectors::LISTING_ITEM_TITLE,
            index + 1,
            t.default_wait,
            t.poll_interval,
        )
        .await
    }

    async fn item_at<S: RenderingSession>(&self, session: &S, index: usize) -> AppResult<S::Handle> {
        session
            .query(selectors::LISTING_ITEM)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| AppError::transient(format!("列表中找不到第 {} 个条目", index + 1)))
    }

    async fn is_sponsored<S: RenderingSession>(&self, session: &S, index: usize) -> AppResult<bool> {
        let item = self.item_at(session, index).await?;
        Ok(session
            .query_within(&item, selectors::ITEM_SPONSORED_BADGE)
            .await?
            .is_some())
    }

    /// 激活条目标题并等待详情页标记；列表仍在时再试一次
    async fn open_item<S: RenderingSession>(&self, session: &S, index: usize) -> AppResult<()> {
        let t = &self.timeouts;
        for attempt in 1..=2 {
            let item = self.item_at(session, index).await?;
            let title = session
                .query_within(&item, selectors::ITEM_TITLE)
                .await?
                .ok_or_else(|| AppError::transient(format!("第 {} 个条目没有标题", index + 1)))?;
            session.activate(&title).await?;

            match wait_for_selector(session, selectors::BACK_TO_LIST, t.detail_marker, t.poll_interval).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_timeout() => {
                    if session.query_one(selectors::LISTING_ITEM).await?.is_none() {
                        return Err(e);
                    }
                    debug!("第 {} 个条目第 {} 次点击后仍停留在列表", index + 1, attempt);
                }
                Err(e) => return Err(e),
            }
        }
        Err(CrawlError::NavigationAmbiguity { index }.into())
    }

    async fn submit<S: RenderingSession>(
        &self,
        session: &S,
        ctx: &ListingCtx,
        url: String,
        is_advertisement: bool,
        rank: u64,
    ) -> AppResult<()> {
        let plus_code = self.read_plus_code(session).await?;
        let dedup_key = place_identity(&url, &plus_code);
        debug!("{} 入队 {}，去重键 {}", ctx, url, dedup_key);

        let entry = QueueEntry::detail(
            url.clone(),
            dedup_key,
            ctx.search_string.clone(),
            is_advertisement,
            rank,
        );
        match self.queue.add_entry(entry).await? {
            AddOutcome::Accepted => {
                self.accepted.fetch_add(1, Ordering::SeqCst);
                info!("{} [地点 {}] ➕ 已加入队列: {}", ctx, rank, url);
            }
            AddOutcome::Absorbed => {
                self.absorbed.fetch_add(1, Ordering::SeqCst);
                info!("{} [地点 {}] 已在队列中，跳过: {}", ctx, rank, url);
            }
        }
        Ok(())
    }

    async fn read_plus_code<S: RenderingSession>(&self, session: &S) -> AppResult<String> {
        let Some(handle) = session.query_one(selectors::PLUS_CODE).await? else {
            return Ok(String::new());
        };
        Ok(session
            .inner_text(&handle)
            .await?
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }

    /// 返回列表：先用返回按钮，不行再用浏览器后退
    async fn back_to_listing<S: RenderingSession>(&self, session: &S, url: &str) -> AppResult<()> {
        let t = &self.timeouts;
        let via_button = async {
            wait_for_idle(session, t.default_wait, t.poll_interval).await?;
            let back = session
                .query_one(selectors::BACK_TO_LIST)
                .await?
                .ok_or_else(|| AppError::transient("找不到返回列表按钮"))?;
            session.click(&back).await?;
            wait_for_selector(session, selectors::SEARCH_BOX_CLASS, t.back_control, t.poll_interval).await
        };
        match via_button.await {
            Ok(()) => return Ok(()),
            Err(e) => debug!("{} 返回按钮无效 ({})，改用浏览器后退", url, e),
        }

        session.go_back().await?;
        match wait_for_selector(session, selectors::LISTING_ITEM, t.default_wait, t.poll_interval).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("⚠️ 无法从 {} 返回列表: {}", url, e);
                Err(CrawlError::BrokenBackNavigation {
                    url: url.to_string(),
                }
                .into())
            }
        }
    }
}

/// 地点的去重键：地址中的地点标识（取不到时随机生成）+ plus code
pub fn place_identity(url: &str, plus_code: &str) -> String {
    let token = extract_place_token(url).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    format!("{}{}", token, plus_code)
}

//! 列表遍历 - 流程层
//!
//! 核心职责：提交搜索，逐页遍历列表，把每页交给 DetailEnqueuer，
//! 并在每页之后保存检查点，保证中断后可以跳过已完成的分页。

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Timeouts;
use crate::error::{AppError, AppResult, CrawlError};
use crate::infrastructure::wait::{wait_for, wait_for_any, wait_for_idle, wait_for_selector};
use crate::infrastructure::RenderingSession;
use crate::models::ListingCheckpoint;
use crate::selectors;
use crate::storage::CheckpointStore;
use crate::utils::text::parse_pagination_range;
use crate::workflow::detail_enqueuer::{DetailEnqueuer, PageOutcome};
use crate::workflow::listing_ctx::ListingCtx;

/// 一次遍历的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// 检查点显示之前已经遍历完成
    AlreadyFinished,
    /// 搜索直接落在单个详情页上
    SingleDetail,
    /// 走到了最后一页
    Exhausted,
    /// 预算用完提前停止
    BudgetReached,
}

/// 搜索提交后的落点
enum Landing {
    Detail,
    Listing,
}

/// 列表遍历器
pub struct ListingWalker {
    checkpoints: Arc<dyn CheckpointStore>,
    enqueuer: DetailEnqueuer,
    timeouts: Timeouts,
}

impl ListingWalker {
    pub fn new(
        checkpoints: Arc<dyn CheckpointStore>,
        enqueuer: DetailEnqueuer,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            checkpoints,
            enqueuer,
            timeouts,
        }
    }

    pub fn enqueuer(&self) -> &DetailEnqueuer {
        &self.enqueuer
    }

    /// 遍历整个列表
    ///
    /// 会话应当已经打开起始页面；检查点只在开始时读取一次。
    pub async fn run<S: RenderingSession>(&self, session: &S, ctx: &ListingCtx) -> AppResult<WalkOutcome> {
        let key = ListingCheckpoint::storage_key(&ctx.session_key);
        let mut checkpoint = self.checkpoints.get(&key).await?.unwrap_or_default();
        if checkpoint.is_finished {
            info!("{} ✓ 列表已经遍历完成，跳过", ctx);
            return Ok(WalkOutcome::AlreadyFinished);
        }
        if let (Some(from), Some(to)) = (checkpoint.from, checkpoint.to) {
            info!("{} 🔁 从检查点恢复，已完成到 {}–{}", ctx, from, to);
        }

        self.submit_search(session, ctx).await?;

        if let Landing::Detail = self.wait_for_landing(session, ctx).await? {
            self.enqueuer.enqueue_single(session, ctx).await?;
            checkpoint.mark_finished();
            self.checkpoints.set(&key, &checkpoint).await?;
            return Ok(WalkOutcome::SingleDetail);
        }

        loop {
            self.wait_for_pagination(session).await?;
            let range_text = self.read_range_text(session).await?;
            let (from, to) = parse_pagination_range(&range_text)
                .ok_or_else(|| CrawlError::UnparsableRange { text: range_text.clone() })?;

            let outcome = if checkpoint.covers(from) {
                info!("{} ⏭️ 分页 {}–{} 已经处理过，跳过", ctx, from, to);
                PageOutcome::Continue
            } else {
                info!("{} 📄 处理分页 {}–{}", ctx, from, to);
                self.enqueuer
                    .enqueue_from_page(session, ctx, from.saturating_sub(1))
                    .await?
            };

            checkpoint.advance(from, to);
            self.checkpoints.set(&key, &checkpoint).await?;

            if outcome == PageOutcome::BudgetReached || ctx.budget_covered_by(to) {
                info!("{} 🛑 预算已覆盖，停止翻页（最后分页 {}–{}）", ctx, from, to);
                return Ok(WalkOutcome::BudgetReached);
            }

            self.wait_for_pagination(session).await?;
            if self.is_last_page(session).await? {
                break;
            }
            self.next_page(session, &range_text).await?;
        }

        checkpoint.mark_finished();
        self.checkpoints.set(&key, &checkpoint).await?;
        info!("{} ✓ 列表遍历完成", ctx);
        Ok(WalkOutcome::Exhausted)
    }

    async fn submit_search<S: RenderingSession>(&self, session: &S, ctx: &ListingCtx) -> AppResult<()> {
        let t = &self.timeouts;
        wait_for_selector(session, selectors::SEARCH_INPUT, t.default_wait, t.poll_interval).await?;
        let input = session
            .query_one(selectors::SEARCH_INPUT)
            .await?
            .ok_or_else(|| AppError::transient("找不到搜索输入框"))?;
        info!("{} 🔍 输入搜索关键词", ctx);
        session.type_text(&input, &ctx.search_string).await?;
        sleep(t.search_settle).await;

        let button = session
            .query_one(selectors::SEARCH_BUTTON)
            .await?
            .ok_or_else(|| AppError::transient("找不到搜索按钮"))?;
        session.click(&button).await?;
        sleep(t.search_settle).await;
        wait_for_idle(session, t.default_wait, t.poll_interval).await
    }

    async fn wait_for_landing<S: RenderingSession>(&self, session: &S, ctx: &ListingCtx) -> AppResult<Landing> {
        let t = &self.timeouts;
        let candidates = [selectors::DETAIL_TITLE, selectors::LISTING_ITEM];
        match wait_for_any(session, &candidates, t.default_wait, t.poll_interval).await {
            Ok(0) => Ok(Landing::Detail),
            Ok(_) => Ok(Landing::Listing),
            Err(e) if e.is_timeout() => {
                warn!("{} ❌ 搜索没有产生任何结果", ctx);
                Err(CrawlError::SearchProducedNothing {
                    search: ctx.search_string.clone(),
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }

    async fn wait_for_pagination<S: RenderingSession>(&self, session: &S) -> AppResult<()> {
        let t = &self.timeouts;
        match wait_for_selector(session, selectors::PAGINATION_NEXT, t.default_wait, t.poll_interval).await {
            Err(e) if e.is_timeout() => Err(CrawlError::PaginationNotFound.into()),
            other => other,
        }
    }

    async fn read_range_text<S: RenderingSession>(&self, session: &S) -> AppResult<String> {
        let Some(handle) = session.query_one(selectors::PAGINATION_RANGE).await? else {
            return Err(CrawlError::UnparsableRange { text: String::new() }.into());
        };
        Ok(session.inner_text(&handle).await?.unwrap_or_default())
    }

    /// 下一页按钮禁用，或出现"没有结果"提示
    async fn is_last_page<S: RenderingSession>(&self, session: &S) -> AppResult<bool> {
        if session.query_one(selectors::NO_RESULTS).await?.is_some() {
            debug!("出现无结果提示，视为最后一页");
            return Ok(true);
        }
        let Some(next) = session.query_one(selectors::PAGINATION_NEXT).await? else {
            return Ok(true);
        };
        Ok(session.attribute(&next, "disabled").await?.is_some())
    }

    /// 翻到下一页，并等待分页区间文本变化
    async fn next_page<S: RenderingSession>(&self, session: &S, previous_range: &str) -> AppResult<()> {
        let t = &self.timeouts;
        let next = session
            .query_one(selectors::PAGINATION_NEXT)
            .await?
            .ok_or(CrawlError::PaginationNotFound)?;
        session.activate(&next).await?;
        wait_for_idle(session, t.default_wait, t.poll_interval).await?;

        wait_for("分页区间变化", t.default_wait, t.poll_interval, move || async move {
            Ok(self.read_range_text(session).await? != previous_range)
        })
        .await
    }
}

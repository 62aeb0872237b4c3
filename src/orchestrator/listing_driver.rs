//! 列表遍历驱动 - 编排层
//!
//! 遍历失败时整体重来：每次尝试打开新的会话，从起始页面重新搜索。
//! 检查点保证重来时跳过已经完成的分页。

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::{RenderingSession, SessionFactory};
use crate::workflow::{ListingCtx, ListingWalker, WalkOutcome};

/// 列表遍历驱动
pub struct ListingDriver<F: SessionFactory> {
    factory: Arc<F>,
    walker: ListingWalker,
    start_url: String,
    max_attempts: u32,
}

impl<F: SessionFactory> ListingDriver<F> {
    pub fn new(factory: Arc<F>, walker: ListingWalker, start_url: String, max_attempts: u32) -> Self {
        Self {
            factory,
            walker,
            start_url,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn walker(&self) -> &ListingWalker {
        &self.walker
    }

    /// 运行遍历，最多尝试 `max_attempts` 次
    pub async fn run(&self, ctx: &ListingCtx) -> AppResult<WalkOutcome> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            info!("{} 🚀 第 {}/{} 次列表遍历", ctx, attempt, self.max_attempts);

            let session = match self.factory.open().await {
                Ok(session) => session,
                Err(e) => {
                    error!("{} ❌ 打开浏览器会话失败: {}", ctx, e);
                    last_error = Some(e);
                    continue;
                }
            };

            let result = self.attempt(&session, ctx).await;
            if let Err(e) = session.close().await {
                debug!("关闭会话失败: {}", e);
            }

            match result {
                Ok(outcome) => {
                    info!("{} ✓ 列表遍历结束: {:?}", ctx, outcome);
                    return Ok(outcome);
                }
                Err(e @ AppError::Config(_)) => return Err(e),
                Err(e) => {
                    let kind = if e.is_fatal() { "致命错误" } else { "错误" };
                    error!("{} ❌ 第 {} 次遍历遇到{}: {}", ctx, attempt, kind, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::Other("列表遍历没有执行".to_string())))
    }

    async fn attempt(&self, session: &F::Session, ctx: &ListingCtx) -> AppResult<WalkOutcome> {
        session.navigate(&self.start_url).await?;
        self.walker.run(session, ctx).await
    }
}

//! 嵌套集合加载器
//!
//! 评论列表、图片画廊都是"滚到底部才加载下一批"的容器。
//! 反复滚动直到可滚动高度不再变化，或者达到轮数上限。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::RenderingSession;

/// 加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// 实际滚动的轮数
    pub iterations: usize,
    /// 最后一次测得的可滚动高度
    pub final_extent: u64,
    /// 是否因为高度稳定而停止（false 表示达到轮数上限）
    pub stabilized: bool,
}

/// 嵌套集合加载器
#[derive(Debug, Clone)]
pub struct CollectionLoader {
    settle: Duration,
}

impl CollectionLoader {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// 把容器滚动到底，直到内容不再增长
    ///
    /// 每轮：测量高度 → 滚到底部 → 等待稳定延迟 → 再次测量；
    /// 两次测量相等即停止。`max_iterations` 为 0 时只测量一次。
    pub async fn reveal_all<S: RenderingSession>(
        &self,
        session: &S,
        container: &S::Handle,
        max_iterations: usize,
    ) -> AppResult<LoadOutcome> {
        let mut extent = session.scroll_extent(container).await?;
        let mut iterations = 0;

        while iterations < max_iterations {
            session.scroll_container(container).await?;
            sleep(self.settle).await;
            iterations += 1;

            let next_extent = session.scroll_extent(container).await?;
            debug!("第 {} 轮滚动: 高度 {} → {}", iterations, extent, next_extent);
            if next_extent == extent {
                return Ok(LoadOutcome {
                    iterations,
                    final_extent: next_extent,
                    stabilized: true,
                });
            }
            extent = next_extent;
        }

        if max_iterations > 0 {
            warn!("⚠️ 滚动 {} 轮后内容仍在增长，停止加载", max_iterations);
        }
        Ok(LoadOutcome {
            iterations,
            final_extent: extent,
            stabilized: max_iterations == 0,
        })
    }
}

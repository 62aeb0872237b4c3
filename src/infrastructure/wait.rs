//! 同步原语：等待条件成立，否则以 Timeout 失败
//!
//! 所有等待都有上限，按固定间隔轮询，不会无限忙等。

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::RenderingSession;
use crate::selectors;

/// 轮询 `probe` 直到返回 true
///
/// 探测本身出错（例如页面正在跳转）按"尚未满足"处理，超时后返回 Timeout。
pub async fn wait_for<F, Fut>(
    what: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut probe: F,
) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match probe().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => debug!("等待 {} 时探测失败: {}", what, e),
        }
        if Instant::now() >= deadline {
            return Err(AppError::timeout(what, timeout));
        }
        sleep(poll_interval).await;
    }
}

/// 等待选择器出现
pub async fn wait_for_selector<S: RenderingSession>(
    session: &S,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> AppResult<()> {
    wait_for(selector, timeout, poll_interval, move || async move {
        Ok(session.query_one(selector).await?.is_some())
    })
    .await
}

/// 等待至少 `count` 个元素出现
pub async fn wait_for_count<S: RenderingSession>(
    session: &S,
    selector: &str,
    count: usize,
    timeout: Duration,
    poll_interval: Duration,
) -> AppResult<()> {
    let what = format!("{} (至少 {} 个)", selector, count);
    wait_for(&what, timeout, poll_interval, move || async move {
        Ok(session.query(selector).await?.len() >= count)
    })
    .await
}

/// 等待多个选择器中的任意一个出现，返回命中的下标
pub async fn wait_for_any<S: RenderingSession>(
    session: &S,
    candidates: &[&str],
    timeout: Duration,
    poll_interval: Duration,
) -> AppResult<usize> {
    let matched = &AtomicUsize::new(usize::MAX);
    let what = candidates.join(" | ");
    wait_for(&what, timeout, poll_interval, move || async move {
        for (index, selector) in candidates.iter().enumerate() {
            if session.query_one(selector).await?.is_some() {
                matched.store(index, Ordering::SeqCst);
                return Ok(true);
            }
        }
        Ok(false)
    })
    .await?;
    match matched.load(Ordering::SeqCst) {
        usize::MAX => Err(AppError::timeout(what, timeout)),
        index => Ok(index),
    }
}

/// 等待地图搜索框的加载指示器消失
pub async fn wait_for_idle<S: RenderingSession>(
    session: &S,
    timeout: Duration,
    poll_interval: Duration,
) -> AppResult<()> {
    wait_for("搜索框加载完成", timeout, poll_interval, move || async move {
        Ok(session.query_one(selectors::SEARCH_BOX_LOADING).await?.is_none())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_succeeds_after_a_few_polls() {
        let calls = &AtomicUsize::new(0);
        let result = wait_for("计数", Duration::from_secs(1), Duration::from_millis(1), move || async move {
            Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
        })
        .await;
        tokio_test::assert_ok!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let result = wait_for(
            "永远不会出现",
            Duration::from_millis(20),
            Duration::from_millis(5),
            || async { Ok(false) },
        )
        .await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_probe_errors_are_retried() {
        let calls = &AtomicUsize::new(0);
        let result = wait_for("跳转中", Duration::from_secs(1), Duration::from_millis(1), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::transient("节点已分离"))
            } else {
                Ok(true)
            }
        })
        .await;
        tokio_test::assert_ok!(result);
    }
}

use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult, BrowserError};

/// 连接到已开启调试端口的浏览器并获取页面
///
/// # 参数
/// - `port`: 浏览器调试端口
/// - `target_url`: 新页面要打开的地址（None 时为空白页）
pub async fn connect_to_browser_and_page(
    port: u16,
    target_url: Option<&str>,
) -> AppResult<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);
    debug!("目标 URL: {:?}", target_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(e),
        })
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    // 每个会话都使用自己的新标签页，避免和其他会话共享页面状态
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })?;

    if let Some(url) = target_url {
        page.goto(url).await.map_err(|e| {
            error!("导航到 {} 失败: {}", url, e);
            AppError::navigation_failed(url, e)
        })?;
        info!("已导航到: {}", url);
    }

    Ok((browser, page))
}

use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, BrowserError};

/// 按配置启动浏览器并打开一个空白页
pub async fn launch_headless_browser(config: &Config) -> AppResult<(Browser, Page)> {
    info!("🚀 启动浏览器 (无头: {})...", config.headless);

    let mut args = vec![
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--lang=en-US".to_string(),
    ];
    if let Some(proxy) = &config.proxy_url {
        debug!("使用代理: {}", proxy);
        args.push(format!("--proxy-server={}", proxy));
    }

    // 清除默认的设备尺寸覆盖，地图按真实窗口大小渲染
    let mut builder = BrowserConfig::builder().viewport(None).args(args);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        AppError::Browser(BrowserError::ConfigurationFailed(e))
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(e),
        })
    })?;
    debug!("浏览器启动成功");

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

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })?;

    Ok((browser, page))
}

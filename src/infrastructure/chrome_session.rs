//! 基于 chromiumoxide 的渲染会话

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::Browser;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{JsExecutor, RenderingSession, SessionFactory};

/// 激活元素的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationStrategy {
    /// 模拟输入：滚动到可见区域、聚焦、鼠标点击
    Simulated,
    /// 页面脚本触发 `element.click()`
    Programmatic,
    /// 先模拟输入，失败后改用脚本触发
    #[default]
    SimulatedWithFallback,
}

/// Chromium 标签页会话
///
/// 持有浏览器（如果是本会话启动的）和唯一的 JsExecutor。
pub struct ChromeSession {
    executor: JsExecutor,
    browser: Mutex<Option<Browser>>,
    activation: ActivationStrategy,
    navigation_timeout: std::time::Duration,
}

impl ChromeSession {
    pub fn new(browser: Option<Browser>, executor: JsExecutor, config: &Config) -> Self {
        Self {
            executor,
            browser: Mutex::new(browser),
            activation: ActivationStrategy::default(),
            navigation_timeout: config.timeouts.navigation,
        }
    }

    async fn simulated_click(&self, handle: &Element) -> AppResult<()> {
        handle.scroll_into_view().await?;
        handle.focus().await?;
        handle.click().await?;
        Ok(())
    }

    async fn programmatic_click(&self, handle: &Element) -> AppResult<()> {
        handle
            .call_js_fn("function() { this.click(); }", false)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RenderingSession for ChromeSession {
    type Handle = Element;

    async fn navigate(&self, url: &str) -> AppResult<()> {
        debug!("导航到: {}", url);
        match timeout(self.navigation_timeout, self.executor.page().goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AppError::navigation_failed(url, e)),
            Err(_) => Err(AppError::timeout(format!("导航到 {}", url), self.navigation_timeout)),
        }
    }

    async fn query(&self, selector: &str) -> AppResult<Vec<Element>> {
        Ok(self.executor.page().find_elements(selector).await?)
    }

    async fn query_within(&self, scope: &Element, selector: &str) -> AppResult<Option<Element>> {
        Ok(scope.find_elements(selector).await?.into_iter().next())
    }

    async fn type_text(&self, handle: &Element, text: &str) -> AppResult<()> {
        handle.click().await?;
        handle.type_str(text).await?;
        Ok(())
    }

    async fn click(&self, handle: &Element) -> AppResult<()> {
        handle.click().await?;
        Ok(())
    }

    async fn activate(&self, handle: &Element) -> AppResult<()> {
        match self.activation {
            ActivationStrategy::Simulated => self.simulated_click(handle).await,
            ActivationStrategy::Programmatic => self.programmatic_click(handle).await,
            ActivationStrategy::SimulatedWithFallback => {
                if let Err(e) = self.simulated_click(handle).await {
                    debug!("模拟点击失败，改用脚本点击: {}", e);
                    self.programmatic_click(handle).await?;
                }
                Ok(())
            }
        }
    }

    async fn go_back(&self) -> AppResult<()> {
        self.executor
            .eval("(() => { window.history.back(); return true; })()")
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn inner_text(&self, handle: &Element) -> AppResult<Option<String>> {
        Ok(handle.inner_text().await?)
    }

    async fn attribute(&self, handle: &Element, name: &str) -> AppResult<Option<String>> {
        Ok(handle.attribute(name).await?)
    }

    async fn evaluate_structured(&self, script: &str) -> AppResult<JsonValue> {
        self.executor.eval(script).await
    }

    async fn scroll_container(&self, handle: &Element) -> AppResult<()> {
        handle
            .call_js_fn("function() { this.scrollTop = this.scrollHeight; }", false)
            .await?;
        Ok(())
    }

    async fn scroll_extent(&self, handle: &Element) -> AppResult<u64> {
        let value = self
            .executor
            .call_on(handle, "function() { return JSON.stringify(this.scrollHeight); }")
            .await?;
        Ok(value.as_u64().unwrap_or(0))
    }

    async fn close(&self) -> AppResult<()> {
        if let Err(e) = self.executor.page().clone().close().await {
            debug!("关闭页面失败: {}", e);
        }
        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
        }
        Ok(())
    }
}

/// 按配置打开 Chromium 会话：连接已有浏览器或启动新的浏览器
pub struct ChromeSessionFactory {
    config: Config,
}

impl ChromeSessionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    type Session = ChromeSession;

    async fn open(&self) -> AppResult<ChromeSession> {
        let (browser, page, owned) = match self.config.browser_debug_port {
            Some(port) => {
                let (browser, page) = browser::connect_to_browser_and_page(port, None).await?;
                (browser, page, false)
            }
            None => {
                let (browser, page) = browser::launch_headless_browser(&self.config).await?;
                (browser, page, true)
            }
        };
        // 连接到外部浏览器时不负责关闭它
        let browser = if owned { Some(browser) } else { None };
        Ok(ChromeSession::new(browser, JsExecutor::new(page), &self.config))
    }
}

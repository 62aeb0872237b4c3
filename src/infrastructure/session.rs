//! 渲染会话抽象
//!
//! 遍历、入队、提取逻辑只依赖这个 trait，不直接接触浏览器。
//! 同一个会话上的所有操作必须顺序执行：页面是共享的可变状态。

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

/// 可控制的渲染会话（一个浏览器标签页）
#[async_trait]
pub trait RenderingSession: Send + Sync {
    /// 页面元素句柄；句柄可能在页面变化后失效，使用前应重新查询
    type Handle: Send + Sync;

    /// 导航到地址
    async fn navigate(&self, url: &str) -> AppResult<()>;

    /// 查询所有匹配的元素（可能为空）
    async fn query(&self, selector: &str) -> AppResult<Vec<Self::Handle>>;

    /// 查询第一个匹配的元素
    async fn query_one(&self, selector: &str) -> AppResult<Option<Self::Handle>> {
        Ok(self.query(selector).await?.into_iter().next())
    }

    /// 在元素内部查询第一个匹配的子元素
    async fn query_within(
        &self,
        scope: &Self::Handle,
        selector: &str,
    ) -> AppResult<Option<Self::Handle>>;

    /// 在元素中输入文本
    async fn type_text(&self, handle: &Self::Handle, text: &str) -> AppResult<()>;

    /// 原生点击
    async fn click(&self, handle: &Self::Handle) -> AppResult<()>;

    /// 激活元素（聚焦 + 点击）
    ///
    /// 具体使用模拟输入还是脚本触发由实现决定，调用方不关心。
    async fn activate(&self, handle: &Self::Handle) -> AppResult<()>;

    /// 浏览器历史后退
    async fn go_back(&self) -> AppResult<()>;

    /// 当前地址
    async fn current_url(&self) -> AppResult<String>;

    /// 元素的可见文本
    async fn inner_text(&self, handle: &Self::Handle) -> AppResult<Option<String>>;

    /// 元素属性
    async fn attribute(&self, handle: &Self::Handle, name: &str) -> AppResult<Option<String>>;

    /// 在页面中执行脚本并返回结构化结果
    async fn evaluate_structured(&self, script: &str) -> AppResult<JsonValue>;

    /// 把可滚动容器滚动到底部，触发加载更多
    async fn scroll_container(&self, handle: &Self::Handle) -> AppResult<()>;

    /// 容器当前的可滚动高度
    async fn scroll_extent(&self, handle: &Self::Handle) -> AppResult<u64>;

    /// 关闭会话，释放浏览器资源
    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

/// 会话工厂：外层驱动每次尝试、每个 worker 都打开新的会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: RenderingSession + 'static;

    async fn open(&self) -> AppResult<Self::Session>;
}

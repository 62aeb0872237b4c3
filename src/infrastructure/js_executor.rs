//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::element::Element;
use chromiumoxide::Page;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识地点 / 评论
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 表达式并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JavaScript 代码
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 以元素为 `this` 调用函数声明
    ///
    /// 函数体需要返回 `JSON.stringify(...)` 的结果：
    /// 字符串总是按值返回，对象则不一定。
    pub async fn call_on(&self, element: &Element, function_declaration: &str) -> AppResult<JsonValue> {
        let returns = element.call_js_fn(function_declaration, false).await?;
        match returns.result.value {
            Some(JsonValue::String(raw)) => Ok(serde_json::from_str(&raw)?),
            Some(other) => Ok(other),
            None => Ok(JsonValue::Null),
        }
    }
}

//! 声明式字段读取
//!
//! 一张字段表（名字 → 选择器 + 读取方式）编译成一段脚本，
//! 一次往返读出所有字段，而不是每个字段一次 CDP 调用。

use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};

use crate::error::AppResult;
use crate::infrastructure::RenderingSession;
use crate::selectors;

/// 字段读取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRead {
    /// 文本内容，去掉首尾空白
    Text,
    /// 原样的文本内容
    RawText,
    /// 属性值，去掉首尾空白
    Attribute(&'static str),
}

/// 一个字段的声明
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// 输出对象中的键
    pub name: &'static str,
    /// 相对于作用域的选择器；空字符串表示作用域节点本身
    pub selector: &'static str,
    pub read: FieldRead,
    /// 节点不存在时输出 null（否则输出空字符串）
    pub optional: bool,
}

impl FieldSpec {
    pub const fn text(name: &'static str, selector: &'static str) -> Self {
        Self {
            name,
            selector,
            read: FieldRead::Text,
            optional: false,
        }
    }

    pub const fn raw_text(name: &'static str, selector: &'static str) -> Self {
        Self {
            name,
            selector,
            read: FieldRead::RawText,
            optional: false,
        }
    }

    pub const fn attribute(name: &'static str, selector: &'static str, attr: &'static str) -> Self {
        Self {
            name,
            selector,
            read: FieldRead::Attribute(attr),
            optional: false,
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }

    fn to_json(self) -> JsonValue {
        let (kind, attr) = match self.read {
            FieldRead::Text => ("text", None),
            FieldRead::RawText => ("raw", None),
            FieldRead::Attribute(attr) => ("attr", Some(attr)),
        };
        json!({
            "name": self.name,
            "selector": self.selector,
            "kind": kind,
            "attr": attr,
            "optional": self.optional,
        })
    }
}

/// 地点详情的平铺字段
pub const PLACE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", selectors::DETAIL_TITLE),
    FieldSpec::text("totalScore", selectors::RATING),
    FieldSpec::text("categoryName", selectors::CATEGORY),
    FieldSpec::text("address", selectors::ADDRESS),
    FieldSpec::text("plusCode", selectors::PLUS_CODE),
];

/// 单条评论的字段（相对于评论节点）
pub const REVIEW_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", selectors::REVIEW_AUTHOR),
    FieldSpec::raw_text("text", selectors::REVIEW_TEXT),
    FieldSpec::attribute("stars", selectors::REVIEW_STARS, "aria-label"),
    FieldSpec::text("publishAt", selectors::REVIEW_PUBLISHED),
    FieldSpec::text("likesCount", selectors::REVIEW_LIKES),
    FieldSpec::text("responseFromOwnerText", selectors::REVIEW_OWNER_RESPONSE).optional(),
];

/// 图片节点的样式（背景图地址在 style 里）
pub const GALLERY_FIELDS: &[FieldSpec] = &[FieldSpec::attribute("style", "", "style")];

const READER_JS: &str = r#"
    const readField = (root, f) => {
        const el = f.selector ? root.querySelector(f.selector) : root;
        if (!el) return f.optional ? null : '';
        if (f.kind === 'attr') return (el.getAttribute(f.attr) || '').trim();
        const text = el.textContent || '';
        return f.kind === 'raw' ? text : text.trim();
    };
    const pick = (root) => {
        const out = {};
        for (const f of fields) out[f.name] = readField(root, f);
        return out;
    };
"#;

fn fields_json(fields: &[FieldSpec]) -> String {
    JsonValue::Array(fields.iter().map(|f| f.to_json()).collect()).to_string()
}

/// 以整个文档为作用域读取字段，结果是一个对象
pub fn document_script(fields: &[FieldSpec]) -> String {
    format!(
        "(() => {{ const fields = {}; {} return JSON.stringify(pick(document)); }})()",
        fields_json(fields),
        READER_JS
    )
}

/// 对每个匹配 `root_selector` 的节点读取字段，结果是对象数组
pub fn per_node_script(root_selector: &str, fields: &[FieldSpec]) -> String {
    format!(
        "(() => {{ const fields = {}; {} return JSON.stringify(Array.from(document.querySelectorAll({})).map(pick)); }})()",
        fields_json(fields),
        READER_JS,
        JsonValue::String(root_selector.to_string())
    )
}

/// 脚本结果解码：字符串按 JSON 解析，其他值直接转换
pub fn decode<T: DeserializeOwned>(value: JsonValue) -> AppResult<T> {
    match value {
        JsonValue::String(raw) => Ok(serde_json::from_str(&raw)?),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// 执行一次文档级批量读取
pub async fn read_document<S, T>(session: &S, fields: &[FieldSpec]) -> AppResult<T>
where
    S: RenderingSession,
    T: DeserializeOwned,
{
    let value = session.evaluate_structured(&document_script(fields)).await?;
    decode(value)
}

/// 执行一次逐节点批量读取
pub async fn read_each<S, T>(session: &S, root_selector: &str, fields: &[FieldSpec]) -> AppResult<Vec<T>>
where
    S: RenderingSession,
    T: DeserializeOwned,
{
    let value = session
        .evaluate_structured(&per_node_script(root_selector, fields))
        .await?;
    decode(value)
}

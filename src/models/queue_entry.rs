//! 工作队列条目

use serde::{Deserialize, Serialize};

/// 入队优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    /// 追加到队尾
    #[default]
    Normal,
    /// 插到队首：详情任务优先于继续发现列表
    Front,
}

/// 条目标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryLabel {
    Listing,
    Detail,
}

/// 条目附带的业务数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub label: EntryLabel,
    /// 发现该条目的搜索上下文
    pub search_string: String,
    /// 列表中是否标注为广告
    #[serde(default)]
    pub is_advertisement: bool,
    /// 在完整列表中的位置（从 0 开始）
    #[serde(default)]
    pub rank: Option<u64>,
}

/// 工作队列条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub url: String,
    /// 去重键；为空时使用 url 去重
    #[serde(default, rename = "uniqueKey")]
    pub dedup_key: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub user_data: UserData,
}

impl QueueEntry {
    /// 详情条目（插到队首）
    pub fn detail(
        url: impl Into<String>,
        dedup_key: impl Into<String>,
        search_string: impl Into<String>,
        is_advertisement: bool,
        rank: u64,
    ) -> Self {
        Self {
            url: url.into(),
            dedup_key: Some(dedup_key.into()),
            priority: Priority::Front,
            user_data: UserData {
                label: EntryLabel::Detail,
                search_string: search_string.into(),
                is_advertisement,
                rank: Some(rank),
            },
        }
    }

    /// 队列实际使用的去重键
    pub fn effective_key(&self) -> &str {
        match self.dedup_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => &self.url,
        }
    }
}

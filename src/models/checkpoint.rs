//! 列表遍历检查点
//!
//! 记录"最后一个处理完成的分页区间"，崩溃后重启时跳过已完成的分页。

use serde::{Deserialize, Serialize};

/// 检查点存储键前缀
pub const LISTING_STATE_KEY_PREFIX: &str = "listingState";

/// 列表遍历检查点
///
/// 不变量：`from` 和 `to` 同时存在时 `from <= to`；
/// `is_finished` 只在观察到最后一页之后才会置为 true。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCheckpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
    #[serde(default, rename = "isFinish")]
    pub is_finished: bool,
}

impl ListingCheckpoint {
    /// 存储键，按列表会话隔离
    pub fn storage_key(session_key: &str) -> String {
        format!("{}-{}", LISTING_STATE_KEY_PREFIX, session_key)
    }

    /// 该分页是否在之前的运行中已经处理过
    ///
    /// 使用 `<=`：起始位置不大于已记录起始位置的分页都视为已完成。
    pub fn covers(&self, page_from: u64) -> bool {
        matches!(self.from, Some(done) if page_from <= done)
    }

    /// 记录一个处理（或跳过）完成的分页区间，只向前推进
    pub fn advance(&mut self, from: u64, to: u64) {
        let to = to.max(from);
        if self.from.map_or(true, |done| from > done) {
            self.from = Some(from);
            self.to = Some(to);
        }
    }

    pub fn mark_finished(&mut self) {
        self.is_finished = true;
    }
}

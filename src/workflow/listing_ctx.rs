//! 列表遍历上下文
//!
//! 封装"我正在为哪个搜索遍历列表、最多抓多少个"这一信息

use std::fmt::Display;

use crate::config::Config;

/// 列表遍历上下文
#[derive(Debug, Clone)]
pub struct ListingCtx {
    /// 列表会话键（检查点命名空间）
    pub session_key: String,

    /// 搜索关键词
    pub search_string: String,

    /// 最多入队的条目数量
    pub item_budget: Option<u64>,
}

impl ListingCtx {
    pub fn new(session_key: String, search_string: String, item_budget: Option<u64>) -> Self {
        Self {
            session_key,
            search_string,
            item_budget,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session_key(),
            config.search_string.clone(),
            config.max_crawled_places,
        )
    }

    /// 该排名的条目入队后是否已经用完预算
    pub fn budget_exhausted_at(&self, rank: u64) -> bool {
        matches!(self.item_budget, Some(budget) if rank + 1 > budget)
    }

    /// 当前分页的末尾是否已经覆盖预算
    pub fn budget_covered_by(&self, page_to: u64) -> bool {
        matches!(self.item_budget, Some(budget) if budget <= page_to)
    }
}

impl Display for ListingCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[列表 {}]", self.search_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_boundaries() {
        let ctx = ListingCtx::new("pubs".to_string(), "pubs".to_string(), Some(5));
        assert!(!ctx.budget_exhausted_at(4));
        assert!(ctx.budget_exhausted_at(5));
        assert!(ctx.budget_covered_by(5));
        assert!(!ctx.budget_covered_by(4));

        let unlimited = ListingCtx::new("pubs".to_string(), "pubs".to_string(), None);
        assert!(!unlimited.budget_exhausted_at(10_000));
        assert!(!unlimited.budget_covered_by(10_000));
    }
}

//! 地点详情数据模型

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 某一小时的热门程度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourOccupancy {
    pub hour: u8,
    pub occupancy_percent: u8,
}

/// 星期，按页面图表的顺序（从周日开始）排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Su,
    Mo,
    Tu,
    We,
    Th,
    Fr,
    Sa,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Su,
        Weekday::Mo,
        Weekday::Tu,
        Weekday::We,
        Weekday::Th,
        Weekday::Fr,
        Weekday::Sa,
    ];
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 热门时段直方图：星期（Su..Sa）→ 按小时排列的热门程度
pub type PopularTimesHistogram = BTreeMap<Weekday, Vec<HourOccupancy>>;

/// 单条评论
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub name: String,
    pub text: String,
    pub stars: String,
    pub publish_at: String,
    pub likes_count: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_from_owner_text: Option<String>,
}

/// 地点详情记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub url: String,
    pub title: String,
    pub total_score: String,
    pub category_name: String,
    pub address: String,
    pub plus_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popular_times_histogram: Option<PopularTimesHistogram>,
    pub reviews: Vec<Review>,
    pub image_urls: Vec<String>,
    pub search_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
    pub is_advertisement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl PlaceRecord {
    /// 是否有评分（决定是否抓取评论）
    pub fn has_rating(&self) -> bool {
        !self.total_score.trim().is_empty()
    }
}

/// 多次重试后仍然失败的条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRecord {
    pub url: String,
    pub succeeded: bool,
    pub errors: Vec<String>,
}

impl FailedRecord {
    pub fn new(url: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            url: url.into(),
            succeeded: false,
            errors,
        }
    }
}

/// 数据集中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetItem {
    Failed(FailedRecord),
    Place(Box<PlaceRecord>),
}

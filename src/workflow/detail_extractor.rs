//! 详情提取 - 流程层
//!
//! 核心职责：在详情页上读出完整的地点记录
//!
//! 流程顺序：
//! 1. 平铺字段（一次批量读取）
//! 2. 热门时段直方图（如果有）
//! 3. 评论（有评分且开启时）：打开面板 → 按最新排序 → 全部加载 → 展开 → 批量读取 → 返回
//! 4. 图片（有入口且开启时）：打开画廊 → 全部加载 → 读取地址
//!
//! 整体超时由调用方控制。

use chrono::Utc;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::{Config, Timeouts};
use crate::error::{AppError, AppResult};
use crate::infrastructure::wait::wait_for_selector;
use crate::infrastructure::RenderingSession;
use crate::models::{PlaceRecord, QueueEntry, Review};
use crate::selectors;
use crate::services::field_extractor::{self, GALLERY_FIELDS, PLACE_FIELDS, REVIEW_FIELDS};
use crate::services::{popular_times, CollectionLoader};
use crate::utils::text::{parse_background_image_url, parse_first_int};

/// 平铺字段的读取结果
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FlatPlaceFields {
    title: String,
    total_score: String,
    category_name: String,
    address: String,
    plus_code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GalleryTile {
    style: String,
}

/// 详情提取流程
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    include_reviews: bool,
    include_images: bool,
    max_reveal_iterations: usize,
    timeouts: Timeouts,
    loader: CollectionLoader,
}

impl DetailExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            include_reviews: config.include_reviews,
            include_images: config.include_images,
            max_reveal_iterations: config.max_reveal_iterations,
            timeouts: config.timeouts.clone(),
            loader: CollectionLoader::new(config.timeouts.reveal_settle),
        }
    }

    /// 提取当前详情页；会话应当已经打开 `entry.url`
    pub async fn extract<S: RenderingSession>(&self, session: &S, entry: &QueueEntry) -> AppResult<PlaceRecord> {
        let t = &self.timeouts;
        let tag = entry.user_data.rank.map_or_else(|| "-".to_string(), |rank| rank.to_string());

        wait_for_selector(session, selectors::DETAIL_TITLE, t.default_wait, t.poll_interval).await?;
        let flat: FlatPlaceFields = field_extractor::read_document(session, PLACE_FIELDS).await?;
        info!("[地点 {}] 📍 {}", tag, flat.title);

        let mut record = PlaceRecord {
            url: entry.url.clone(),
            title: flat.title,
            total_score: flat.total_score,
            category_name: flat.category_name,
            address: flat.address,
            plus_code: flat.plus_code,
            search_string: entry.user_data.search_string.clone(),
            rank: entry.user_data.rank,
            is_advertisement: entry.user_data.is_advertisement,
            ..Default::default()
        };

        if session.query_one(selectors::POPULAR_TIMES).await?.is_some() {
            let histogram = popular_times::read_histogram(session).await?;
            debug!("[地点 {}] 热门时段: {} 天", tag, histogram.len());
            record.popular_times_histogram = Some(histogram);
        }

        if self.include_reviews && record.has_rating() {
            record.reviews_count = self.read_reviews_count(session).await?;
            record.reviews = self.scrape_reviews(session, &tag).await?;
            info!("[地点 {}] 💬 评论 {} 条", tag, record.reviews.len());
        }

        wait_for_selector(session, selectors::DETAIL_TITLE, t.default_wait, t.poll_interval).await?;
        if self.include_images {
            if let Some(button) = session.query_one(selectors::IMAGES_BUTTON).await? {
                record.image_urls = self.scrape_images(session, &button).await?;
                info!("[地点 {}] 🖼️ 图片 {} 张", tag, record.image_urls.len());
            }
        }

        record.scraped_at = Some(Utc::now());
        Ok(record)
    }

    async fn read_reviews_count<S: RenderingSession>(&self, session: &S) -> AppResult<Option<u64>> {
        let Some(button) = session.query_one(selectors::REVIEWS_BUTTON).await? else {
            return Ok(None);
        };
        let text = session.inner_text(&button).await?.unwrap_or_default();
        // 千位分隔符因地区而异
        let digits: String = text
            .chars()
            .filter(|c| !matches!(c, ',' | '.' | '\u{a0}' | '\u{202f}'))
            .collect();
        Ok(parse_first_int(&digits))
    }

    async fn scrape_reviews<S: RenderingSession>(&self, session: &S, tag: &str) -> AppResult<Vec<Review>> {
        let t = &self.timeouts;

        if session.query_one(selectors::CONSENT_DIALOG).await?.is_some() {
            if let Some(later) = session.query_one(selectors::CONSENT_LATER).await? {
                debug!("[地点 {}] 关闭同意对话框", tag);
                session.click(&later).await?;
            }
        }

        wait_for_selector(session, selectors::REVIEWS_BUTTON, t.default_wait, t.poll_interval).await?;
        let button = session
            .query_one(selectors::REVIEWS_BUTTON)
            .await?
            .ok_or_else(|| AppError::transient("评论按钮消失了"))?;
        session.activate(&button).await?;
        wait_for_selector(session, selectors::RATING, t.default_wait, t.poll_interval).await?;
        sleep(t.panel_settle).await;

        if let Err(e) = self.sort_by_newest(session).await {
            debug!("[地点 {}] 无法按最新排序评论: {}", tag, e);
        }

        if let Some(scrollbox) = session.query_one(selectors::SCROLLBOX).await? {
            let outcome = self
                .loader
                .reveal_all(session, &scrollbox, self.max_reveal_iterations)
                .await?;
            debug!("[地点 {}] 评论加载: {:?}", tag, outcome);
        }

        self.expand_reviews(session).await?;
        let reviews: Vec<Review> =
            field_extractor::read_each(session, selectors::REVIEW, REVIEW_FIELDS).await?;

        if let Some(back) = session.query_one(selectors::PANEL_BACK).await? {
            session.click(&back).await?;
        }

        Ok(reviews.into_iter().map(clean_review).collect())
    }

    /// 排序菜单第一次点击经常不生效，连点三次再选"最新"
    async fn sort_by_newest<S: RenderingSession>(&self, session: &S) -> AppResult<()> {
        let t = &self.timeouts;
        for _ in 0..3 {
            let button = session
                .query_one(selectors::REVIEWS_SORT_BUTTON)
                .await?
                .ok_or_else(|| AppError::transient("找不到评论排序按钮"))?;
            session.click(&button).await?;
            sleep(t.interaction_settle).await;
        }
        wait_for_selector(session, selectors::REVIEWS_SORT_NEWEST, t.panel_settle, t.poll_interval).await?;
        let newest = session
            .query_one(selectors::REVIEWS_SORT_NEWEST)
            .await?
            .ok_or_else(|| AppError::transient("找不到\"最新\"排序选项"))?;
        session.click(&newest).await
    }

    async fn expand_reviews<S: RenderingSession>(&self, session: &S) -> AppResult<()> {
        let mut expanded = 0;
        for review in session.query(selectors::REVIEW).await? {
            if let Some(more) = session.query_within(&review, selectors::REVIEW_EXPAND).await? {
                session.click(&more).await?;
                expanded += 1;
            }
        }
        if expanded > 0 {
            sleep(self.timeouts.interaction_settle).await;
        }
        Ok(())
    }

    async fn scrape_images<S: RenderingSession>(&self, session: &S, button: &S::Handle) -> AppResult<Vec<String>> {
        let t = &self.timeouts;
        session.activate(button).await?;
        wait_for_selector(session, selectors::SCROLLBOX, t.default_wait, t.poll_interval).await?;
        if let Some(scrollbox) = session.query_one(selectors::SCROLLBOX).await? {
            self.loader
                .reveal_all(session, &scrollbox, self.max_reveal_iterations)
                .await?;
        }

        let tiles: Vec<GalleryTile> =
            field_extractor::read_each(session, selectors::GALLERY_IMAGE, GALLERY_FIELDS).await?;
        Ok(tiles
            .iter()
            .filter_map(|tile| parse_background_image_url(&tile.style))
            .collect())
    }
}

fn clean_review(mut review: Review) -> Review {
    review.response_from_owner_text = review
        .response_from_owner_text
        .filter(|text| !text.trim().is_empty());
    review
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_review_drops_empty_owner_response() {
        let review = Review {
            response_from_owner_text: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(clean_review(review).response_from_owner_text, None);

        let review = Review {
            response_from_owner_text: Some("Thanks!".to_string()),
            ..Default::default()
        };
        assert_eq!(
            clean_review(review).response_from_owner_text.as_deref(),
            Some("Thanks!")
        );
    }

    #[test]
    fn test_flat_fields_tolerate_missing_keys() {
        let flat: FlatPlaceFields =
            field_extractor::decode(serde_json::json!({"title": "U Fleku", "totalScore": "4.3"})).unwrap();
        assert_eq!(flat.title, "U Fleku");
        assert_eq!(flat.address, "");
    }
}

//! 测试用的假地图页面
//!
//! 按脚本模拟搜索框、分页列表、详情页、评论面板和图片画廊，
//! 让遍历 / 入队 / 提取逻辑可以在没有浏览器的情况下运行。

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use place_crawler::config::{Config, Timeouts};
use place_crawler::error::{AppError, AppResult};
use place_crawler::models::Review;
use place_crawler::selectors as sel;
use place_crawler::{RenderingSession, SessionFactory};

/// 很短的等待时长，超时测试不需要等很久
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        default_wait: Duration::from_millis(200),
        detail_marker: Duration::from_millis(100),
        back_control: Duration::from_millis(20),
        poll_interval: Duration::from_millis(1),
        search_settle: Duration::from_millis(1),
        enqueue_settle: Duration::from_millis(1),
        reveal_settle: Duration::from_millis(1),
        interaction_settle: Duration::from_millis(1),
        panel_settle: Duration::from_millis(20),
        navigation: Duration::from_millis(200),
        item: Duration::from_millis(500),
    }
}

pub fn test_config(search: &str) -> Config {
    Config {
        search_string: search.to_string(),
        max_concurrency: 1,
        max_request_retries: 1,
        max_listing_attempts: 3,
        retire_session_after: 2,
        max_reveal_iterations: 10,
        timeouts: fast_timeouts(),
        ..Default::default()
    }
}

/// 列表中的一个地点
#[derive(Debug, Clone, PartialEq)]
pub struct FakePlace {
    pub token: String,
    pub plus_code: String,
    pub sponsored: bool,
}

impl FakePlace {
    pub fn numbered(n: usize) -> Self {
        Self {
            token: format!("Place+{}", n),
            plus_code: format!("PC{}", n),
            sponsored: n % 7 == 3,
        }
    }

    pub fn url(&self) -> String {
        format!("https://www.google.com/maps/place/{}/@50.08,14.42,17z", self.token)
    }

    pub fn dedup_key(&self) -> String {
        format!("{}{}", self.token, self.plus_code)
    }
}

/// 详情页内容（所有地点共用）
#[derive(Debug, Clone)]
pub struct FakeDetail {
    pub total_score: String,
    pub category: String,
    pub address: String,
    pub with_histogram: bool,
    pub consent_dialog: bool,
    pub reviews_label: String,
    pub reviews: Vec<Review>,
    pub image_styles: Vec<String>,
    /// 滚动容器的最大高度
    pub scroll_cap: u64,
}

impl Default for FakeDetail {
    fn default() -> Self {
        Self {
            total_score: "4.4".to_string(),
            category: "Pub".to_string(),
            address: "Křemencova 11, Praha".to_string(),
            with_histogram: true,
            consent_dialog: true,
            reviews_label: "1,234 reviews".to_string(),
            reviews: vec![
                Review {
                    name: "Ann".to_string(),
                    text: "Great beer".to_string(),
                    stars: "5 stars".to_string(),
                    publish_at: "a week ago".to_string(),
                    likes_count: "3".to_string(),
                    response_from_owner_text: Some("Thanks!".to_string()),
                },
                Review {
                    name: "Bob".to_string(),
                    text: "Crowded".to_string(),
                    stars: "3 stars".to_string(),
                    publish_at: "a month ago".to_string(),
                    likes_count: String::new(),
                    response_from_owner_text: Some(String::new()),
                },
            ],
            image_styles: vec![
                r#"background-image: url("//lh5.googleusercontent.com/p/a=w400")"#.to_string(),
                r#"background-image: url("https://lh5.googleusercontent.com/p/b=w400")"#.to_string(),
                "background-color: grey".to_string(),
            ],
            scroll_cap: 400,
        }
    }
}

/// 返回列表后条目逐渐渲染：前 `polls` 次查询标题时只有 `visible` 个条目
#[derive(Debug, Clone, Copy)]
pub struct LateRender {
    pub visible: usize,
    pub polls: usize,
}

/// 页面脚本
#[derive(Debug, Clone)]
pub struct FakeScript {
    pub pages: Vec<Vec<FakePlace>>,
    pub page_size: u64,
    pub single_detail: Option<FakePlace>,
    pub nothing_found: bool,
    pub pagination_missing: bool,
    /// 前几次点击条目标题不会打开详情页
    pub stubborn_clicks: usize,
    /// 打开这么多个详情页之后，返回列表失效
    pub break_back_after: Option<usize>,
    /// 前几个打开的会话会出现返回列表失效
    pub sessions_to_break: Arc<AtomicUsize>,
    /// 导航到这些地点时永远不返回
    pub stall_tokens: Vec<String>,
    pub late_render: Option<LateRender>,
    pub detail: FakeDetail,
}

impl FakeScript {
    /// 按每页条目数生成列表，排名连续编号
    pub fn listing(page_lengths: &[usize], page_size: u64) -> Self {
        let mut next = 0;
        let pages = page_lengths
            .iter()
            .map(|&len| {
                let page = (next..next + len).map(FakePlace::numbered).collect();
                next += page_size as usize;
                page
            })
            .collect();
        Self {
            pages,
            page_size,
            single_detail: None,
            nothing_found: false,
            pagination_missing: false,
            stubborn_clicks: 0,
            break_back_after: None,
            sessions_to_break: Arc::new(AtomicUsize::new(0)),
            stall_tokens: Vec::new(),
            late_render: None,
            detail: FakeDetail::default(),
        }
    }

    pub fn single(place: FakePlace) -> Self {
        Self {
            single_detail: Some(place),
            ..Self::listing(&[], 20)
        }
    }

    pub fn all_places(&self) -> Vec<FakePlace> {
        self.pages.iter().flatten().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Start,
    Listing,
    Detail,
    Panel,
    Gallery,
}

#[derive(Debug)]
struct FakeState {
    view: View,
    page: usize,
    typed: String,
    current: Option<FakePlace>,
    stubborn_clicks: usize,
    opened_details: usize,
    consent_open: bool,
    sort_clicks: usize,
    extent: u64,
    /// 列表还要经过多少次标题查询才完整渲染
    render_polls_left: usize,
    title_polls: usize,
    events: Vec<String>,
}

/// 元素句柄：选择器 + 下标
#[derive(Debug, Clone, PartialEq)]
pub struct FakeHandle {
    pub selector: String,
    pub index: usize,
}

/// 假地图会话
pub struct FakeMaps {
    script: FakeScript,
    broken: bool,
    state: Mutex<FakeState>,
    closed: Arc<AtomicUsize>,
}

impl FakeMaps {
    pub fn new(script: FakeScript) -> Self {
        Self::with_close_counter(script, false, Arc::new(AtomicUsize::new(0)))
    }

    fn with_close_counter(script: FakeScript, broken: bool, closed: Arc<AtomicUsize>) -> Self {
        let state = FakeState {
            view: View::Start,
            page: 0,
            typed: String::new(),
            current: None,
            stubborn_clicks: script.stubborn_clicks,
            opened_details: 0,
            consent_open: script.detail.consent_dialog,
            sort_clicks: 0,
            extent: 100,
            render_polls_left: 0,
            title_polls: 0,
            events: Vec::new(),
        };
        Self {
            script,
            broken,
            state: Mutex::new(state),
            closed,
        }
    }

    /// 直接停在第 `page` 页列表上（跳过搜索）
    pub fn at_listing(script: FakeScript, page: usize) -> Self {
        let maps = Self::new(script);
        {
            let mut state = maps.state.lock().unwrap();
            state.view = View::Listing;
            state.page = page;
        }
        maps
    }

    /// 该会话上返回列表会失效（需要同时设置 `break_back_after`）
    pub fn with_broken_back(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn view(&self) -> View {
        self.state.lock().unwrap().view
    }

    /// 列表标题被查询（轮询）的次数
    pub fn title_polls(&self) -> usize {
        self.state.lock().unwrap().title_polls
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    fn back_broken(&self, state: &FakeState) -> bool {
        match self.script.break_back_after {
            Some(limit) => self.broken && state.opened_details > limit,
            None => false,
        }
    }

    fn back_to_listing(&self, state: &mut FakeState) {
        state.view = View::Listing;
        state.render_polls_left = self.script.late_render.map_or(0, |r| r.polls);
    }

    fn page_range(&self, page: usize) -> (u64, u64) {
        let from = page as u64 * self.script.page_size + 1;
        let len = self.script.pages.get(page).map_or(0, Vec::len) as u64;
        (from, from + len.saturating_sub(1))
    }

    fn count(&self, state: &FakeState, selector: &str) -> usize {
        let detail = &self.script.detail;
        let has_rating = !detail.total_score.is_empty();
        let in_detail = state.view == View::Detail;
        let listing_len = if state.view == View::Listing {
            let full = self.script.pages.get(state.page).map_or(0, Vec::len);
            match self.script.late_render {
                Some(render) if state.render_polls_left > 0 => full.min(render.visible),
                _ => full,
            }
        } else {
            0
        };
        let flag = |present: bool| usize::from(present);

        match selector {
            s if s == sel::SEARCH_INPUT || s == sel::SEARCH_BUTTON => 1,
            s if s == sel::SEARCH_BOX_CLASS => flag(matches!(state.view, View::Start | View::Listing)),
            s if s == sel::LISTING_ITEM || s == sel::LISTING_ITEM_TITLE => listing_len,
            s if s == sel::PAGINATION_NEXT => {
                flag(state.view == View::Listing && !self.script.pagination_missing)
            }
            s if s == sel::PAGINATION_RANGE => flag(state.view == View::Listing),
            s if s == sel::DETAIL_TITLE || s == sel::BACK_TO_LIST => flag(in_detail),
            s if s == sel::PLUS_CODE => flag(
                in_detail
                    && state
                        .current
                        .as_ref()
                        .is_some_and(|p| !p.plus_code.is_empty()),
            ),
            s if s == sel::POPULAR_TIMES => flag(in_detail && detail.with_histogram),
            s if s == sel::REVIEWS_BUTTON => flag(in_detail && has_rating),
            s if s == sel::RATING => flag((in_detail && has_rating) || state.view == View::Panel),
            s if s == sel::CONSENT_DIALOG || s == sel::CONSENT_LATER => {
                flag(in_detail && state.consent_open)
            }
            s if s == sel::REVIEWS_SORT_BUTTON || s == sel::PANEL_BACK => {
                flag(state.view == View::Panel)
            }
            s if s == sel::REVIEWS_SORT_NEWEST => {
                flag(state.view == View::Panel && state.sort_clicks > 0)
            }
            s if s == sel::SCROLLBOX => flag(matches!(state.view, View::Panel | View::Gallery)),
            s if s == sel::REVIEW => {
                if state.view == View::Panel {
                    detail.reviews.len()
                } else {
                    0
                }
            }
            s if s == sel::IMAGES_BUTTON => flag(in_detail && !detail.image_styles.is_empty()),
            s if s == sel::GALLERY_IMAGE => {
                if state.view == View::Gallery {
                    detail.image_styles.len()
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn press(&self, handle: &FakeHandle) {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("press:{}", handle.selector));
        let s = handle.selector.as_str();

        if s == sel::ITEM_TITLE {
            if state.stubborn_clicks > 0 {
                state.stubborn_clicks -= 1;
                return;
            }
            let place = self.script.pages[state.page][handle.index].clone();
            state.opened_details += 1;
            state.current = Some(place);
            state.view = View::Detail;
        } else if s == sel::SEARCH_BUTTON {
            if self.script.nothing_found || state.typed.is_empty() {
                return;
            }
            if let Some(place) = &self.script.single_detail {
                state.current = Some(place.clone());
                state.view = View::Detail;
            } else {
                state.view = View::Listing;
                state.page = 0;
            }
        } else if s == sel::PAGINATION_NEXT {
            if state.page + 1 < self.script.pages.len() {
                state.page += 1;
            }
        } else if s == sel::BACK_TO_LIST {
            if !self.back_broken(&state) {
                self.back_to_listing(&mut state);
            }
        } else if s == sel::CONSENT_LATER {
            state.consent_open = false;
        } else if s == sel::REVIEWS_BUTTON {
            state.view = View::Panel;
            state.extent = 100;
        } else if s == sel::REVIEWS_SORT_BUTTON {
            state.sort_clicks += 1;
        } else if s == sel::PANEL_BACK {
            state.view = View::Detail;
        } else if s == sel::IMAGES_BUTTON {
            state.view = View::Gallery;
            state.extent = 100;
        }
    }

    fn structured(&self, script: &str) -> JsonValue {
        let detail = &self.script.detail;
        let state = self.state.lock().unwrap();
        let value = if script.contains(sel::POPULAR_TIMES_GRAPH) {
            json!([
                {"labels": ["6a", "9a", "12p"], "bars": ["Usually 10% busy", "Usually 20% busy"]},
                {"labels": ["11p"], "bars": ["5% busy", "15% busy", "25% busy"]},
            ])
        } else if script.contains("pick(document)") {
            let title = state
                .current
                .as_ref()
                .map(|p| p.token.replace('+', " "))
                .unwrap_or_default();
            json!({
                "title": title,
                "totalScore": detail.total_score,
                "categoryName": detail.category,
                "address": detail.address,
                "plusCode": state.current.as_ref().map(|p| p.plus_code.clone()).unwrap_or_default(),
            })
        } else if script.contains(sel::GALLERY_IMAGE) {
            JsonValue::Array(
                detail
                    .image_styles
                    .iter()
                    .map(|style| json!({ "style": style }))
                    .collect(),
            )
        } else if script.contains(sel::REVIEW) {
            serde_json::to_value(&detail.reviews).unwrap_or_default()
        } else {
            JsonValue::Null
        };
        // 真实浏览器里脚本返回的是 JSON 字符串
        JsonValue::String(value.to_string())
    }
}

#[async_trait]
impl RenderingSession for FakeMaps {
    type Handle = FakeHandle;

    async fn navigate(&self, url: &str) -> AppResult<()> {
        let stalled = self
            .script
            .stall_tokens
            .iter()
            .any(|token| url.contains(&format!("/place/{}/", token)));
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let mut state = self.state.lock().unwrap();
        state.events.push(format!("navigate:{}", url));
        let place = self
            .script
            .all_places()
            .into_iter()
            .chain(self.script.single_detail.clone())
            .find(|p| url.contains(&format!("/place/{}/", p.token)));
        match place {
            Some(place) => {
                state.current = Some(place);
                state.view = View::Detail;
            }
            None => {
                state.current = None;
                state.view = View::Start;
                state.page = 0;
            }
        }
        Ok(())
    }

    async fn query(&self, selector: &str) -> AppResult<Vec<FakeHandle>> {
        let mut state = self.state.lock().unwrap();
        let count = self.count(&state, selector);
        if selector == sel::LISTING_ITEM_TITLE {
            state.title_polls += 1;
            state.render_polls_left = state.render_polls_left.saturating_sub(1);
        }
        Ok((0..count)
            .map(|index| FakeHandle {
                selector: selector.to_string(),
                index,
            })
            .collect())
    }

    async fn query_within(&self, scope: &FakeHandle, selector: &str) -> AppResult<Option<FakeHandle>> {
        let state = self.state.lock().unwrap();
        let found = if scope.selector == sel::LISTING_ITEM && state.view == View::Listing {
            let place = self
                .script
                .pages
                .get(state.page)
                .and_then(|page| page.get(scope.index));
            match place {
                Some(_) if selector == sel::ITEM_TITLE => true,
                Some(place) if selector == sel::ITEM_SPONSORED_BADGE => place.sponsored,
                _ => false,
            }
        } else {
            scope.selector == sel::REVIEW && selector == sel::REVIEW_EXPAND && scope.index % 2 == 0
        };
        Ok(found.then(|| FakeHandle {
            selector: selector.to_string(),
            index: scope.index,
        }))
    }

    async fn type_text(&self, handle: &FakeHandle, text: &str) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("type:{}:{}", handle.selector, text));
        state.typed.push_str(text);
        Ok(())
    }

    async fn click(&self, handle: &FakeHandle) -> AppResult<()> {
        self.press(handle);
        Ok(())
    }

    async fn activate(&self, handle: &FakeHandle) -> AppResult<()> {
        self.press(handle);
        Ok(())
    }

    async fn go_back(&self) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push("go_back".to_string());
        if !self.back_broken(&state) && state.view == View::Detail {
            self.back_to_listing(&mut state);
        }
        Ok(())
    }

    async fn current_url(&self) -> AppResult<String> {
        let state = self.state.lock().unwrap();
        Ok(match (&state.view, &state.current) {
            (View::Detail | View::Panel | View::Gallery, Some(place)) => place.url(),
            _ => format!("https://www.google.com/maps/search/{}", state.typed),
        })
    }

    async fn inner_text(&self, handle: &FakeHandle) -> AppResult<Option<String>> {
        let state = self.state.lock().unwrap();
        let s = handle.selector.as_str();
        Ok(if s == sel::PAGINATION_RANGE {
            let (from, to) = self.page_range(state.page);
            Some(format!("Showing results {}–{}", from, to))
        } else if s == sel::PLUS_CODE {
            state.current.as_ref().map(|p| p.plus_code.clone())
        } else if s == sel::REVIEWS_BUTTON {
            Some(self.script.detail.reviews_label.clone())
        } else {
            None
        })
    }

    async fn attribute(&self, handle: &FakeHandle, name: &str) -> AppResult<Option<String>> {
        let state = self.state.lock().unwrap();
        let last_page = state.page + 1 >= self.script.pages.len();
        Ok((handle.selector == sel::PAGINATION_NEXT && name == "disabled" && last_page)
            .then(|| "true".to_string()))
    }

    async fn evaluate_structured(&self, script: &str) -> AppResult<JsonValue> {
        Ok(self.structured(script))
    }

    async fn scroll_container(&self, handle: &FakeHandle) -> AppResult<()> {
        if handle.selector != sel::SCROLLBOX {
            return Err(AppError::transient("不是可滚动容器"));
        }
        let mut state = self.state.lock().unwrap();
        state.extent = (state.extent + 100).min(self.script.detail.scroll_cap);
        state.events.push("scroll".to_string());
        Ok(())
    }

    async fn scroll_extent(&self, _handle: &FakeHandle) -> AppResult<u64> {
        Ok(self.state.lock().unwrap().extent)
    }

    async fn close(&self) -> AppResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 每次打开都得到一个全新的假页面
pub struct FakeFactory {
    pub script: FakeScript,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(script: FakeScript) -> Self {
        Self {
            script,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeMaps;

    async fn open(&self) -> AppResult<FakeMaps> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let broken = self
            .script
            .sessions_to_break
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(FakeMaps::with_close_counter(
            self.script.clone(),
            broken,
            Arc::clone(&self.closed),
        ))
    }
}

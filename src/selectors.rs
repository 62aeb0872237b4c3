//! 页面选择器
//!
//! 页面结构一旦改版，只需要改这里。

// ---------- 搜索 ----------
pub const SEARCH_BOX_LOADING: &str = "#searchbox.loading";
pub const SEARCH_BOX_CLASS: &str = ".searchbox";
pub const SEARCH_INPUT: &str = "#searchboxinput";
pub const SEARCH_BUTTON: &str = "#searchbox-searchbutton";

// ---------- 列表 ----------
pub const LISTING_ITEM: &str = ".section-result";
pub const LISTING_ITEM_TITLE: &str = ".section-result h3";
pub const ITEM_TITLE: &str = "h3";
pub const ITEM_SPONSORED_BADGE: &str = ".section-result-ad-indicator";
pub const PAGINATION_NEXT: &str = "[jsaction=\"pane.paginationSection.nextPage\"]";
pub const PAGINATION_RANGE: &str = ".n7lv7yjyC35__root";
pub const NO_RESULTS: &str = ".section-no-result-title";

// ---------- 详情 ----------
pub const DETAIL_TITLE: &str = "h1.section-hero-header-title";
pub const BACK_TO_LIST: &str = ".section-back-to-list-button";
pub const RATING: &str = "span.section-star-display";
pub const CATEGORY: &str = "[jsaction=\"pane.rating.category\"]";
pub const ADDRESS: &str = "[data-section-id=\"ad\"] .widget-pane-link";
pub const PLUS_CODE: &str = "[data-section-id=\"ol\"] .widget-pane-link";

// ---------- 热门时段 ----------
pub const POPULAR_TIMES: &str = ".section-popular-times";
pub const POPULAR_TIMES_GRAPH: &str = ".section-popular-times-graph";
pub const POPULAR_TIMES_LABEL: &str = ".section-popular-times-label";
pub const POPULAR_TIMES_BAR: &str = ".section-popular-times-bar";

// ---------- 评论 ----------
pub const CONSENT_DIALOG: &str = ".widget-consent-dialog";
pub const CONSENT_LATER: &str = ".widget-consent-dialog .widget-consent-button-later";
pub const REVIEWS_BUTTON: &str = "button[jsaction=\"pane.reviewChart.moreReviews\"]";
pub const REVIEWS_SORT_BUTTON: &str = ".section-tab-info-stats-button-flex";
pub const REVIEWS_SORT_NEWEST: &str = ".context-menu-entry[data-index=\"1\"]";
pub const SCROLLBOX: &str = ".section-scrollbox.section-listbox";
pub const REVIEW: &str = "div.section-review";
pub const REVIEW_EXPAND: &str = ".section-expand-review";
pub const REVIEW_AUTHOR: &str = ".section-review-title";
pub const REVIEW_TEXT: &str = ".section-review-review-content .section-review-text";
pub const REVIEW_STARS: &str = ".section-review-stars";
pub const REVIEW_PUBLISHED: &str = ".section-review-publish-date";
pub const REVIEW_LIKES: &str = ".section-review-thumbs-up-count";
pub const REVIEW_OWNER_RESPONSE: &str = ".section-review-owner-response .section-review-text";
pub const PANEL_BACK: &str = "button.section-header-back-button";

// ---------- 图片 ----------
pub const IMAGES_BUTTON: &str = "[jsaction=\"pane.imagepack.button\"]";
pub const GALLERY_IMAGE: &str = ".gallery-image-high-res";

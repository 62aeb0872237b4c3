//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `crawl_runner` - 抓取入口
//! - 管理应用生命周期（初始化、运行、统计）
//! - 组装本地存储（检查点、队列、数据集）和浏览器会话工厂
//! - 让列表遍历和详情 worker 池并行运行
//!
//! ### `listing_driver` - 列表遍历驱动
//! - 有上限的整体重试，每次尝试使用新的会话
//!
//! ### `detail_pool` - 详情 worker 池
//! - 每个 worker 一个会话，单条超时，失败重试，会话轮换
//!
//! ## 层次关系
//!
//! ```text
//! crawl_runner
//!     ├── listing_driver → workflow::ListingWalker → workflow::DetailEnqueuer
//!     └── detail_pool    → workflow::DetailExtractor
//!                              ↓
//!                          services (加载 / 字段读取 / 直方图)
//!                              ↓
//!                          infrastructure (RenderingSession / wait)
//! ```
//!
//! 只有编排层打开和关闭浏览器会话；流程层只借用会话。

pub mod crawl_runner;
pub mod detail_pool;
pub mod listing_driver;

pub use crawl_runner::{crawl, App, CrawlStats};
pub use detail_pool::{DetailPool, PoolSettings, PoolStats};
pub use listing_driver::ListingDriver;

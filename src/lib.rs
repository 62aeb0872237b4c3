//! # Place Crawler
//!
//! 从地图搜索结果中发现地点，逐个入队，再并行提取每个地点的详情
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器 Page），只暴露能力
//! - `RenderingSession` - 渲染会话抽象，`ChromeSession` 是 chromiumoxide 实现
//! - `wait` - 有上限的等待原语
//!
//! ### ② 存储层（Storage）
//! - `storage/` - 检查点、工作队列、结果数据集，核心只依赖 trait
//!
//! ### ③ 业务能力层（Services）
//! - `CollectionLoader` - 滚动加载评论 / 图片
//! - `field_extractor` - 声明式字段表，一次读出多个字段
//! - `popular_times` - 热门时段直方图
//!
//! ### ④ 流程层（Workflow）
//! - `ListingWalker` - 搜索、翻页、保存检查点
//! - `DetailEnqueuer` - 打开条目、生成去重键、入队、返回列表
//! - `DetailExtractor` - 读取单个地点的完整记录
//!
//! ### ⑤ 编排层（Orchestration）
//! - `ListingDriver` - 列表遍历的整体重试
//! - `DetailPool` - 详情 worker 池
//! - `App` - 应用入口
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod selectors;
pub mod services;
pub mod storage;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Timeouts};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeSession, ChromeSessionFactory, RenderingSession, SessionFactory};
pub use models::{ListingCheckpoint, PlaceRecord, QueueEntry, Review};
pub use orchestrator::{crawl, App, CrawlStats};
pub use workflow::{DetailEnqueuer, DetailExtractor, ListingCtx, ListingWalker, PageOutcome, WalkOutcome};

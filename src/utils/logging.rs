//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("place_crawler={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str, config: &Config) -> AppResult<()> {
    let log_header = format!(
        "{}\n地点抓取日志 - {}\n搜索: {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        config.search_string,
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|e| AppError::write_failed(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 地点抓取模式");
    info!("🔍 搜索关键词: {}", config.search_string);
    info!("🌐 起始地址: {}", config.start_url());
    match config.max_crawled_places {
        Some(budget) => info!("📊 最多抓取: {} 个地点", budget),
        None => info!("📊 最多抓取: 不限"),
    }
    info!("👷 详情 worker 数量: {}", config.max_concurrency);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `succeeded`: 成功数量
/// - `failed`: 失败数量
/// - `enqueued`: 列表阶段新入队的数量
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(succeeded: usize, failed: usize, enqueued: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📥 本次入队: {}", enqueued);
    info!("✅ 成功: {}/{}", succeeded, succeeded + failed);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

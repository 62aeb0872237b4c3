use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 抓取流程错误
    #[error("抓取错误: {0}")]
    Crawl(#[from] CrawlError),
    /// 存储（队列 / 检查点 / 数据集）错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本或 CDP 命令失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
}

/// 抓取流程错误
///
/// 对应监听列表遍历、详情入队和详情提取过程中的各种失败。
/// `BudgetReached` 不在这里：达到预算是正常的停止信号，见 [`crate::workflow::PageOutcome`]。
#[derive(Debug, Error)]
pub enum CrawlError {
    /// 等待条件超时（可重试）
    #[error("等待 {what} 超时 ({timeout:?})")]
    Timeout { what: String, timeout: Duration },
    /// 界面暂时性错误（可重试）
    #[error("界面暂时性错误: {reason}")]
    TransientUi { reason: String },
    /// 点击条目后没有进入详情页（已重试一次）
    #[error("第 {index} 个条目点击后未进入详情页")]
    NavigationAmbiguity { index: usize },
    /// 返回列表失败（返回按钮和浏览器后退都失败）
    #[error("无法从 {url} 返回列表")]
    BrokenBackNavigation { url: String },
    /// 找不到分页控件（致命）
    #[error("找不到分页控件")]
    PaginationNotFound,
    /// 搜索既没有产生列表也没有产生详情页（致命）
    #[error("搜索 \"{search}\" 既没有列表也没有详情页")]
    SearchProducedNothing { search: String },
    /// 分页文本无法解析
    #[error("无法解析分页文本: {text:?}")]
    UnparsableRange { text: String },
    /// 单个条目提取超时
    #[error("条目 {url} 提取超时 ({timeout:?})")]
    ItemTimeout { url: String, timeout: Duration },
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 读取失败
    #[error("读取失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入失败
    #[error("写入失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 数据损坏（JSON 解析失败）
    #[error("数据损坏 ({path}): {source}")]
    Corrupted {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 队列中不存在该请求
    #[error("队列中不存在请求: {id}")]
    UnknownRequest { id: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少必填项
    #[error("缺少必填配置: {field}")]
    MissingField { field: String },
    /// 配置项取值非法
    #[error("配置 {field} 非法: {reason}")]
    InvalidValue { field: String, reason: String },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(StorageError::Corrupted {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            field: "toml".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(StorageError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建等待超时错误
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        AppError::Crawl(CrawlError::Timeout {
            what: what.into(),
            timeout,
        })
    }

    /// 创建界面暂时性错误
    pub fn transient(reason: impl Into<String>) -> Self {
        AppError::Crawl(CrawlError::TransientUi {
            reason: reason.into(),
        })
    }

    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Storage(StorageError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为等待超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Crawl(CrawlError::Timeout { .. }))
    }

    /// 是否为致命错误（列表层面不做内部重试，直接交给外层驱动）
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Crawl(CrawlError::PaginationNotFound)
                | AppError::Crawl(CrawlError::SearchProducedNothing { .. })
                | AppError::Config(_)
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::Crawl(CrawlError::PaginationNotFound).is_fatal());
        assert!(AppError::Crawl(CrawlError::SearchProducedNothing {
            search: "pubs".to_string()
        })
        .is_fatal());
        assert!(!AppError::transient("分页按钮还没渲染").is_fatal());
        assert!(!AppError::Crawl(CrawlError::NavigationAmbiguity { index: 3 }).is_fatal());
    }

    #[test]
    fn test_timeout_display() {
        let err = AppError::timeout("详情页标记", Duration::from_secs(20));
        assert!(err.is_timeout());
        assert!(err.to_string().contains("详情页标记"));
    }
}

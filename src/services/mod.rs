//! 业务能力层（Services）
//!
//! 描述"我能从页面上做什么"：加载嵌套集合、批量读取字段、解析直方图。
//! 不关心流程顺序，只依赖 `RenderingSession`。

pub mod collection_loader;
pub mod field_extractor;
pub mod popular_times;

pub use collection_loader::{CollectionLoader, LoadOutcome};
pub use field_extractor::{FieldRead, FieldSpec};

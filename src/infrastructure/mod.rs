//! 基础设施层
//!
//! 持有稀缺资源（浏览器 Page），只向上暴露能力：
//! - `JsExecutor`：唯一的 page owner，提供 eval() 能力
//! - `RenderingSession`：渲染会话抽象（查询、点击、输入、滚动、结构化读取）
//! - `ChromeSession`：基于 chromiumoxide 的实现
//! - `wait`：有上限的等待原语

pub mod chrome_session;
pub mod js_executor;
pub mod session;
pub mod wait;

pub use chrome_session::{ActivationStrategy, ChromeSession, ChromeSessionFactory};
pub use js_executor::JsExecutor;
pub use session::{RenderingSession, SessionFactory};

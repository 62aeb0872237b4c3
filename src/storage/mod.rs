//! 存储层：检查点、工作队列、结果数据集
//!
//! 核心流程只依赖这里的 trait；本地实现保证程序可以独立运行，
//! 换成其他后端时只需要实现同样的 trait。

pub mod checkpoint_store;
pub mod dataset;
pub mod request_queue;

pub use checkpoint_store::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use dataset::{JsonlDataset, MemoryDataset, RecordSink};
pub use request_queue::{
    AddOutcome, LocalRequestQueue, QueueCounts, QueuedRequest, ReclaimOutcome, RequestQueue,
};

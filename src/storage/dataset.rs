//! 结果数据集
//!
//! 只负责"写结果"能力：成功的地点记录和最终失败的记录。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{DatasetItem, FailedRecord, PlaceRecord};

/// 结果输出
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 写入成功提取的地点
    async fn push_record(&self, record: &PlaceRecord) -> AppResult<()>;

    /// 写入最终失败的条目
    async fn push_failed(&self, record: &FailedRecord) -> AppResult<()>;
}

/// JSON Lines 文件数据集：每行一条记录，只追加
pub struct JsonlDataset {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlDataset {
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::write_failed(parent.display().to_string(), e))?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn append(&self, item: &DatasetItem) -> AppResult<()> {
        let mut line = serde_json::to_string(item)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AppError::write_failed(self.path.display().to_string(), e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::write_failed(self.path.display().to_string(), e))?;
        file.flush()
            .await
            .map_err(|e| AppError::write_failed(self.path.display().to_string(), e))?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for JsonlDataset {
    async fn push_record(&self, record: &PlaceRecord) -> AppResult<()> {
        debug!("写入地点: {} | 评论 {} 条 | 图片 {} 张", record.url, record.reviews.len(), record.image_urls.len());
        self.append(&DatasetItem::Place(Box::new(record.clone()))).await
    }

    async fn push_failed(&self, record: &FailedRecord) -> AppResult<()> {
        debug!("写入失败记录: {}", record.url);
        self.append(&DatasetItem::Failed(record.clone())).await
    }
}

/// 内存数据集
#[derive(Default)]
pub struct MemoryDataset {
    items: Mutex<Vec<DatasetItem>>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<DatasetItem> {
        self.items.lock().await.clone()
    }
}

#[async_trait]
impl RecordSink for MemoryDataset {
    async fn push_record(&self, record: &PlaceRecord) -> AppResult<()> {
        self.items
            .lock()
            .await
            .push(DatasetItem::Place(Box::new(record.clone())));
        Ok(())
    }

    async fn push_failed(&self, record: &FailedRecord) -> AppResult<()> {
        self.items
            .lock()
            .await
            .push(DatasetItem::Failed(record.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_jsonl_dataset_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("dataset.jsonl");
        let dataset = JsonlDataset::open(&path).await.unwrap();

        let record = PlaceRecord {
            url: "https://maps/place/a".to_string(),
            title: "A".to_string(),
            ..Default::default()
        };
        dataset.push_record(&record).await.unwrap();
        dataset
            .push_failed(&FailedRecord::new("https://maps/place/b", vec!["超时".to_string()]))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<DatasetItem> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], DatasetItem::Place(Box::new(record)));
        assert!(matches!(&lines[1], DatasetItem::Failed(f) if !f.succeeded));
    }
}

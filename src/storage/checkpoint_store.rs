//! 检查点存储（键值存储）

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult, StorageError};
use crate::models::ListingCheckpoint;
use crate::utils::text::escape_key;

/// 检查点存储
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// 读取检查点；从未写入过时返回 None
    async fn get(&self, key: &str) -> AppResult<Option<ListingCheckpoint>>;

    /// 写入检查点
    async fn set(&self, key: &str, checkpoint: &ListingCheckpoint) -> AppResult<()>;
}

/// 文件检查点存储：每个键一个 JSON 文件
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// 打开（必要时创建）存储目录
    pub async fn open(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::write_failed(dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    /// 键到文件名的映射是单射，不同的键不会共用一个文件
    fn path_for(&self, key: &str) -> PathBuf {
        let file_name = escape_key(key, |c| c.is_alphanumeric() || c == '-' || c == '_');
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn get(&self, key: &str) -> AppResult<Option<ListingCheckpoint>> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::read_failed(path.display().to_string(), e)),
        };
        let checkpoint = serde_json::from_str(&content).map_err(|e| {
            AppError::Storage(StorageError::Corrupted {
                path: path.display().to_string(),
                source: Box::new(e),
            })
        })?;
        Ok(Some(checkpoint))
    }

    async fn set(&self, key: &str, checkpoint: &ListingCheckpoint) -> AppResult<()> {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(checkpoint)?;
        // 先写临时文件再改名，崩溃时不会留下半个文件
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| AppError::write_failed(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| AppError::write_failed(path.display().to_string(), e))?;
        debug!("检查点已保存: {} = {:?}", key, checkpoint);
        Ok(())
    }
}

/// 内存检查点存储
#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, ListingCheckpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个检查点（模拟之前运行留下的状态）
    pub async fn seed(&self, key: &str, checkpoint: ListingCheckpoint) {
        self.entries.lock().await.insert(key.to_string(), checkpoint);
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, key: &str) -> AppResult<Option<ListingCheckpoint>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, checkpoint: &ListingCheckpoint) -> AppResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), checkpoint.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        let key = ListingCheckpoint::storage_key("pubs-in-prague");

        assert_eq!(store.get(&key).await.unwrap(), None);

        let mut checkpoint = ListingCheckpoint::default();
        checkpoint.advance(21, 40);
        store.set(&key, &checkpoint).await.unwrap();

        let reopened = FileCheckpointStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get(&key).await.unwrap(), Some(checkpoint));
    }

    #[tokio::test]
    async fn test_keys_do_not_interfere() {
        let store = MemoryCheckpointStore::new();
        let mut a = ListingCheckpoint::default();
        a.advance(1, 20);
        store.set("listingState-a", &a).await.unwrap();
        assert_eq!(store.get("listingState-b").await.unwrap(), None);
        assert_eq!(store.get("listingState-a").await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_file_store_keeps_similar_keys_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        let keys = [
            ListingCheckpoint::storage_key("北京%20咖啡"),
            ListingCheckpoint::storage_key("上海%20咖啡"),
            ListingCheckpoint::storage_key("x@50.5,14,10"),
            ListingCheckpoint::storage_key("x@50,5.14,10"),
            ListingCheckpoint::storage_key("x_50_5_14_10"),
        ];
        for (n, key) in keys.iter().enumerate() {
            let mut checkpoint = ListingCheckpoint::default();
            checkpoint.advance(n as u64 + 1, n as u64 + 1);
            store.set(key, &checkpoint).await.unwrap();
        }
        for (n, key) in keys.iter().enumerate() {
            let checkpoint = store.get(key).await.unwrap().unwrap();
            assert_eq!(checkpoint.from, Some(n as u64 + 1));
        }
    }

    #[tokio::test]
    async fn test_corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let err = store.get("broken").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Corrupted { .. })));
    }
}

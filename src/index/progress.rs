//! Progress snapshot shared between the running job and API readers.
//! 后台任务与 API 读取方共享的进度快照

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Index building progress / 索引构建进度
///
/// `is_done` and `error` together tell the three terminal-ish states apart:
/// running (false, None), finished clean (true, None), finished with error
/// or stopped early (false, Some).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
    pub object_count: u64,
    pub is_done: bool,
    pub last_done_time: Option<i64>,
    pub error: Option<String>,
}

impl IndexProgress {
    /// Snapshot written when a job starts / 任务开始时写入的快照
    pub fn running() -> Self {
        Self {
            object_count: 0,
            is_done: false,
            last_done_time: None,
            error: None,
        }
    }

    /// Canonical empty state written after a clear / 清除索引后的初始状态
    pub fn cleared() -> Self {
        Self {
            object_count: 0,
            is_done: true,
            last_done_time: None,
            error: None,
        }
    }
}

/// Concurrency-safe holder of the latest progress snapshot.
///
/// Readers always get a copy, never a live reference. The store starts
/// empty and stays empty until the first job (or clear) writes it.
#[derive(Clone, Default)]
pub struct ProgressStore {
    inner: Arc<RwLock<Option<IndexProgress>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot atomically / 原子替换快照
    pub fn write(&self, progress: IndexProgress) {
        *self.inner.write() = Some(progress);
    }

    /// Copy of the latest snapshot, `None` if never written
    pub fn read(&self) -> Option<IndexProgress> {
        self.inner.read().clone()
    }

    /// Update only the object count of the current snapshot / 仅更新对象计数
    pub fn set_object_count(&self, count: u64) {
        if let Some(ref mut progress) = *self.inner.write() {
            progress.object_count = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_starts_empty() {
        let store = ProgressStore::new();
        assert!(store.read().is_none());
    }

    #[test]
    fn test_write_then_read_returns_copy() {
        let store = ProgressStore::new();
        store.write(IndexProgress::running());

        let mut snapshot = store.read().unwrap();
        snapshot.object_count = 42;

        // 读取到的是副本，修改不影响存储
        assert_eq!(store.read().unwrap().object_count, 0);
    }

    #[test]
    fn test_set_object_count_updates_snapshot() {
        let store = ProgressStore::new();

        // no-op before the first write
        store.set_object_count(5);
        assert!(store.read().is_none());

        store.write(IndexProgress::running());
        store.set_object_count(5);
        let snapshot = store.read().unwrap();
        assert_eq!(snapshot.object_count, 5);
        assert!(!snapshot.is_done);
    }

    #[test]
    fn test_cleared_state() {
        let progress = IndexProgress::cleared();
        assert_eq!(progress.object_count, 0);
        assert!(progress.is_done);
        assert!(progress.last_done_time.is_none());
        assert!(progress.error.is_none());
    }
}

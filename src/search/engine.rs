//! Index engine over the database store and a storage driver.
//! 基于数据库存储与存储驱动的索引引擎

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use super::db_index::DbIndex;
use crate::index::{IndexEngine, JobContext};
use crate::storage::Driver;
use crate::utils;

/// 批量写入阈值（每N条落一次库）
const INSERT_BATCH_SIZE: usize = 2000;

pub struct DbEngine {
    index: Arc<DbIndex>,
    driver: Arc<dyn Driver>,
}

impl DbEngine {
    pub fn new(index: Arc<DbIndex>, driver: Arc<dyn Driver>) -> Self {
        Self { index, driver }
    }

    /// 递归索引一个目录 / Recursively index one directory
    ///
    /// Cancellation is checked per entry; a pending batch is flushed before
    /// an early return so already-walked entries are not lost. Subdirectory
    /// listing failures are logged and skipped; only the listing failure of
    /// `path` itself is an error for the caller.
    async fn index_directory(
        &self,
        ctx: &JobContext,
        path: &str,
        ignore: &HashSet<String>,
        depth: i32,
        max_depth: i32,
    ) -> anyhow::Result<()> {
        if depth > max_depth || ctx.is_stopped() {
            return Ok(());
        }

        let entries = self
            .driver
            .list(path)
            .await
            .with_context(|| format!("list {}", path))?;

        let mut batch: Vec<(String, String, bool, i64, i64)> =
            Vec::with_capacity(entries.len().min(INSERT_BATCH_SIZE));

        for entry in entries {
            if ctx.is_stopped() {
                self.index.insert_batch(&batch).await?;
                return Ok(());
            }

            let child_path = utils::join_path(path, &entry.name);
            if ignore.contains(&child_path) {
                tracing::debug!("Skipping ignored path: {}", child_path);
                continue;
            }

            let modified = chrono::DateTime::parse_from_rfc3339(&entry.modified)
                .map(|dt| dt.timestamp())
                .unwrap_or(0);
            batch.push((
                child_path.clone(),
                entry.name.clone(),
                entry.is_dir,
                entry.size as i64,
                modified,
            ));
            ctx.add_object();

            if batch.len() >= INSERT_BATCH_SIZE {
                self.index.insert_batch(&batch).await?;
                batch.clear();
            }

            if entry.is_dir {
                if let Err(e) = Box::pin(self.index_directory(
                    ctx,
                    &child_path,
                    ignore,
                    depth + 1,
                    max_depth,
                ))
                .await
                {
                    tracing::warn!("Failed to index subdirectory {}: {:#}", child_path, e);
                }
            }
        }

        self.index.insert_batch(&batch).await?;
        Ok(())
    }
}

#[async_trait]
impl IndexEngine for DbEngine {
    fn supports_incremental(&self) -> bool {
        true
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.index.clear_all().await
    }

    async fn build_index(
        &self,
        ctx: &JobContext,
        roots: &[String],
        ignore: &HashSet<String>,
        max_depth: i32,
        full_rebuild: bool,
    ) -> anyhow::Result<()> {
        tracing::info!(
            "Indexing via driver {}: {} root(s), max_depth={}, full_rebuild={}",
            self.driver.name(),
            roots.len(),
            max_depth,
            full_rebuild
        );

        for root in roots {
            if ctx.is_stopped() {
                return Ok(());
            }
            let root = utils::fix_and_clean_path(root);
            self.index_directory(ctx, &root, ignore, 0, max_depth).await?;
        }

        if !ctx.was_stopped() {
            self.index.set_last_updated().await?;
        }
        Ok(())
    }

    async fn delete_path(&self, path: &str) -> anyhow::Result<()> {
        let deleted = self.index.delete_subtree(path).await?;
        tracing::debug!("Deleted {} index entries under {}", deleted, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use tokio::sync::mpsc;

    use crate::index::ProgressStore;
    use crate::storage::FileInfo;

    /// In-memory namespace for walking tests / 内存目录树
    struct MemDriver {
        tree: HashMap<String, Vec<FileInfo>>,
    }

    impl MemDriver {
        fn sample() -> Self {
            fn file(name: &str, size: u64) -> FileInfo {
                FileInfo {
                    name: name.to_string(),
                    size,
                    is_dir: false,
                    modified: String::new(),
                }
            }
            fn dir(name: &str) -> FileInfo {
                FileInfo {
                    name: name.to_string(),
                    size: 0,
                    is_dir: true,
                    modified: String::new(),
                }
            }

            let mut tree = HashMap::new();
            tree.insert(
                "/".to_string(),
                vec![file("a.txt", 5), dir("docs"), dir("skipme")],
            );
            tree.insert(
                "/docs".to_string(),
                vec![file("b.md", 3), dir("sub")],
            );
            tree.insert("/docs/sub".to_string(), vec![file("c.txt", 1)]);
            tree.insert("/skipme".to_string(), vec![file("x.bin", 9)]);
            Self { tree }
        }
    }

    #[async_trait]
    impl Driver for MemDriver {
        fn name(&self) -> &str {
            "mem"
        }

        async fn list(&self, path: &str) -> anyhow::Result<Vec<FileInfo>> {
            self.tree
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such directory: {}", path))
        }
    }

    async fn engine_fixture() -> (tempfile::TempDir, DbEngine) {
        let dir = tempfile::tempdir().unwrap();
        let index = DbIndex::open(&dir.path().join("search.db")).await.unwrap();
        index.init().await.unwrap();
        let engine = DbEngine::new(Arc::new(index), Arc::new(MemDriver::sample()));
        (dir, engine)
    }

    fn job_context() -> (mpsc::Sender<()>, JobContext) {
        let (tx, rx) = mpsc::channel(1);
        (tx, JobContext::new(rx, ProgressStore::new()))
    }

    #[tokio::test]
    async fn test_full_build_walks_tree() {
        let (_dir, engine) = engine_fixture().await;
        let (_tx, ctx) = job_context();

        engine
            .build_index(&ctx, &["/".to_string()], &HashSet::new(), 20, true)
            .await
            .unwrap();

        // a.txt, docs, b.md, sub, c.txt, skipme, x.bin
        assert_eq!(ctx.object_count(), 7);
        let stats = engine.index.get_stats().await;
        assert_eq!(stats.file_count, 4);
        assert_eq!(stats.dir_count, 3);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_ignored_subtree_is_pruned() {
        let (_dir, engine) = engine_fixture().await;
        let (_tx, ctx) = job_context();
        let ignore: HashSet<String> = ["/skipme".to_string()].into_iter().collect();

        engine
            .build_index(&ctx, &["/".to_string()], &ignore, 20, true)
            .await
            .unwrap();

        assert_eq!(ctx.object_count(), 5);
        let hits = engine.index.search_by_name("x.bin", 50, 0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_max_depth_bounds_walk() {
        let (_dir, engine) = engine_fixture().await;
        let (_tx, ctx) = job_context();

        engine
            .build_index(&ctx, &["/".to_string()], &HashSet::new(), 0, true)
            .await
            .unwrap();

        // 只索引根目录这一层
        assert_eq!(ctx.object_count(), 3);
    }

    #[tokio::test]
    async fn test_incremental_build_over_selected_paths() {
        let (_dir, engine) = engine_fixture().await;
        let (_tx, ctx) = job_context();

        engine
            .build_index(&ctx, &["/docs".to_string()], &HashSet::new(), 20, false)
            .await
            .unwrap();

        // b.md, sub, c.txt — nothing outside /docs
        assert_eq!(ctx.object_count(), 3);
        let hits = engine.index.search_by_name("a.txt", 50, 0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_stop_signal_halts_walk() {
        let (_dir, engine) = engine_fixture().await;
        let (tx, ctx) = job_context();
        tx.try_send(()).unwrap();

        engine
            .build_index(&ctx, &["/".to_string()], &HashSet::new(), 20, true)
            .await
            .unwrap();

        assert_eq!(ctx.object_count(), 0);
        assert!(ctx.was_stopped());
        // 中断的构建不写完成时间
        assert!(engine.index.get_stats().await.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_path_removes_subtree() {
        let (_dir, engine) = engine_fixture().await;
        let (_tx, ctx) = job_context();

        engine
            .build_index(&ctx, &["/".to_string()], &HashSet::new(), 20, true)
            .await
            .unwrap();
        engine.delete_path("/docs").await.unwrap();

        let stats = engine.index.get_stats().await;
        // /docs, b.md, sub, c.txt 被删除
        assert_eq!(stats.file_count + stats.dir_count, 4);
    }
}

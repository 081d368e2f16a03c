//! Engine seam the index manager delegates real work to / 索引引擎接口

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::progress::ProgressStore;

/// Per-job handle the engine reports progress and checks cancellation through.
/// 每个任务一个：引擎通过它上报进度并检查停止信号
pub struct JobContext {
    cancel_rx: Mutex<mpsc::Receiver<()>>,
    stopped: AtomicBool,
    object_count: AtomicU64,
    progress: ProgressStore,
}

impl JobContext {
    pub fn new(cancel_rx: mpsc::Receiver<()>, progress: ProgressStore) -> Self {
        Self {
            cancel_rx: Mutex::new(cancel_rx),
            stopped: AtomicBool::new(false),
            object_count: AtomicU64::new(0),
            progress,
        }
    }

    /// Cooperative stop check, called between discrete units of work.
    /// Consumes the pending signal if one is buffered; once observed the
    /// stop is sticky. 协作式停止检查，信号一经观察即保持
    pub fn is_stopped(&self) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return true;
        }
        if self.cancel_rx.lock().try_recv().is_ok() {
            self.stopped.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    /// Whether a stop signal was observed at some check point.
    /// 是否曾观察到停止信号
    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Count one indexed object and publish the new total / 计数并发布
    pub fn add_object(&self) {
        let count = self.object_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.set_object_count(count);
    }

    pub fn object_count(&self) -> u64 {
        self.object_count.load(Ordering::SeqCst)
    }
}

/// Primitive operations of the search index / 搜索索引原语操作
///
/// The manager only invokes these; how the namespace is walked and how
/// entries are stored is entirely the engine's business.
#[async_trait]
pub trait IndexEngine: Send + Sync {
    /// Whether delete-and-rebuild of individual paths is supported.
    /// 是否支持增量更新
    fn supports_incremental(&self) -> bool;

    /// Drop all index data / 清空全部索引数据
    async fn clear(&self) -> anyhow::Result<()>;

    /// Walk `roots` and (re)index them, honoring `ignore` and `max_depth`.
    /// `full_rebuild` marks a from-scratch build as opposed to an
    /// incremental pass over selected paths.
    async fn build_index(
        &self,
        ctx: &JobContext,
        roots: &[String],
        ignore: &HashSet<String>,
        max_depth: i32,
        full_rebuild: bool,
    ) -> anyhow::Result<()>;

    /// Remove index entries rooted at `path` / 删除以该路径为根的索引条目
    async fn delete_path(&self, path: &str) -> anyhow::Result<()>;
}

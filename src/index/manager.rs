//! Single-flight supervision of the background indexing job.
//! 后台索引任务的单实例监督
//!
//! Installing the cancel slot IS the running check: a job is accepted only
//! if the install succeeds, so a second job can never slip in between a
//! precondition check and the task spawn. The spawned task is detached;
//! nothing awaits it. It owns its cancel receiver for its whole lifetime
//! and writes a terminal progress snapshot on every exit path.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use super::cancel::CancelSlot;
use super::engine::{IndexEngine, JobContext};
use super::progress::{IndexProgress, ProgressStore};
use super::IndexError;

pub struct IndexManager {
    engine: Arc<dyn IndexEngine>,
    progress: ProgressStore,
    cancel: CancelSlot,
}

impl IndexManager {
    /// Initial state: idle, progress never written / 初始状态：空闲
    pub fn new(engine: Arc<dyn IndexEngine>) -> Self {
        Self {
            engine,
            progress: ProgressStore::new(),
            cancel: CancelSlot::new(),
        }
    }

    /// Whether a build or update job currently owns the cancel slot.
    pub fn is_running(&self) -> bool {
        self.cancel.is_installed()
    }

    /// Start a full rebuild: clear everything, then walk the namespace from
    /// the root. Returns as soon as the job is accepted, not when it is done.
    /// 启动全量重建，接受任务后立即返回
    pub fn build_all(
        self: &Arc<Self>,
        ignore_paths: HashSet<String>,
        max_depth: i32,
    ) -> Result<(), IndexError> {
        let rx = self.cancel.try_install().ok_or(IndexError::AlreadyRunning)?;
        let ctx = JobContext::new(rx, self.progress.clone());
        self.progress.write(IndexProgress::running());
        tracing::info!("index build started, max_depth={}", max_depth);

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.run_build(&ctx, ignore_paths, max_depth).await;
            this.finish_job(&ctx, result);
        });
        Ok(())
    }

    async fn run_build(
        &self,
        ctx: &JobContext,
        ignore_paths: HashSet<String>,
        max_depth: i32,
    ) -> anyhow::Result<()> {
        self.engine.clear().await.context("clear index")?;
        self.engine
            .build_index(ctx, &["/".to_string()], &ignore_paths, max_depth, true)
            .await
            .context("build index")
    }

    /// Incrementally refresh `paths`: delete each path's entries in caller
    /// order, then rebuild exactly those paths. Deletions are best-effort
    /// across paths: the first failure aborts the whole update and earlier
    /// deletions are not rolled back. 增量更新，按调用方顺序处理
    pub fn update_paths(
        self: &Arc<Self>,
        paths: Vec<String>,
        ignore_paths: HashSet<String>,
        max_depth: i32,
    ) -> Result<(), IndexError> {
        let rx = self.cancel.try_install().ok_or(IndexError::AlreadyRunning)?;
        if !self.engine.supports_incremental() {
            self.cancel.clear();
            return Err(IndexError::UpdateUnsupported);
        }
        let ctx = JobContext::new(rx, self.progress.clone());
        self.progress.write(IndexProgress::running());
        tracing::info!("index update started, {} path(s)", paths.len());

        let this = self.clone();
        tokio::spawn(async move {
            let result = this.run_update(&ctx, paths, ignore_paths, max_depth).await;
            this.finish_job(&ctx, result);
        });
        Ok(())
    }

    async fn run_update(
        &self,
        ctx: &JobContext,
        paths: Vec<String>,
        ignore_paths: HashSet<String>,
        max_depth: i32,
    ) -> anyhow::Result<()> {
        for path in &paths {
            if ctx.is_stopped() {
                return Ok(());
            }
            self.engine
                .delete_path(path)
                .await
                .with_context(|| format!("delete index on {}", path))?;
        }
        if ctx.is_stopped() {
            return Ok(());
        }
        self.engine
            .build_index(ctx, &paths, &ignore_paths, max_depth, false)
            .await
            .context("update index")
    }

    /// Terminal snapshot plus slot release, on every exit path of a job.
    fn finish_job(&self, ctx: &JobContext, result: anyhow::Result<()>) {
        let error = match result {
            Err(e) => {
                tracing::error!("index job failed: {:#}", e);
                Some(format!("{:#}", e))
            }
            Ok(()) if ctx.was_stopped() => {
                tracing::info!(
                    "index job stopped, {} object(s) indexed",
                    ctx.object_count()
                );
                Some("index build stopped".to_string())
            }
            Ok(()) => {
                tracing::info!(
                    "index job finished, {} object(s) indexed",
                    ctx.object_count()
                );
                None
            }
        };
        let is_done = error.is_none();
        self.progress.write(IndexProgress {
            object_count: ctx.object_count(),
            is_done,
            last_done_time: if is_done {
                Some(Utc::now().timestamp())
            } else {
                None
            },
            error,
        });
        self.cancel.clear();
    }

    /// Best-effort stop request for the running job; never blocks. The
    /// signal is dropped silently when the previous one is still unconsumed.
    pub fn stop(&self) -> Result<(), IndexError> {
        if self.cancel.request_stop() {
            tracing::info!("index stop requested");
            Ok(())
        } else {
            Err(IndexError::NotRunning)
        }
    }

    /// Drop all index data and reset progress to the canonical empty state.
    /// 清空索引并重置进度
    pub async fn clear(&self) -> Result<(), IndexError> {
        if self.is_running() {
            return Err(IndexError::AlreadyRunning);
        }
        self.engine.clear().await.context("clear index")?;
        self.progress.write(IndexProgress::cleared());
        Ok(())
    }

    /// Latest progress snapshot / 最新进度快照
    pub fn progress(&self) -> Result<IndexProgress, IndexError> {
        self.progress.read().ok_or(IndexError::Uninitialized)
    }
}

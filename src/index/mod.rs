//! Index job orchestration - controls flow, does not index / 索引任务编排
//!
//! Architecture principles / 架构原则：
//! - At most one build/update job runs at any time (single-flight)
//! - A running job is stopped cooperatively, never killed / 协作式停止
//! - The latest progress snapshot is always readable without touching the job
//! - Call direction: api → index → search engine (unidirectional) / 调用方向

pub mod cancel;
pub mod engine;
pub mod manager;
pub mod progress;

pub use cancel::CancelSlot;
pub use engine::{IndexEngine, JobContext};
pub use manager::IndexManager;
pub use progress::{IndexProgress, ProgressStore};

use thiserror::Error;

/// Errors surfaced synchronously by the index manager / 索引管理器同步返回的错误
#[derive(Debug, Error)]
pub enum IndexError {
    /// A build or update job is already running.
    #[error("index job already running")]
    AlreadyRunning,

    /// Stop was requested but no job is running.
    #[error("no index job running")]
    NotRunning,

    /// The engine does not support delete-and-rebuild of individual paths.
    #[error("index does not support incremental update")]
    UpdateUnsupported,

    /// Progress was read before any job or clear ever wrote it.
    #[error("index progress not initialized")]
    Uninitialized,

    /// An engine primitive (clear/build/delete) failed.
    #[error("index operation failed: {0:#}")]
    Engine(anyhow::Error),
}

impl From<anyhow::Error> for IndexError {
    fn from(e: anyhow::Error) -> Self {
        Self::Engine(e)
    }
}

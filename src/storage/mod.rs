//! Storage listing seam consumed by the indexer / 索引器使用的存储接口
//!
//! Only the slice of a storage driver the index subsystem needs: directory
//! listing. Everything else (download, upload, rename...) lives outside
//! this service.

pub mod local;

use async_trait::async_trait;

pub use local::LocalDriver;

/// A single entry in a directory listing / 目录中的一个条目
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    /// RFC3339 modification time, empty when unknown / 修改时间
    pub modified: String,
}

#[async_trait]
pub trait Driver: Send + Sync {
    /// Driver name for logs / 日志用驱动名称
    fn name(&self) -> &str;

    /// List directory contents / 列出目录内容
    async fn list(&self, path: &str) -> anyhow::Result<Vec<FileInfo>>;
}

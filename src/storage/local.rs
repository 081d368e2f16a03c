//! Local filesystem driver / 本地文件系统驱动

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::fs;

use super::{Driver, FileInfo};

pub struct LocalDriver {
    root: PathBuf,
}

impl LocalDriver {
    /// Root directory is created on first use / 根目录不存在时自动创建
    pub fn new(root: PathBuf) -> anyhow::Result<Self> {
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        let root = root.canonicalize()?;
        tracing::info!("Local driver initialized, root: {:?}", root);
        Ok(Self { root })
    }

    fn resolve_path(&self, path: &str) -> anyhow::Result<PathBuf> {
        // 移除开头的斜杠并规范化路径分隔符
        let path = path.trim_start_matches('/').replace('\\', "/");

        // 处理 .. 和 . 等特殊路径组件
        let mut normalized = PathBuf::new();
        for component in Path::new(&path).components() {
            match component {
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::Normal(name) => normalized.push(name),
                _ => {}
            }
        }

        let full_path = self.root.join(normalized);

        // 检查目标路径是否仍在根目录下
        let target = if full_path.exists() {
            full_path.canonicalize()?
        } else {
            full_path.clone()
        };
        if !target.starts_with(&self.root) {
            anyhow::bail!("访问路径超出根目录范围");
        }

        Ok(full_path)
    }
}

#[async_trait]
impl Driver for LocalDriver {
    fn name(&self) -> &str {
        "local"
    }

    async fn list(&self, path: &str) -> anyhow::Result<Vec<FileInfo>> {
        let full_path = self.resolve_path(path)?;
        let mut entries = fs::read_dir(full_path).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = metadata.is_dir();
            let size = if is_dir { 0 } else { metadata.len() };
            let modified = metadata
                .modified()
                .map(|time| {
                    let datetime: DateTime<Local> = time.into();
                    datetime.to_rfc3339()
                })
                .unwrap_or_default();

            files.push(FileInfo {
                name,
                size,
                is_dir,
                modified,
            });
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture() -> (tempfile::TempDir, LocalDriver) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("docs/b.md"), b"# b").unwrap();
        let driver = LocalDriver::new(dir.path().to_path_buf()).unwrap();
        (dir, driver)
    }

    #[tokio::test]
    async fn test_list_root() {
        let (_dir, driver) = fixture().await;
        let mut entries = driver.list("/").await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.txt");
        assert!(!entries[0].is_dir);
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[1].name, "docs");
        assert!(entries[1].is_dir);
    }

    #[tokio::test]
    async fn test_list_subdirectory() {
        let (_dir, driver) = fixture().await;
        let entries = driver.list("/docs").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "b.md");
    }

    #[tokio::test]
    async fn test_parent_components_cannot_escape_root() {
        let (_dir, driver) = fixture().await;
        // ".." 组件被丢弃，路径仍落在根目录内
        let entries = driver.list("/../../docs").await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_list_missing_directory_fails() {
        let (_dir, driver) = fixture().await;
        assert!(driver.list("/nope").await.is_err());
    }
}

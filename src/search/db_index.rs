//! 数据库搜索索引 / Database-backed search index
//!
//! 存储方案：
//! - entries表：每个文件/目录一行（path 唯一，name_lower 加索引）
//! - meta表：索引级元数据（最近完成时间）
//!
//! 特性：
//! - SQLite + WAL模式（并发安全）
//! - 批量插入优化

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

use crate::config;

/// 搜索结果
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchHit {
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    pub size: i64,
    pub modified: i64,
}

/// 索引统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub file_count: u64,
    pub dir_count: u64,
    pub last_updated: Option<i64>,
}

/// 数据库搜索索引
pub struct DbIndex {
    db: Pool<Sqlite>,
    db_path: Option<PathBuf>,
}

impl DbIndex {
    /// Open (or create) the index database at `db_path` / 打开或创建索引数据库
    pub async fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.to_string_lossy());
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&db_url)
            .await?;

        // 启用WAL模式，提高并发性能
        sqlx::query("PRAGMA journal_mode=WAL").execute(&db).await?;
        // 设置busy_timeout，避免锁超时
        sqlx::query("PRAGMA busy_timeout=5000").execute(&db).await?;
        // 优化写入性能
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&db).await?;

        tracing::info!("Search database opened: {:?} (WAL mode)", db_path);

        Ok(Self {
            db,
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// 按配置路径创建独立的搜索数据库
    pub async fn new_standalone() -> anyhow::Result<Self> {
        let db_path = config::config().get_search_db_path();
        Self::open(&db_path).await
    }

    /// 初始化表结构，只在表不存在时创建，不删除已有数据
    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                name_lower TEXT NOT NULL,
                is_dir INTEGER NOT NULL DEFAULT 0,
                size INTEGER NOT NULL DEFAULT 0,
                modified INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_name_lower ON entries(name_lower)")
            .execute(&self.db)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_path ON entries(path)")
            .execute(&self.db)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 批量写入条目 / Batched entry insert
    /// rows: (path, name, is_dir, size, modified)
    pub async fn insert_batch(
        &self,
        rows: &[(String, String, bool, i64, i64)],
    ) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;
        for (path, name, is_dir, size, modified) in rows {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO entries (path, name, name_lower, is_dir, size, modified)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(path)
            .bind(name)
            .bind(name.to_lowercase())
            .bind(is_dir)
            .bind(size)
            .bind(modified)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// 删除以该路径为根的所有条目（含路径本身）/ Delete a whole subtree
    pub async fn delete_subtree(&self, path: &str) -> anyhow::Result<u64> {
        let prefix = format!("{}/%", path.trim_end_matches('/'));
        let result = sqlx::query("DELETE FROM entries WHERE path = ? OR path LIKE ?")
            .bind(path)
            .bind(&prefix)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// 清空全部索引数据 / Drop all index data
    pub async fn clear_all(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM entries").execute(&self.db).await?;
        sqlx::query("DELETE FROM meta").execute(&self.db).await?;
        tracing::info!("Search index cleared");
        Ok(())
    }

    /// 索引统计 / Index statistics
    pub async fn get_stats(&self) -> IndexStats {
        let file_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE is_dir = 0")
                .fetch_one(&self.db)
                .await
                .unwrap_or(0);
        let dir_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE is_dir = 1")
                .fetch_one(&self.db)
                .await
                .unwrap_or(0);
        let last_updated = sqlx::query("SELECT value FROM meta WHERE key = 'last_updated'")
            .fetch_optional(&self.db)
            .await
            .ok()
            .flatten()
            .and_then(|row| row.get::<String, _>("value").parse::<i64>().ok());

        IndexStats {
            file_count: file_count as u64,
            dir_count: dir_count as u64,
            last_updated,
        }
    }

    /// 保存索引完成时间 / Record index completion time
    pub async fn set_last_updated(&self) -> anyhow::Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES ('last_updated', ?)")
            .bind(now.to_string())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// 按名称子串查询（大小写不敏感），目录排在文件前
    /// Case-insensitive name-substring query, directories first
    pub async fn search_by_name(
        &self,
        keyword: &str,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let pattern = format!("%{}%", keyword.to_lowercase());
        let hits = sqlx::query_as::<_, SearchHit>(
            r#"
            SELECT path, name, is_dir, size, modified FROM entries
            WHERE name_lower LIKE ?
            ORDER BY is_dir DESC, name_lower ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(hits)
    }

    /// 索引数据库文件大小（字节）/ On-disk index size in bytes
    pub fn db_size(&self) -> u64 {
        let Some(ref db_path) = self.db_path else {
            return 0;
        };
        let mut size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
        size += std::fs::metadata(db_path.with_extension("db-wal"))
            .map(|m| m.len())
            .unwrap_or(0);
        size
    }

    /// 关闭数据库连接池 / Close database connection pool
    pub async fn close(&self) {
        self.db.close().await;
    }
}

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            enabled INTEGER NOT NULL DEFAULT 0,
            auto_update_index INTEGER NOT NULL DEFAULT 1,
            ignore_paths TEXT NOT NULL DEFAULT '',
            max_index_depth INTEGER NOT NULL DEFAULT 20,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Seed default settings row / 写入默认设置
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO search_settings
            (id, enabled, auto_update_index, ignore_paths, max_index_depth, updated_at)
        VALUES (1, 0, 1, '', 20, ?)
        "#,
    )
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

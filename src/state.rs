use std::sync::Arc;

use sqlx::SqlitePool;

use moonlist_backend::index::IndexManager;
use moonlist_backend::search::DbIndex;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub db: SqlitePool,
    /// Search index store, shared with the engine / 搜索索引存储
    pub index: Arc<DbIndex>,
    /// Background index job supervisor / 后台索引任务管理器
    pub index_manager: Arc<IndexManager>,
}

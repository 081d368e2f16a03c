use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod db;
mod state;

use moonlist_backend::config;
use moonlist_backend::index::IndexManager;
use moonlist_backend::search::{DbEngine, DbIndex};
use moonlist_backend::storage::LocalDriver;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moonlist_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());
    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    // Storage driver over the served root / 存储驱动
    let driver = Arc::new(LocalDriver::new(app_config.get_storage_root())?);

    // Search index store and engine / 搜索索引存储与引擎
    let index = Arc::new(DbIndex::new_standalone().await?);
    index.init().await?;
    let engine = Arc::new(DbEngine::new(index.clone(), driver));

    // One supervisor per process, idle at start / 每个进程一个任务管理器
    let index_manager = Arc::new(IndexManager::new(engine));

    let state = Arc::new(AppState {
        db: pool,
        index,
        index_manager,
    });

    let app = Router::new()
        // 搜索管理API
        .route("/api/admin/search/settings", get(api::search::get_search_settings))
        .route("/api/admin/search/settings", post(api::search::update_search_settings))
        .route("/api/admin/search/status", get(api::search::get_index_status))
        .route("/api/admin/search/index/rebuild", post(api::search::rebuild_index))
        .route("/api/admin/search/index/update", post(api::search::update_index))
        .route("/api/admin/search/index/stop", post(api::search::stop_index))
        .route("/api/admin/search/index/clear", post(api::search::clear_index))
        .route("/api/admin/search/index/progress", get(api::search::get_index_progress))
        // 搜索API
        .route("/api/search", post(api::search::search))
        .route("/api/search/enabled", get(api::search::is_search_enabled))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

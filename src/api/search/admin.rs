//! Index administration endpoints / 索引管理接口
//!
//! Thin plumbing only: decode the request, fetch settings, call the index
//! manager, encode the result. All job invariants live in the index module.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use crate::api::ApiResponse;
use crate::state::AppState;
use moonlist_backend::index::{IndexError, IndexProgress};
use moonlist_backend::utils::fix_and_clean_path;

use super::types::*;

/// 读取搜索设置（不存在时返回默认值）
pub(super) async fn load_settings(state: &AppState) -> SearchSettings {
    let row = sqlx::query_as::<_, (bool, bool, String, i32)>(
        "SELECT enabled, auto_update_index, ignore_paths, max_index_depth FROM search_settings WHERE id = 1",
    )
    .fetch_optional(&state.db)
    .await
    .ok()
    .flatten();

    match row {
        Some((enabled, auto_update_index, ignore_paths, max_index_depth)) => SearchSettings {
            enabled,
            auto_update_index,
            ignore_paths,
            max_index_depth,
        },
        None => SearchSettings::default(),
    }
}

/// 忽略路径配置转为规范化集合 / Parse the ignore-path list into a clean set
fn ignore_set(ignore_paths: &str) -> HashSet<String> {
    ignore_paths
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(fix_and_clean_path)
        .collect()
}

pub async fn get_search_settings(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SearchSettings>> {
    Json(ApiResponse::success(load_settings(&state).await))
}

pub async fn update_search_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<SearchSettings>,
) -> Json<ApiResponse<SearchSettings>> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO search_settings (id, enabled, auto_update_index, ignore_paths, max_index_depth, updated_at)
        VALUES (1, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            enabled = excluded.enabled,
            auto_update_index = excluded.auto_update_index,
            ignore_paths = excluded.ignore_paths,
            max_index_depth = excluded.max_index_depth,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(settings.enabled)
    .bind(settings.auto_update_index)
    .bind(&settings.ignore_paths)
    .bind(settings.max_index_depth)
    .bind(&now)
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {
            tracing::info!(
                "Search settings saved: enabled={}, auto_update={}",
                settings.enabled,
                settings.auto_update_index
            );
            Json(ApiResponse::success(settings))
        }
        Err(e) => {
            tracing::error!("Failed to save search settings: {}", e);
            Json(ApiResponse::error(&format!("保存设置失败: {}", e)))
        }
    }
}

/// 全量重建索引 / Full index rebuild
pub async fn rebuild_index(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    let settings = load_settings(&state).await;

    match state.index_manager.build_all(
        ignore_set(&settings.ignore_paths),
        settings.max_index_depth,
    ) {
        Ok(()) => Json(ApiResponse::success(())),
        Err(IndexError::AlreadyRunning) => Json(ApiResponse::error("索引正在构建中，请先停止")),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// 增量更新指定路径 / Incremental update of selected paths
pub async fn update_index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateIndexReq>,
) -> Json<ApiResponse<()>> {
    if req.paths.is_empty() {
        return Json(ApiResponse::error("路径列表不能为空"));
    }

    let settings = load_settings(&state).await;
    if !settings.auto_update_index {
        return Json(ApiResponse::error("当前索引不支持增量更新"));
    }

    let paths: Vec<String> = req.paths.iter().map(|p| fix_and_clean_path(p)).collect();

    match state.index_manager.update_paths(
        paths,
        ignore_set(&settings.ignore_paths),
        req.max_depth,
    ) {
        Ok(()) => Json(ApiResponse::success(())),
        Err(IndexError::AlreadyRunning) => Json(ApiResponse::error("索引正在构建中，请先停止")),
        Err(IndexError::UpdateUnsupported) => {
            Json(ApiResponse::error("当前索引不支持增量更新"))
        }
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// 请求停止当前索引任务 / Request the running job to stop
pub async fn stop_index(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    match state.index_manager.stop() {
        Ok(()) => Json(ApiResponse::success(())),
        Err(IndexError::NotRunning) => Json(ApiResponse::error("当前没有正在运行的索引任务")),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// 清除索引 / Clear the index
pub async fn clear_index(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    match state.index_manager.clear().await {
        Ok(()) => {
            tracing::info!("Index cleared");
            Json(ApiResponse::success(()))
        }
        Err(IndexError::AlreadyRunning) => Json(ApiResponse::error("索引正在构建中，请先停止")),
        Err(e) => Json(ApiResponse::error(&format!("清除索引失败: {}", e))),
    }
}

/// 索引进度快照 / Raw progress snapshot
pub async fn get_index_progress(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<IndexProgress>> {
    match state.index_manager.progress() {
        Ok(progress) => Json(ApiResponse::success(progress)),
        Err(_) => Json(ApiResponse::error("索引进度尚未初始化")),
    }
}

/// 聚合的索引状态（进度 + 存储统计）/ Aggregated index status
pub async fn get_index_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<IndexStatus>> {
    let progress = state.index_manager.progress().ok();
    let running = state.index_manager.is_running();
    let stats = state.index.get_stats().await;

    let error_message = progress.as_ref().and_then(|p| p.error.clone());
    let has_index = stats.file_count + stats.dir_count > 0;

    let status = if running {
        "indexing"
    } else if error_message.is_some() {
        "error"
    } else if !has_index {
        "not_built"
    } else {
        "idle"
    };

    // 构建中使用实时进度，否则使用保存的统计
    let object_count = if running {
        progress.map(|p| p.object_count).unwrap_or(0)
    } else {
        stats.file_count + stats.dir_count
    };

    let last_updated = if running {
        None
    } else {
        stats.last_updated.and_then(|ts| {
            chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.to_rfc3339())
        })
    };

    Json(ApiResponse::success(IndexStatus {
        status: status.to_string(),
        object_count,
        index_size: state.index.db_size(),
        last_updated,
        error_message,
    }))
}

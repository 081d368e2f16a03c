//! Search query endpoints / 搜索查询接口

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::ApiResponse;
use crate::state::AppState;
use moonlist_backend::search::SearchHit;

use super::admin::load_settings;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_limit() -> usize {
    50
}

fn default_page() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

/// 公开API：检查搜索功能是否启用
pub async fn is_search_enabled(State(state): State<Arc<AppState>>) -> Json<ApiResponse<bool>> {
    Json(ApiResponse::success(load_settings(&state).await.enabled))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    // 检查搜索是否启用
    if !load_settings(&state).await.enabled {
        return Json(ApiResponse::error("搜索功能未启用"));
    }

    let query = req.query.trim();
    if query.is_empty() {
        return Json(ApiResponse::error("搜索关键词不能为空"));
    }

    let limit = req.limit.clamp(1, 1000) as i64;
    let offset = (req.page.max(1) as i64 - 1) * limit;

    match state.index.search_by_name(query, limit, offset).await {
        Ok(results) => {
            let total = results.len();
            Json(ApiResponse::success(SearchResponse { results, total }))
        }
        Err(e) => {
            tracing::error!("Search query failed: {:#}", e);
            Json(ApiResponse::error(&format!("搜索失败: {}", e)))
        }
    }
}

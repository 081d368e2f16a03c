use serde::{Deserialize, Serialize};

/// 搜索设置
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchSettings {
    pub enabled: bool,
    pub auto_update_index: bool,
    /// Newline-separated path prefixes excluded from indexing / 忽略路径，每行一个
    pub ignore_paths: String,
    pub max_index_depth: i32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            auto_update_index: true,
            ignore_paths: String::new(),
            max_index_depth: 20,
        }
    }
}

/// 更新索引请求
#[derive(Debug, Deserialize)]
pub struct UpdateIndexReq {
    pub paths: Vec<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: i32,
}

fn default_max_depth() -> i32 {
    20
}

/// 索引状态
#[derive(Debug, Serialize)]
pub struct IndexStatus {
    pub status: String,
    pub object_count: u64,
    pub index_size: u64,
    pub last_updated: Option<String>,
    pub error_message: Option<String>,
}

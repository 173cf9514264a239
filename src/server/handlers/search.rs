use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::types::SearchResult;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query_vector: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub nprobe: Option<usize>,
}

fn default_k() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

pub async fn search_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state
        .engine
        .search_with_nprobe(&name, &req.query_vector, req.k, req.nprobe)
        .await?;
    Ok(Json(SearchResponse { results }))
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::VecdexError;
use crate::registry::IndexDescriptor;
use crate::server::AppState;
use crate::types::IndexType;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    pub name: String,
    pub dimension: usize,
    /// Accepts any token `IndexType::from_str` understands.
    #[serde(default)]
    pub index_type: Option<String>,
    #[serde(default)]
    pub training_vectors: Option<Vec<Vec<f32>>>,
}

#[derive(Debug, Deserialize)]
pub struct TrainIndexRequest {
    pub vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub name: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
    pub dimension: usize,
    pub count: u64,
    pub trained: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListIndexesResponse {
    pub indexes: Vec<IndexResponse>,
}

impl From<IndexDescriptor> for IndexResponse {
    fn from(d: IndexDescriptor) -> Self {
        Self {
            name: d.name,
            index_type: d.index_type,
            dimension: d.dimension,
            count: d.vector_count,
            trained: d.trained,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

fn parse_index_type(token: Option<&str>) -> Result<IndexType, VecdexError> {
    match token {
        Some(t) => t.parse(),
        None => Ok(IndexType::default()),
    }
}

pub async fn create_index(
    State(state): State<AppState>,
    Json(req): Json<CreateIndexRequest>,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    let index_type = parse_index_type(req.index_type.as_deref())?;
    let descriptor = state
        .engine
        .create_index_with_sample(
            &req.name,
            req.dimension,
            index_type,
            req.training_vectors.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(descriptor.into())))
}

pub async fn list_indexes(State(state): State<AppState>) -> Json<ListIndexesResponse> {
    let indexes = state.engine.list_indexes().await;
    Json(ListIndexesResponse {
        indexes: indexes.into_iter().map(Into::into).collect(),
    })
}

pub async fn get_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<IndexResponse>, ApiError> {
    let descriptor = state.engine.describe_index(&name).await?;
    Ok(Json(descriptor.into()))
}

pub async fn delete_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_index(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn train_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<TrainIndexRequest>,
) -> Result<Json<IndexResponse>, ApiError> {
    let descriptor = state.engine.train_index(&name, &req.vectors).await?;
    Ok(Json(descriptor.into()))
}

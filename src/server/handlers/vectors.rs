use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::types::{Metadata, VectorId};

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddVectorsRequest {
    pub vectors: Vec<Vec<f32>>,
    #[serde(default)]
    pub ids: Option<Vec<VectorId>>,
    #[serde(default)]
    pub metadata: Option<Vec<Option<Metadata>>>,
}

#[derive(Debug, Serialize)]
pub struct AddVectorsResponse {
    pub added: usize,
    pub ids: Vec<VectorId>,
}

pub async fn add_vectors(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<AddVectorsRequest>,
) -> Result<Json<AddVectorsResponse>, ApiError> {
    let ids = state
        .engine
        .add_vectors(&name, req.vectors, req.ids, req.metadata)
        .await?;

    Ok(Json(AddVectorsResponse {
        added: ids.len(),
        ids,
    }))
}

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::server::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let indexes = state.engine.list_indexes().await.len();
    Json(json!({ "status": "ok", "indexes": indexes }))
}

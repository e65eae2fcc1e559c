use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let db = state.conn()?;
    db.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(Json(json!({ "success": true, "data": { "status": "ok" } })))
}

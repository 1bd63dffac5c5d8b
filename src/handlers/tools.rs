//! Tool listing and invocation over HTTP

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::tools::ToolDescriptor;

/// `GET /v1/tools`
pub async fn list_handler(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.tools().descriptors())
}

/// `POST /v1/tools/{name}`
///
/// Returns the tool outcome with `200 OK`, including `{ "error": ... }`
/// outcomes. An empty body is treated as `{}`. Unknown tools are `404`.
pub async fn execute_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("request body is not JSON: {}", e)))?
    };

    let outcome = state.tools().execute(&name, input).await?;
    Ok(Json(outcome))
}

use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde_json::json;

use super::render;
use crate::http_server::{error::AppError, state::AppState};

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    render(&state, "home/index", json!({}))
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::json;

use super::{parse_id, render};
use crate::http_server::{error::AppError, state::AppState};
use crate::repositories::LabelRepository;

#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let labels = LabelRepository::new(state.db.clone()).find_all().await?;

    render(&state, "labels/list", json!({ "labels": labels }))
}

#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Label")?;
    let Some(detail) = LabelRepository::new(state.db.clone()).detail(id).await? else {
        return Err(AppError::not_found("Label", id));
    };

    render(&state, "labels/detail", serde_json::to_value(&detail)?)
}

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde_json::json;

use super::{parse_id, render};
use crate::http_server::{error::AppError, state::AppState};
use crate::repositories::ArtistRepository;

#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let artists = ArtistRepository::new(state.db.clone())
        .list_complete()
        .await?;

    render(&state, "artists/list", json!({ "artists": artists }))
}

#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Artist")?;
    let Some(detail) = ArtistRepository::new(state.db.clone()).detail(id).await? else {
        return Err(AppError::not_found("Artist", id));
    };

    render(&state, "artists/detail", serde_json::to_value(&detail)?)
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde_json::json;

use super::{parse_id, render};
use crate::http_server::{error::AppError, state::AppState};
use crate::pagination::{ALBUM_PAGE_SIZE, PageRequest, parse_page};
use crate::repositories::AlbumRepository;

/// First `page` value of the query string, if any.
fn page_param(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str())
}

#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let request = PageRequest::new(parse_page(page_param(&params)), ALBUM_PAGE_SIZE);
    let page = AlbumRepository::new(state.db.clone())
        .list_page(request)
        .await?;

    render(
        &state,
        "albums/list",
        json!({ "albums": page.items, "pagination": page.pagination }),
    )
}

#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id, "Album")?;
    let Some(detail) = AlbumRepository::new(state.db.clone()).detail(id).await? else {
        return Err(AppError::not_found("Album", id));
    };

    render(&state, "albums/detail", serde_json::to_value(&detail)?)
}

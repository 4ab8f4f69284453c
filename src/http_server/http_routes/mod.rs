use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::http_server::{error::AppError, state::AppState};

pub mod albums;
pub mod artists;
pub mod home;
pub mod labels;

/// Renders `view` with `context` through the configured renderer.
pub(crate) fn render(
    state: &AppState,
    view: &str,
    context: serde_json::Value,
) -> Result<Response, AppError> {
    let body = state.renderer.render(view, &context)?;
    Ok(([(header::CONTENT_TYPE, state.renderer.content_type())], body).into_response())
}

/// Path ids that are not integers cannot name a row.
pub(crate) fn parse_id(raw: &str, entity: &'static str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::not_found(entity, raw))
}

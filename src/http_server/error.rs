use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

/// Error boundary of the HTTP layer.
///
/// `NotFound` is an expected outcome of detail lookups. Anything else is
/// produced via `?` on a `color_eyre::Report` (or any error convertible into
/// one) and ends up as a 500.
pub enum AppError {
    NotFound { entity: &'static str, id: String },
    Internal(color_eyre::Report),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::Internal(err) => err.fmt(f),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<color_eyre::Report>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response<Body> {
        match self {
            Self::NotFound { entity, id } => {
                tracing::debug!(entity, id = %id, "Not found");
                (StatusCode::NOT_FOUND, format!("{entity} not found")).into_response()
            }
            Self::Internal(err) => {
                tracing::error!("{err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
                    .into_response()
            }
        }
    }
}

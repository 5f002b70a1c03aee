use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::generator::GenerateError;
use crate::store::StoreError;

/// Errors returned by HTTP handlers
///
/// Implements [`IntoResponse`] so handlers can use `?` and still produce a
/// consistent JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Page generation failed
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// The request was malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The revalidation secret did not match
    #[error("Invalid revalidation secret")]
    Unauthorized,
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        ServerError::Generate(GenerateError::Store(err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::Generate(GenerateError::Store(err)) => {
                tracing::error!(error = %err, kind = err.kind(), "Content store request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "STORE_UNAVAILABLE",
                    "The content store could not be reached".to_string(),
                )
            }
            ServerError::Generate(GenerateError::Render(err)) => {
                tracing::error!(error = ?err, "Template rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ServerError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

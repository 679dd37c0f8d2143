use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the backing key/value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Outcome taxonomy of the vault protocol.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or malformed request field. Rejected before the store is touched.
    #[error("{0}")]
    Validation(String),

    /// An unexpired record already exists under this lookup key.
    #[error("A message already exists for this password. Use a different password.")]
    Conflict,

    /// Never stored, already read, or expired. Deliberately indistinguishable.
    #[error("No message found. It may have already been read or expired.")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let status = match &self {
            VaultError::Validation(_) => StatusCode::BAD_REQUEST,
            VaultError::Conflict => StatusCode::CONFLICT,
            VaultError::NotFound => StatusCode::NOT_FOUND,
            VaultError::Store(e) => {
                tracing::error!(error = %e, "internal error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal server error"})),
                )
                    .into_response();
            }
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

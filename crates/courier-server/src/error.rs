use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Media not found: {0}")]
    MediaNotFound(String),

    #[error("Media too large: {size} bytes (max {max})")]
    MediaTooLarge { size: usize, max: usize },

    #[error("Media storage error: {0}")]
    MediaStorage(String),

    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing field, unknown type, or an undecodable media payload on the
    /// relay channel.  Fatal for that channel, never surfaced over HTTP.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Storage error: {0}")]
    Store(#[from] courier_store::StoreError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::MediaNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::MediaTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ServerError::MediaStorage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Media storage error".to_string(),
            ),
            ServerError::UnknownIdentity(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::MalformedEvent(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage error".to_string(),
            ),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by lobby operations.
///
/// Every variant except `Internal` is an expected, recoverable outcome that the
/// client displays and may retry. `Internal` wraps datastore and collaborator
/// failures; its details are logged, never returned.
#[derive(Error, Debug)]
pub enum LobbyError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LobbyError {
    pub fn lobby_not_found() -> Self {
        Self::NotFound("Lobby not found".to_string())
    }

    pub fn host_only(action: &str) -> Self {
        Self::Unauthorized(format!("Only the host can {}", action))
    }

    /// Stable machine-readable kind, used as the `error` field of responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::Unauthorized(_) | Self::AuthenticationRequired => "unauthorized",
            Self::Validation(_) => "validation_error",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for LobbyError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

/// Malformed or mistyped request bodies are validation failures, not 422s.
impl From<JsonRejection> for LobbyError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for LobbyError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(err) => {
                error!(error = ?err, "Internal error while handling lobby request");
                "Something went wrong, please try again".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };

        (self.status_code(), Json(body)).into_response()
    }
}

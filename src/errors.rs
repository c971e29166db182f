use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Caller-facing error kinds. All domain errors are synchronous and
/// non-retryable; store failures propagate unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Store(#[from] mongodb::error::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn bad_request(message: &str) -> Self {
        ServiceError::BadRequest(message.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        ServiceError::Unauthorized(message.to_string())
    }

    pub fn forbidden(message: &str) -> Self {
        ServiceError::Forbidden(message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        ServiceError::NotFound(message.to_string())
    }

    pub fn conflict(message: &str) -> Self {
        ServiceError::Conflict(message.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) | ServiceError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Internal details are logged, never serialized to the client.
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::warn!(error = %self, "internal failure");
            "internal error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({ "message": message }))
    }
}

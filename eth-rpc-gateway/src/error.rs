use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::envelope::ApiResponse;

/// Message returned when a write is attempted in read-only mode.
pub const NO_SIGNER_MESSAGE: &str = "no signing key configured";

/// Service-specific error types
///
/// Every failure a route can produce falls into one of these four buckets.
/// The variant decides the HTTP status; the carried message is what the
/// caller sees in the `error` field of the envelope.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    /// The requested object does not exist (yet)
    #[error("{0}")]
    NotFound(String),

    /// A write was attempted without a signer
    #[error("{0}")]
    Configuration(String),

    /// Anything that went wrong talking to the node or inside the client library
    #[error("{0}")]
    Upstream(String),
}

impl ServiceError {
    pub fn no_signer() -> Self {
        ServiceError::Configuration(NO_SIGNER_MESSAGE.to_string())
    }

    pub fn upstream(err: impl std::fmt::Display) -> Self {
        ServiceError::Upstream(err.to_string())
    }

    /// Machine-readable error code, used as a log field
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Configuration(_) => "CONFIGURATION_ERROR",
            ServiceError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

impl ResponseError for ServiceError {
    /// Render the failure envelope `{"success": false, "error": ...}`
    fn error_response(&self) -> HttpResponse {
        tracing::warn!(
            error_code = self.error_code(),
            status = self.status_code().as_u16(),
            "{}",
            self
        );
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::failure(self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Every failure the codec, key validator and pipelines can report.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("{0}")]
    InvalidFormat(String),

    #[error("Keys do not form a valid pair: {0}")]
    Mismatch(String),

    #[error("Message too long: {size} (max: {max})")]
    MessageTooLong { size: usize, max: usize },

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Byte {0:#04x} has no symbol in the alphabet")]
    ByteOutOfRange(u8),

    #[error("Invalid emoji sequence: {0}")]
    InvalidSymbolSequence(String),

    #[error("The private key does not match the public key used for encryption")]
    DecryptionFailed,

    #[error("Decrypted data is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CryptoError {
    /// Whether the caller supplied bad input, as opposed to an internal failure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CryptoError::Unexpected(_))
    }
}

impl From<std::io::Error> for CryptoError {
    fn from(e: std::io::Error) -> Self {
        CryptoError::Unexpected(format!("I/O error: {}", e))
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// HTTP-facing error. Client mistakes become 400 with the detail; anything
/// unexpected is logged here and reported as a generic 500.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Crypto(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServiceError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            ServiceError::BadRequest(msg) | ServiceError::Timeout(msg) => msg.clone(),
            ServiceError::Crypto(e) if e.is_client_error() => e.to_string(),
            ServiceError::NotFound => self.to_string(),
            ServiceError::Crypto(_) | ServiceError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                "Internal server error".into()
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

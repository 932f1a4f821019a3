//! Error types for signature, token, and challenge handling.
//!
//! Protocol errors stay distinct internally (callers and logs can tell a
//! replay-window violation from a bad encoding), but the HTTP mapping collapses
//! all authentication failures into a single `401 Unauthorized` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no msg")]
    EmptyMessage,

    #[error("invalid compact signature size")]
    InvalidSignatureSize,

    #[error("invalid compact signature: {0}")]
    InvalidSignature(String),

    #[error("{0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("invalid signature (too short)")]
    TokenTooShort,

    #[error("too early")]
    TooEarly,

    #[error("too late")]
    TooLate,

    #[error("credential rejected: {0}")]
    Credential(#[from] jsonwebtoken::errors::Error),

    #[error("identity contains characters outside the allowed set")]
    InvalidIdentity,

    #[error("token is neither a valid credential ({bearer}) nor a valid signed token ({tribe})")]
    UnrecognizedToken { bearer: String, tribe: String },

    #[error("no token presented")]
    MissingToken,

    #[error("challenge not found")]
    ChallengeNotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used for logging and for the HTTP mapping.
///
/// A signature that fails to recover is malformed input: recovery either
/// yields a key or the bytes were wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    ReplayWindow,
    NotFound,
    Unauthorized,
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyMessage
            | Self::InvalidSignatureSize
            | Self::InvalidEncoding(_)
            | Self::InvalidSignature(_)
            | Self::TokenTooShort
            | Self::InvalidIdentity
            | Self::MalformedBody(_) => ErrorKind::MalformedInput,
            Self::TooEarly | Self::TooLate => ErrorKind::ReplayWindow,
            Self::ChallengeNotFound => ErrorKind::NotFound,
            Self::Credential(_)
            | Self::UnrecognizedToken { .. }
            | Self::MissingToken
            | Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    fn status_code(&self) -> StatusCode {
        // Only an unparseable request body is reported distinctly.
        if matches!(self, Self::MalformedBody(_)) {
            return StatusCode::NOT_ACCEPTABLE;
        }
        match self.kind() {
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match status {
            StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
            StatusCode::NOT_ACCEPTABLE => "Not Acceptable".to_string(),
            _ => "Internal Server Error".to_string(),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Start-up configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required. Set it in the environment before starting the service.")]
    MissingSecret(&'static str),

    #[error(
        "Admin free pass is active in production. Set ADMIN_STRINGS and do not pair \
ADMIN_DEV_FREE_PASS with a single SUPER_ADMINS entry."
    )]
    FreePassInProduction,

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

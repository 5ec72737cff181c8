use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol error taxonomy. The display strings are what travels on the
/// wire, so they stay coarse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum GreetingError {
    #[error("invitation not found")]
    NotFound,
    #[error("command not allowed in current state")]
    ProtocolViolation,
    #[error("authentication failed")]
    AuthFailed,
    #[error("invalid admission credential")]
    InvalidCredential,
    #[error("notarization failed")]
    WriteFailed,
    #[error("notarization timed out")]
    WriteTimeout,
    #[error("invitation busy")]
    Busy,
    #[error("malformed command")]
    Malformed,
}

impl GreetingError {
    /// Whether the same command may be retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GreetingError::Busy)
    }
}

pub const ERROR_NOT_FOUND: &str = "not_found";
pub const ERROR_PROTOCOL_VIOLATION: &str = "protocol_violation";
pub const ERROR_AUTH_FAILED: &str = "auth_failed";
pub const ERROR_INVALID_CREDENTIAL: &str = "invalid_credential";
pub const ERROR_WRITE_FAILED: &str = "write_failed";
pub const ERROR_WRITE_TIMEOUT: &str = "write_timeout";
pub const ERROR_BUSY: &str = "busy";
pub const ERROR_MALFORMED: &str = "malformed";

pub fn error_kind_to_code(error: &GreetingError) -> &'static str {
    match error {
        GreetingError::NotFound => ERROR_NOT_FOUND,
        GreetingError::ProtocolViolation => ERROR_PROTOCOL_VIOLATION,
        GreetingError::AuthFailed => ERROR_AUTH_FAILED,
        GreetingError::InvalidCredential => ERROR_INVALID_CREDENTIAL,
        GreetingError::WriteFailed => ERROR_WRITE_FAILED,
        GreetingError::WriteTimeout => ERROR_WRITE_TIMEOUT,
        GreetingError::Busy => ERROR_BUSY,
        GreetingError::Malformed => ERROR_MALFORMED,
    }
}

pub fn error_kind_from_code(code: &str) -> Option<GreetingError> {
    match code {
        ERROR_NOT_FOUND => Some(GreetingError::NotFound),
        ERROR_PROTOCOL_VIOLATION => Some(GreetingError::ProtocolViolation),
        ERROR_AUTH_FAILED => Some(GreetingError::AuthFailed),
        ERROR_INVALID_CREDENTIAL => Some(GreetingError::InvalidCredential),
        ERROR_WRITE_FAILED => Some(GreetingError::WriteFailed),
        ERROR_WRITE_TIMEOUT => Some(GreetingError::WriteTimeout),
        ERROR_BUSY => Some(GreetingError::Busy),
        ERROR_MALFORMED => Some(GreetingError::Malformed),
        _ => None,
    }
}

//! Client-side error taxonomy.

use crate::error::{ErrorResponse, ExchangeError};

/// Failure of a client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected, either locally before sending or by the server.
    #[error("{0}")]
    Validation(String),

    /// Missing, stale or invalid identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity valid, but the row belongs to someone else.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate name, or the event is already revealed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request never completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Server failed, or answered with something unreadable.
    #[error("server error: {0}")]
    Server(String),

    /// Local identity or offline data file could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Maps an HTTP error status and message to a variant.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => Self::Validation(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Server(message),
        }
    }

    /// Maps a structured error body returned by the server.
    #[must_use]
    pub fn from_response(status: u16, body: ErrorResponse) -> Self {
        Self::from_status(status, body.error.message)
    }

    /// True for failures caused by the caller's identity.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Forbidden(_))
    }
}

impl From<ExchangeError> for ClientError {
    fn from(err: ExchangeError) -> Self {
        Self::from_status(err.status_code().as_u16(), err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Server(format!("unreadable response: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_errors_keep_their_category() {
        assert!(matches!(
            ClientError::from(ExchangeError::SelfGift),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from(ExchangeError::InvalidCredentials),
            ClientError::Unauthorized(_)
        ));
        assert!(matches!(
            ClientError::from(ExchangeError::NameTaken("bob".into())),
            ClientError::Conflict(_)
        ));
        assert!(ClientError::from(ExchangeError::Forbidden("x".into())).is_auth());
    }

    #[test]
    fn unknown_status_is_server_error() {
        assert!(matches!(
            ClientError::from_status(502, "bad gateway".into()),
            ClientError::Server(_)
        ));
    }
}

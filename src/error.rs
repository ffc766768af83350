//! Server error types with HTTP status code mapping.
//!
//! [`ExchangeError`] is the central error type for the exchange server. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{GiftId, ParticipantId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4004,
///     "message": "forbidden: only the sender may change this gift",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see ranges on [`ExchangeError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                  |
/// |-----------|--------------------|------------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request              |
/// | 2000–2999 | Not Found/Conflict | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server             | 500 Internal Server Error    |
/// | 4000–4999 | Authorization      | 401 Unauthorized / 403 Forbidden |
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Display name failed validation.
    #[error("invalid display name: {0}")]
    InvalidName(String),

    /// Sender and recipient are the same participant.
    #[error("a gift cannot be addressed to its sender")]
    SelfGift,

    /// Recipient is not a participant of the event.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(ParticipantId),

    /// Gift with the given ID was not found.
    #[error("gift not found: {0}")]
    GiftNotFound(GiftId),

    /// Participant with the given ID was not found.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// Another participant already uses this display name.
    #[error("display name already taken: {0}")]
    NameTaken(String),

    /// The event has been revealed; gifts can no longer be added.
    #[error("the event has already been revealed")]
    EventRevealed,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// No participant credentials on a request that needs them.
    #[error("missing participant credentials")]
    MissingCredentials,

    /// Participant id unknown or player key wrong.
    #[error("invalid participant credentials")]
    InvalidCredentials,

    /// Join attempted with the wrong event passcode.
    #[error("wrong event passcode")]
    WrongPasscode,

    /// Authenticated, but acting on someone else's record.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl ExchangeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidName(_) => 1002,
            Self::SelfGift => 1003,
            Self::UnknownRecipient(_) => 1004,
            Self::GiftNotFound(_) => 2001,
            Self::ParticipantNotFound(_) => 2002,
            Self::NameTaken(_) => 2003,
            Self::EventRevealed => 2004,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::MissingCredentials => 4001,
            Self::InvalidCredentials => 4002,
            Self::WrongPasscode => 4003,
            Self::Forbidden(_) => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidName(_)
            | Self::SelfGift
            | Self::UnknownRecipient(_) => StatusCode::BAD_REQUEST,
            Self::GiftNotFound(_) | Self::ParticipantNotFound(_) => StatusCode::NOT_FOUND,
            Self::NameTaken(_) | Self::EventRevealed => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingCredentials | Self::InvalidCredentials | Self::WrongPasscode => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ExchangeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

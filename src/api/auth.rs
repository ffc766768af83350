//! Caller identity from request headers.

use axum::http::HeaderMap;

use crate::domain::{ParticipantId, PlayerKey};
use crate::error::ExchangeError;
use crate::service::Credentials;

/// Header carrying the caller's participant id.
pub const PARTICIPANT_ID_HEADER: &str = "x-participant-id";

/// Header carrying the caller's player key.
pub const PLAYER_KEY_HEADER: &str = "x-player-key";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Reads credentials that may be absent. Returns `Ok(None)` when neither
/// header is present.
///
/// # Errors
///
/// Returns [`ExchangeError::InvalidCredentials`] if only one header is set
/// or the id is not a UUID.
pub fn optional_credentials(headers: &HeaderMap) -> Result<Option<Credentials>, ExchangeError> {
    match (
        header_str(headers, PARTICIPANT_ID_HEADER),
        header_str(headers, PLAYER_KEY_HEADER),
    ) {
        (None, None) => Ok(None),
        (Some(id), Some(key)) => {
            let participant_id: ParticipantId = id
                .parse()
                .map_err(|_| ExchangeError::InvalidCredentials)?;
            Ok(Some(Credentials {
                participant_id,
                player_key: PlayerKey::from_string(key),
            }))
        }
        _ => Err(ExchangeError::InvalidCredentials),
    }
}

/// Reads mandatory credentials.
///
/// # Errors
///
/// Returns [`ExchangeError::MissingCredentials`] when no headers are sent.
pub fn require_credentials(headers: &HeaderMap) -> Result<Credentials, ExchangeError> {
    optional_credentials(headers)?.ok_or(ExchangeError::MissingCredentials)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn absent_headers_mean_anonymous() {
        assert!(matches!(optional_credentials(&HeaderMap::new()), Ok(None)));
        assert!(matches!(
            require_credentials(&HeaderMap::new()),
            Err(ExchangeError::MissingCredentials)
        ));
    }

    #[test]
    fn half_credentials_are_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(PLAYER_KEY_HEADER, HeaderValue::from_static("abc"));
        assert!(matches!(
            optional_credentials(&headers),
            Err(ExchangeError::InvalidCredentials)
        ));
    }

    #[test]
    fn both_headers_parse() {
        let id = ParticipantId::new();
        let mut headers = HeaderMap::new();
        let Ok(value) = HeaderValue::from_str(&id.to_string()) else {
            panic!("uuid is a valid header value");
        };
        headers.insert(PARTICIPANT_ID_HEADER, value);
        headers.insert(PLAYER_KEY_HEADER, HeaderValue::from_static("secret"));
        let Ok(creds) = require_credentials(&headers) else {
            panic!("credentials rejected");
        };
        assert_eq!(creds.participant_id, id);
        assert_eq!(creds.player_key.expose(), "secret");
    }
}

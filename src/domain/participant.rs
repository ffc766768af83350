//! Participants and display-name handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ParticipantId;
use crate::error::ExchangeError;

/// Minimum display-name length in characters, after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// Maximum display-name length in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 40;

/// Canonical form used for uniqueness checks and name-based matching:
/// trimmed, internal whitespace collapsed to one space, lower-cased.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-insensitive display-name comparison.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}

/// A validated display name. Keeps the participant's own casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validates and trims a raw display name.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::InvalidName`] if the trimmed name is shorter
    /// than [`MIN_NAME_CHARS`] or longer than [`MAX_NAME_CHARS`].
    pub fn parse(raw: &str) -> Result<Self, ExchangeError> {
        let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let len = trimmed.chars().count();
        if len < MIN_NAME_CHARS {
            return Err(ExchangeError::InvalidName(format!(
                "display name must be at least {MIN_NAME_CHARS} characters"
            )));
        }
        if len > MAX_NAME_CHARS {
            return Err(ExchangeError::InvalidName(format!(
                "display name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        Ok(Self(trimmed))
    }

    /// Returns the display name as entered (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the normalized key used for uniqueness.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize_name(&self.0)
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ExchangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member of the gift exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Identifier minted on join.
    pub id: ParticipantId,
    /// Display name, unique per event after normalization.
    pub display_name: DisplayName,
    /// Whether this participant has signalled readiness for the reveal.
    pub is_ready: bool,
    /// Join timestamp; participant lists are ordered by it.
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Creates a freshly joined, not-yet-ready participant.
    #[must_use]
    pub fn new(display_name: DisplayName) -> Self {
        Self {
            id: ParticipantId::new(),
            display_name,
            is_ready: false,
            joined_at: Utc::now(),
        }
    }
}

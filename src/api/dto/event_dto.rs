//! Event and reveal DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::RevealOutcome;
use crate::service::EventStatus;

/// Response body for `GET /event`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Event title.
    pub name: String,
    /// Senders are visible to everyone once set.
    pub is_revealed: bool,
    /// When the reveal happened.
    #[serde(default)]
    pub revealed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Participants marked ready.
    pub ready_count: usize,
    /// All participants.
    pub participant_count: usize,
}

impl From<EventStatus> for EventDto {
    fn from(status: EventStatus) -> Self {
        Self {
            id: *status.event.id.as_uuid(),
            name: status.event.name,
            is_revealed: status.event.is_revealed,
            revealed_at: status.event.revealed_at,
            created_at: status.event.created_at,
            ready_count: status.readiness.ready,
            participant_count: status.readiness.total,
        }
    }
}

/// Response body for `POST /event/reveal`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevealResponse {
    /// `revealed`, `already_revealed` or `not_yet`.
    pub outcome: String,
    /// Event state after the request.
    pub event: EventDto,
}

impl RevealResponse {
    /// Builds the response from a reveal outcome and the event afterwards.
    #[must_use]
    pub fn new(outcome: RevealOutcome, event: EventDto) -> Self {
        let outcome = match outcome {
            RevealOutcome::Revealed => "revealed",
            RevealOutcome::AlreadyRevealed => "already_revealed",
            RevealOutcome::NotYet { .. } => "not_yet",
        };
        Self {
            outcome: outcome.to_string(),
            event,
        }
    }
}

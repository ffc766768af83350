//! Join and participant DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{DisplayName, Participant, ParticipantId};
use crate::error::ExchangeError;

/// Request body for `POST /join`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// Shared event passcode.
    pub passcode: String,
    /// Desired display name (2–40 characters).
    pub display_name: String,
}

/// Response body for `POST /join` (201 Created).
///
/// `player_key` is returned exactly once; the server keeps only its hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JoinResponse {
    /// The new participant.
    pub participant: ParticipantDto,
    /// Secret to send as `x-player-key` on later requests.
    pub player_key: String,
    /// The event joined.
    pub event_id: uuid::Uuid,
}

/// A participant as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantDto {
    /// Participant identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub display_name: String,
    /// Ready for the reveal.
    pub is_ready: bool,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
}

impl From<&Participant> for ParticipantDto {
    fn from(p: &Participant) -> Self {
        Self {
            id: *p.id.as_uuid(),
            display_name: p.display_name.to_string(),
            is_ready: p.is_ready,
            joined_at: p.joined_at,
        }
    }
}

impl TryFrom<ParticipantDto> for Participant {
    type Error = ExchangeError;

    fn try_from(dto: ParticipantDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ParticipantId::from_uuid(dto.id),
            display_name: DisplayName::parse(&dto.display_name)?,
            is_ready: dto.is_ready,
            joined_at: dto.joined_at,
        })
    }
}

/// Response body for `GET /participants`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipantListResponse {
    /// Participants in join order.
    pub data: Vec<ParticipantDto>,
}

/// Request body for `PATCH /participants/me`.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Readiness for the reveal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
}

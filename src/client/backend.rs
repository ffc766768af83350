//! The seam between the session and wherever the exchange lives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::domain::{
    EventId, GiftId, GiftPatch, GiftView, NewGift, Participant, ParticipantId, Readiness,
    RevealOutcome,
};

/// Who this client is acting as.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Participant id minted on join.
    pub participant_id: ParticipantId,
    /// Display name at join or last rename.
    pub display_name: String,
    /// Secret proving the identity to the server.
    pub player_key: String,
    /// Event joined, when known.
    #[serde(default)]
    pub event_id: Option<EventId>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("participant_id", &self.participant_id)
            .field("display_name", &self.display_name)
            .field("player_key", &"***")
            .field("event_id", &self.event_id)
            .finish()
    }
}

/// Event state as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventState {
    /// Event title.
    pub name: String,
    /// Reveal latch.
    pub is_revealed: bool,
    /// Readiness counts.
    pub readiness: Readiness,
}

/// Operations the session needs from a backing store.
///
/// Gifts come back already redacted for `me`.
#[async_trait]
pub trait ExchangeBackend: Send + Sync + std::fmt::Debug {
    /// Joins the event and mints an identity.
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] on a wrong passcode,
    /// [`ClientError::Conflict`] if the name is taken.
    async fn join(&self, passcode: &str, display_name: &str) -> Result<Identity, ClientError>;

    /// Participants in join order.
    ///
    /// # Errors
    ///
    /// Transport or server failures.
    async fn participants(&self) -> Result<Vec<Participant>, ClientError>;

    /// Gifts in creation order, redacted for `me` (anonymous when `None`).
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] if `me` is stale.
    async fn gifts(&self, me: Option<&Identity>) -> Result<Vec<GiftView>, ClientError>;

    /// Event state.
    ///
    /// # Errors
    ///
    /// Transport or server failures.
    async fn event(&self) -> Result<EventState, ClientError>;

    /// Records a gift from `me`.
    ///
    /// # Errors
    ///
    /// Validation, auth or conflict failures.
    async fn add_gift(&self, me: &Identity, gift: NewGift) -> Result<GiftView, ClientError>;

    /// Edits a gift `me` sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Forbidden`] unless `me` sent it.
    async fn update_gift(
        &self,
        me: &Identity,
        id: GiftId,
        patch: GiftPatch,
    ) -> Result<GiftView, ClientError>;

    /// Flips the lock of a gift `me` sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Forbidden`] unless `me` sent it.
    async fn toggle_lock(&self, me: &Identity, id: GiftId) -> Result<GiftView, ClientError>;

    /// Deletes a gift `me` sent.
    ///
    /// # Errors
    ///
    /// [`ClientError::Forbidden`] unless `me` sent it.
    async fn delete_gift(&self, me: &Identity, id: GiftId) -> Result<(), ClientError>;

    /// Renames `me` and/or sets readiness.
    ///
    /// # Errors
    ///
    /// Validation, auth or conflict failures.
    async fn update_me(
        &self,
        me: &Identity,
        display_name: Option<String>,
        is_ready: Option<bool>,
    ) -> Result<Participant, ClientError>;

    /// Asks for the group reveal.
    ///
    /// # Errors
    ///
    /// Auth or transport failures. An unmet precondition is
    /// [`RevealOutcome::NotYet`], not an error.
    async fn request_reveal(&self, me: &Identity) -> Result<RevealOutcome, ClientError>;

    /// Removes `me` from the event.
    ///
    /// # Errors
    ///
    /// Auth or transport failures.
    async fn leave(&self, me: &Identity) -> Result<(), ClientError>;
}

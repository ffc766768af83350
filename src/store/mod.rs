//! Storage layer for events, participants and gifts.
//!
//! [`ExchangeStore`] is plain row storage: it enforces uniqueness and
//! referential rules (one display name per event, cascade on participant
//! removal, reveal latch) but knows nothing about who is calling. Access
//! rules live in [`crate::service`].
//!
//! Two implementations: [`MemoryStore`] for single-process deployments and
//! tests, [`PostgresStore`] for durable storage via `sqlx`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;

use crate::domain::{Event, Gift, GiftId, Participant, ParticipantId, RevealOutcome};
use crate::error::ExchangeError;

/// A participant row together with the hash of its player key.
#[derive(Debug, Clone)]
pub struct StoredParticipant {
    /// Public participant record.
    pub participant: Participant,
    /// Argon2id hash of the player key.
    pub key_hash: String,
}

/// Row storage for the single global event.
#[async_trait]
pub trait ExchangeStore: Send + Sync + std::fmt::Debug {
    /// Returns the event.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::PersistenceError`] on storage failure.
    async fn event(&self) -> Result<Event, ExchangeError>;

    /// Sets the reveal latch if every participant is ready, checking and
    /// setting in one step so no unready participant can slip in between.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::PersistenceError`] on storage failure.
    async fn reveal_if_all_ready(&self) -> Result<RevealOutcome, ExchangeError>;

    /// Lists participants in join order.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::PersistenceError`] on storage failure.
    async fn list_participants(&self) -> Result<Vec<Participant>, ExchangeError>;

    /// Loads a participant with its key hash, if present.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::PersistenceError`] on storage failure.
    async fn find_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<StoredParticipant>, ExchangeError>;

    /// Inserts a participant.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::NameTaken`] if the normalized display name
    /// is already used.
    async fn insert_participant(&self, row: StoredParticipant) -> Result<(), ExchangeError>;

    /// Overwrites a participant's display name and readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::ParticipantNotFound`] if absent, or
    /// [`ExchangeError::NameTaken`] if the new name collides with another
    /// participant.
    async fn update_participant(&self, participant: &Participant) -> Result<(), ExchangeError>;

    /// Removes a participant and every gift they sent or received.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::ParticipantNotFound`] if absent.
    async fn remove_participant(&self, id: ParticipantId) -> Result<(), ExchangeError>;

    /// Lists gifts in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::PersistenceError`] on storage failure.
    async fn list_gifts(&self) -> Result<Vec<Gift>, ExchangeError>;

    /// Loads one gift.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::GiftNotFound`] if absent.
    async fn get_gift(&self, id: GiftId) -> Result<Gift, ExchangeError>;

    /// Inserts a gift. Both parties must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::UnknownRecipient`] if the recipient is not a
    /// participant.
    async fn insert_gift(&self, gift: Gift) -> Result<(), ExchangeError>;

    /// Overwrites a gift's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::GiftNotFound`] if absent.
    async fn update_gift(&self, gift: &Gift) -> Result<(), ExchangeError>;

    /// Deletes a gift.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::GiftNotFound`] if absent.
    async fn delete_gift(&self, id: GiftId) -> Result<(), ExchangeError>;
}

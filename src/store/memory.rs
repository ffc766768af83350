//! In-process store backed by `tokio::sync::RwLock`-guarded maps.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ExchangeStore, StoredParticipant};
use crate::domain::{Event, Gift, GiftId, Participant, ParticipantId, RevealOutcome};
use crate::error::ExchangeError;

/// In-memory store for one event.
///
/// # Concurrency
///
/// Each table has its own lock. Operations that touch both tables take the
/// participant lock before the gift lock. Concurrent writers to the same
/// row: last write wins.
#[derive(Debug)]
pub struct MemoryStore {
    event: RwLock<Event>,
    participants: RwLock<HashMap<ParticipantId, StoredParticipant>>,
    gifts: RwLock<HashMap<GiftId, Gift>>,
}

impl MemoryStore {
    /// Creates an empty store around a fresh event.
    #[must_use]
    pub fn new(event_name: &str) -> Self {
        Self {
            event: RwLock::new(Event::new(event_name)),
            participants: RwLock::new(HashMap::new()),
            gifts: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ExchangeStore for MemoryStore {
    async fn event(&self) -> Result<Event, ExchangeError> {
        Ok(self.event.read().await.clone())
    }

    async fn reveal_if_all_ready(&self) -> Result<RevealOutcome, ExchangeError> {
        // Participant lock first, held until the latch is set.
        let participants = self.participants.read().await;
        let mut event = self.event.write().await;
        let roster: Vec<Participant> = participants
            .values()
            .map(|row| row.participant.clone())
            .collect();
        Ok(event.request_reveal(&roster))
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, ExchangeError> {
        let map = self.participants.read().await;
        let mut list: Vec<Participant> = map.values().map(|row| row.participant.clone()).collect();
        list.sort_by_key(|p| (p.joined_at, p.id));
        Ok(list)
    }

    async fn find_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<StoredParticipant>, ExchangeError> {
        Ok(self.participants.read().await.get(&id).cloned())
    }

    async fn insert_participant(&self, row: StoredParticipant) -> Result<(), ExchangeError> {
        let mut map = self.participants.write().await;
        let key = row.participant.display_name.normalized();
        if map
            .values()
            .any(|existing| existing.participant.display_name.normalized() == key)
        {
            return Err(ExchangeError::NameTaken(
                row.participant.display_name.to_string(),
            ));
        }
        map.insert(row.participant.id, row);
        Ok(())
    }

    async fn update_participant(&self, participant: &Participant) -> Result<(), ExchangeError> {
        let mut map = self.participants.write().await;
        let key = participant.display_name.normalized();
        if map.values().any(|existing| {
            existing.participant.id != participant.id
                && existing.participant.display_name.normalized() == key
        }) {
            return Err(ExchangeError::NameTaken(participant.display_name.to_string()));
        }
        let row = map
            .get_mut(&participant.id)
            .ok_or(ExchangeError::ParticipantNotFound(participant.id))?;
        row.participant.display_name = participant.display_name.clone();
        row.participant.is_ready = participant.is_ready;
        Ok(())
    }

    async fn remove_participant(&self, id: ParticipantId) -> Result<(), ExchangeError> {
        let mut map = self.participants.write().await;
        map.remove(&id)
            .ok_or(ExchangeError::ParticipantNotFound(id))?;
        let mut gifts = self.gifts.write().await;
        gifts.retain(|_, g| g.from_participant_id != id && g.to_participant_id != id);
        Ok(())
    }

    async fn list_gifts(&self) -> Result<Vec<Gift>, ExchangeError> {
        let map = self.gifts.read().await;
        let mut list: Vec<Gift> = map.values().cloned().collect();
        list.sort_by_key(|g| (g.created_at, g.id));
        Ok(list)
    }

    async fn get_gift(&self, id: GiftId) -> Result<Gift, ExchangeError> {
        self.gifts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ExchangeError::GiftNotFound(id))
    }

    async fn insert_gift(&self, gift: Gift) -> Result<(), ExchangeError> {
        let participants = self.participants.read().await;
        if !participants.contains_key(&gift.from_participant_id) {
            return Err(ExchangeError::ParticipantNotFound(gift.from_participant_id));
        }
        if !participants.contains_key(&gift.to_participant_id) {
            return Err(ExchangeError::UnknownRecipient(gift.to_participant_id));
        }
        let mut gifts = self.gifts.write().await;
        if gifts.contains_key(&gift.id) {
            return Err(ExchangeError::InvalidRequest(format!(
                "gift {} already exists",
                gift.id
            )));
        }
        gifts.insert(gift.id, gift);
        Ok(())
    }

    async fn update_gift(&self, gift: &Gift) -> Result<(), ExchangeError> {
        let mut map = self.gifts.write().await;
        let slot = map
            .get_mut(&gift.id)
            .ok_or(ExchangeError::GiftNotFound(gift.id))?;
        slot.status = gift.status;
        slot.images = gift.images.clone();
        slot.message = gift.message.clone();
        slot.is_unlocked = gift.is_unlocked;
        Ok(())
    }

    async fn delete_gift(&self, id: GiftId) -> Result<(), ExchangeError> {
        self.gifts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(ExchangeError::GiftNotFound(id))
    }
}

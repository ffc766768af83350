//! Exchange service: authorization and state transitions.

use std::sync::Arc;

use crate::domain::{
    DisplayName, Event, EventId, Gift, GiftId, GiftPatch, GiftView, NewGift, Participant,
    ParticipantId, PartyRef, PasscodeGate, PlayerKey, Readiness, RevealOutcome,
};
use crate::error::ExchangeError;
use crate::store::{ExchangeStore, StoredParticipant};

/// Identity presented by a caller: participant id plus player key.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Claimed participant.
    pub participant_id: ParticipantId,
    /// Key minted for that participant on join.
    pub player_key: PlayerKey,
}

/// Result of a successful join. The key is shown to its owner exactly once.
#[derive(Debug, Clone)]
pub struct JoinReceipt {
    /// The new participant.
    pub participant: Participant,
    /// Secret authorizing future mutations.
    pub player_key: PlayerKey,
    /// The event joined.
    pub event_id: EventId,
}

/// Event state plus readiness counts.
#[derive(Debug, Clone)]
pub struct EventStatus {
    /// The event.
    pub event: Event,
    /// Readiness across current participants.
    pub readiness: Readiness,
}

/// Changes a participant may make to their own record.
#[derive(Debug, Clone, Default)]
pub struct ParticipantUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// Readiness for the reveal.
    pub is_ready: Option<bool>,
}

/// Orchestration layer for all exchange operations.
///
/// Stateless coordinator over an [`ExchangeStore`]. Every mutation follows
/// the pattern: authenticate caller → load row → check ownership → apply
/// domain transition → write back → log.
#[derive(Debug, Clone)]
pub struct ExchangeService {
    store: Arc<dyn ExchangeStore>,
    gate: PasscodeGate,
}

impl ExchangeService {
    /// Creates a new `ExchangeService`.
    #[must_use]
    pub fn new(store: Arc<dyn ExchangeStore>, gate: PasscodeGate) -> Self {
        Self { store, gate }
    }

    /// Returns a reference to the inner store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ExchangeStore> {
        &self.store
    }

    async fn authenticate(&self, creds: &Credentials) -> Result<Participant, ExchangeError> {
        let Some(StoredParticipant {
            participant,
            key_hash,
        }) = self.store.find_participant(creds.participant_id).await?
        else {
            tracing::warn!(participant_id = %creds.participant_id, "unknown participant");
            return Err(ExchangeError::InvalidCredentials);
        };
        if !creds.player_key.verify(&key_hash) {
            tracing::warn!(participant_id = %creds.participant_id, "player key mismatch");
            return Err(ExchangeError::InvalidCredentials);
        }
        Ok(participant)
    }

    /// Joins the event: checks the passcode, mints a participant and a key.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::WrongPasscode`], [`ExchangeError::InvalidName`],
    /// or [`ExchangeError::NameTaken`] if someone already joined under the
    /// same normalized name.
    pub async fn join(
        &self,
        passcode: &str,
        display_name: &str,
    ) -> Result<JoinReceipt, ExchangeError> {
        if !self.gate.verify(passcode) {
            tracing::warn!("join rejected: wrong passcode");
            return Err(ExchangeError::WrongPasscode);
        }
        let name = DisplayName::parse(display_name)?;
        let participant = Participant::new(name);
        let player_key = PlayerKey::mint();
        let key_hash = player_key.hash()?;

        self.store
            .insert_participant(StoredParticipant {
                participant: participant.clone(),
                key_hash,
            })
            .await?;
        let event = self.store.event().await?;

        tracing::info!(
            participant_id = %participant.id,
            display_name = %participant.display_name,
            "participant joined"
        );
        Ok(JoinReceipt {
            participant,
            player_key,
            event_id: event.id,
        })
    }

    /// Lists participants in join order.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_participants(&self) -> Result<Vec<Participant>, ExchangeError> {
        self.store.list_participants().await
    }

    /// Renames the caller or sets their readiness.
    ///
    /// # Errors
    ///
    /// Returns an auth error for bad credentials, [`ExchangeError::InvalidName`]
    /// or [`ExchangeError::NameTaken`] for a bad rename.
    pub async fn update_me(
        &self,
        creds: &Credentials,
        update: ParticipantUpdate,
    ) -> Result<Participant, ExchangeError> {
        let mut me = self.authenticate(creds).await?;
        if let Some(name) = update.display_name {
            me.display_name = DisplayName::parse(&name)?;
        }
        if let Some(is_ready) = update.is_ready {
            me.is_ready = is_ready;
        }
        self.store.update_participant(&me).await?;
        tracing::info!(
            participant_id = %me.id,
            display_name = %me.display_name,
            is_ready = me.is_ready,
            "participant updated"
        );
        Ok(me)
    }

    /// Removes a participant. Only the participant themself may do this.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Forbidden`] when removing someone else.
    pub async fn remove_participant(
        &self,
        creds: &Credentials,
        target: ParticipantId,
    ) -> Result<(), ExchangeError> {
        let me = self.authenticate(creds).await?;
        if me.id != target {
            tracing::warn!(caller = %me.id, %target, "attempt to remove another participant");
            return Err(ExchangeError::Forbidden(
                "participants can only remove themselves".to_string(),
            ));
        }
        self.store.remove_participant(target).await?;
        tracing::info!(participant_id = %target, "participant left");
        Ok(())
    }

    /// Lists gifts in creation order, redacted for the caller.
    ///
    /// Without credentials the caller is an anonymous viewer.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::InvalidCredentials`] if credentials are
    /// present but wrong.
    pub async fn list_gifts(
        &self,
        viewer: Option<&Credentials>,
    ) -> Result<Vec<GiftView>, ExchangeError> {
        let viewer_id = match viewer {
            Some(creds) => Some(self.authenticate(creds).await?.id),
            None => None,
        };
        let viewer_ref = PartyRef::new(viewer_id, None);
        let revealed = self.store.event().await?.is_revealed;
        let gifts = self.store.list_gifts().await?;
        Ok(gifts
            .iter()
            .map(|g| GiftView::redact(g, &viewer_ref, revealed))
            .collect())
    }

    /// Records a gift from the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::EventRevealed`] after the reveal,
    /// [`ExchangeError::SelfGift`] or [`ExchangeError::UnknownRecipient`]
    /// for a bad recipient.
    pub async fn add_gift(
        &self,
        creds: &Credentials,
        new: NewGift,
    ) -> Result<GiftView, ExchangeError> {
        let me = self.authenticate(creds).await?;
        let event = self.store.event().await?;
        if event.is_revealed {
            return Err(ExchangeError::EventRevealed);
        }
        let gift = Gift::create(me.id, new)?;
        self.store.insert_gift(gift.clone()).await?;
        tracing::info!(
            gift_id = %gift.id,
            from = %gift.from_participant_id,
            to = %gift.to_participant_id,
            "gift added"
        );
        Ok(GiftView::redact(&gift, &PartyRef::by_id(me.id), event.is_revealed))
    }

    async fn load_own_gift(
        &self,
        me: &Participant,
        gift_id: GiftId,
    ) -> Result<Gift, ExchangeError> {
        let gift = self.store.get_gift(gift_id).await?;
        if gift.from_participant_id != me.id {
            tracing::warn!(caller = %me.id, %gift_id, "attempt to modify another sender's gift");
            return Err(ExchangeError::Forbidden(
                "only the sender may change this gift".to_string(),
            ));
        }
        Ok(gift)
    }

    async fn owner_view(&self, gift: &Gift) -> Result<GiftView, ExchangeError> {
        let revealed = self.store.event().await?.is_revealed;
        Ok(GiftView::redact(
            gift,
            &PartyRef::by_id(gift.from_participant_id),
            revealed,
        ))
    }

    /// Applies a sender's edit.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Forbidden`] unless the caller sent the gift,
    /// or [`ExchangeError::InvalidRequest`] if the patch is empty or invalid.
    pub async fn update_gift(
        &self,
        creds: &Credentials,
        gift_id: GiftId,
        patch: GiftPatch,
    ) -> Result<GiftView, ExchangeError> {
        let me = self.authenticate(creds).await?;
        let mut gift = self.load_own_gift(&me, gift_id).await?;
        gift.apply(patch)?;
        self.store.update_gift(&gift).await?;
        tracing::info!(%gift_id, status = gift.status.as_str(), is_unlocked = gift.is_unlocked, "gift updated");
        self.owner_view(&gift).await
    }

    /// Flips the gift's lock.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Forbidden`] unless the caller sent the gift.
    pub async fn toggle_lock(
        &self,
        creds: &Credentials,
        gift_id: GiftId,
    ) -> Result<GiftView, ExchangeError> {
        let me = self.authenticate(creds).await?;
        let mut gift = self.load_own_gift(&me, gift_id).await?;
        let state = gift.toggle_lock();
        self.store.update_gift(&gift).await?;
        tracing::info!(%gift_id, lock_state = ?state, "gift lock toggled");
        self.owner_view(&gift).await
    }

    /// Deletes a gift.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Forbidden`] unless the caller sent the gift.
    pub async fn delete_gift(
        &self,
        creds: &Credentials,
        gift_id: GiftId,
    ) -> Result<(), ExchangeError> {
        let me = self.authenticate(creds).await?;
        let _gift = self.load_own_gift(&me, gift_id).await?;
        self.store.delete_gift(gift_id).await?;
        tracing::info!(%gift_id, "gift deleted");
        Ok(())
    }

    /// Returns the event with readiness counts.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn event_status(&self) -> Result<EventStatus, ExchangeError> {
        let event = self.store.event().await?;
        let participants = self.store.list_participants().await?;
        Ok(EventStatus {
            event,
            readiness: Readiness::of(&participants),
        })
    }

    /// Requests the group reveal. Granted only when every participant is
    /// ready; otherwise returns [`RevealOutcome::NotYet`].
    ///
    /// # Errors
    ///
    /// Returns an auth error for bad credentials, or a store failure.
    pub async fn request_reveal(
        &self,
        creds: &Credentials,
    ) -> Result<RevealOutcome, ExchangeError> {
        let me = self.authenticate(creds).await?;
        let outcome = self.store.reveal_if_all_ready().await?;
        match outcome {
            RevealOutcome::Revealed => {
                tracing::info!(requested_by = %me.id, "event revealed");
            }
            RevealOutcome::NotYet { ready, total } => {
                tracing::info!(requested_by = %me.id, ready, total, "reveal requested, not everyone ready");
            }
            RevealOutcome::AlreadyRevealed => {}
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DeliveryStatus;
    use crate::store::MemoryStore;

    const PASSCODE: &str = "jingle-bells";

    fn make_service() -> ExchangeService {
        let Ok(gate) = PasscodeGate::new(PASSCODE) else {
            panic!("gate creation failed");
        };
        ExchangeService::new(Arc::new(MemoryStore::new("Test Event")), gate)
    }

    async fn join(service: &ExchangeService, name: &str) -> Credentials {
        let Ok(receipt) = service.join(PASSCODE, name).await else {
            panic!("join failed for {name}");
        };
        Credentials {
            participant_id: receipt.participant.id,
            player_key: receipt.player_key,
        }
    }

    fn new_gift(to: ParticipantId) -> NewGift {
        NewGift {
            to,
            status: DeliveryStatus::Pending,
            images: vec![crate::domain::GiftImage::from_url("https://img.example/x.png")],
            message: Some("enjoy".to_string()),
            is_unlocked: false,
        }
    }

    #[tokio::test]
    async fn join_rejects_wrong_passcode_and_duplicate_names() {
        let service = make_service();
        assert!(matches!(
            service.join("wrong", "Alice").await,
            Err(ExchangeError::WrongPasscode)
        ));
        let _ = join(&service, "Alice").await;
        assert!(matches!(
            service.join(PASSCODE, "ALICE").await,
            Err(ExchangeError::NameTaken(_))
        ));
    }

    #[tokio::test]
    async fn stale_key_is_rejected() {
        let service = make_service();
        let alice = join(&service, "Alice").await;
        let forged = Credentials {
            participant_id: alice.participant_id,
            player_key: PlayerKey::mint(),
        };
        let result = service.list_gifts(Some(&forged)).await;
        assert!(matches!(result, Err(ExchangeError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unlock_shows_contents_but_not_sender() {
        let service = make_service();
        let a = join(&service, "Alice").await;
        let b = join(&service, "Bob").await;

        let Ok(view) = service.add_gift(&a, new_gift(b.participant_id)).await else {
            panic!("add gift failed");
        };

        let Ok(before) = service.list_gifts(Some(&b)).await else {
            panic!("list failed");
        };
        let Some(first) = before.first() else {
            panic!("gift missing");
        };
        assert!(first.sender_id.is_none());
        assert!(first.images.is_none());

        assert!(service.toggle_lock(&a, view.id).await.is_ok());

        let Ok(after) = service.list_gifts(Some(&b)).await else {
            panic!("list failed");
        };
        let Some(first) = after.first() else {
            panic!("gift missing");
        };
        assert!(first.images.is_some());
        assert_eq!(first.message.as_deref(), Some("enjoy"));
        assert!(first.sender_id.is_none());
    }

    #[tokio::test]
    async fn non_sender_cannot_delete_or_toggle() {
        let service = make_service();
        let a = join(&service, "Alice").await;
        let b = join(&service, "Bob").await;
        let Ok(view) = service.add_gift(&a, new_gift(b.participant_id)).await else {
            panic!("add gift failed");
        };

        assert!(matches!(
            service.delete_gift(&b, view.id).await,
            Err(ExchangeError::Forbidden(_))
        ));
        assert!(matches!(
            service.toggle_lock(&b, view.id).await,
            Err(ExchangeError::Forbidden(_))
        ));
        let Ok(gifts) = service.list_gifts(None).await else {
            panic!("list failed");
        };
        assert_eq!(gifts.len(), 1);
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let service = make_service();
        let a = join(&service, "Alice").await;
        let b = join(&service, "Bob").await;
        let Ok(view) = service.add_gift(&a, new_gift(b.participant_id)).await else {
            panic!("add gift failed");
        };
        assert!(matches!(
            service.update_gift(&a, view.id, GiftPatch::default()).await,
            Err(ExchangeError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn reveal_waits_for_everyone() {
        let service = make_service();
        let a = join(&service, "Alice").await;
        let b = join(&service, "Bob").await;
        let c = join(&service, "Carol").await;
        let ready = ParticipantUpdate {
            is_ready: Some(true),
            ..ParticipantUpdate::default()
        };
        let _ = service.update_me(&a, ready.clone()).await;
        let _ = service.update_me(&b, ready.clone()).await;

        let Ok(outcome) = service.request_reveal(&a).await else {
            panic!("reveal request failed");
        };
        assert_eq!(outcome, RevealOutcome::NotYet { ready: 2, total: 3 });
        assert!(service.event_status().await.is_ok_and(|s| !s.event.is_revealed));

        let _ = service.update_me(&c, ready).await;
        let Ok(outcome) = service.request_reveal(&c).await else {
            panic!("reveal request failed");
        };
        assert_eq!(outcome, RevealOutcome::Revealed);
        assert!(service.event_status().await.is_ok_and(|s| s.event.is_revealed));
    }

    #[tokio::test]
    async fn gifts_cannot_be_added_after_reveal() {
        let service = make_service();
        let a = join(&service, "Alice").await;
        let b = join(&service, "Bob").await;
        for creds in [&a, &b] {
            let _ = service
                .update_me(
                    creds,
                    ParticipantUpdate {
                        is_ready: Some(true),
                        ..ParticipantUpdate::default()
                    },
                )
                .await;
        }
        let _ = service.request_reveal(&a).await;
        let result = service.add_gift(&a, new_gift(b.participant_id)).await;
        assert!(matches!(result, Err(ExchangeError::EventRevealed)));
    }

    #[tokio::test]
    async fn participants_only_remove_themselves() {
        let service = make_service();
        let a = join(&service, "Alice").await;
        let b = join(&service, "Bob").await;
        assert!(matches!(
            service.remove_participant(&a, b.participant_id).await,
            Err(ExchangeError::Forbidden(_))
        ));
        assert!(service.remove_participant(&b, b.participant_id).await.is_ok());
        assert!(service.list_participants().await.is_ok_and(|l| l.len() == 1));
    }
}

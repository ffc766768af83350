//! Session controller: local view state, mutations and user notices.
//!
//! A [`Session`] holds what one front end shows: the roster, the gifts as
//! redacted for the current identity, and the reveal flag. Each user
//! action returns a [`Notice`]. Local state changes only after the backend
//! confirms; a failed action leaves it untouched.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::backend::{ExchangeBackend, Identity};
use crate::client::card::{GiftCard, gallery};
use crate::client::identity::IdentityStore;
use crate::client::names::NameCache;
use crate::client::poll::{PollHandle, RefreshSchedule};
use crate::client::ClientError;
use crate::domain::gift::{MAX_IMAGES, normalize_message};
use crate::domain::{
    DeliveryStatus, DisplayName, GiftId, GiftImage, GiftPatch, GiftView, NewGift, Participant,
    ParticipantId, Readiness, RevealOutcome,
};

const SESSION_EXPIRED: &str = "Session expired. Please re-join the event.";
const REVEAL_MESSAGE: &str = "🎉 The big reveal! Everyone can now see who their Secret Santa was!";

/// Outcome of a user action, ready to show as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The action went through.
    Success(String),
    /// Reveal refused because not everyone is ready. Not a failure.
    NotYet(String),
    /// Input rejected locally; nothing was sent.
    Invalid(String),
    /// The backend rejected the action or could not be reached.
    Failure(String),
}

impl Notice {
    /// Text to display.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::NotYet(m) | Self::Invalid(m) | Self::Failure(m) => m,
        }
    }

    /// True for [`Notice::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Contents of the "add gift" form.
#[derive(Debug, Clone, Default)]
pub struct GiftDraft {
    /// Chosen recipient.
    pub recipient: Option<ParticipantId>,
    /// Delivery status.
    pub status: DeliveryStatus,
    /// Attached images.
    pub images: Vec<GiftImage>,
    /// Note to the recipient.
    pub message: String,
}

/// One front end's view of the exchange.
#[derive(Debug)]
pub struct Session {
    backend: Arc<dyn ExchangeBackend>,
    identities: IdentityStore,
    identity: Option<Identity>,
    event_name: String,
    participants: Vec<Participant>,
    gifts: Vec<GiftView>,
    names: NameCache,
    readiness: Readiness,
    revealed: bool,
}

impl Session {
    /// Creates an empty session. Call [`Session::restore`] or
    /// [`Session::join`], then [`Session::refresh`].
    #[must_use]
    pub fn new(backend: Arc<dyn ExchangeBackend>, identities: IdentityStore) -> Self {
        Self {
            backend,
            identities,
            identity: None,
            event_name: String::new(),
            participants: Vec::new(),
            gifts: Vec::new(),
            names: NameCache::default(),
            readiness: Readiness { ready: 0, total: 0 },
            revealed: false,
        }
    }

    /// The current identity, if joined.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Event title from the last refresh.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Roster from the last refresh, in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Gifts as redacted for the current identity, in creation order.
    #[must_use]
    pub fn gifts(&self) -> &[GiftView] {
        &self.gifts
    }

    /// Name lookup for labels.
    #[must_use]
    pub fn names(&self) -> &NameCache {
        &self.names
    }

    /// Readiness counts from the last refresh.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Reveal flag. Once true it stays true for the life of the session.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// The current participant's roster entry.
    #[must_use]
    pub fn me(&self) -> Option<&Participant> {
        let id = self.identity.as_ref()?.participant_id;
        self.participants.iter().find(|p| p.id == id)
    }

    /// Cards for the gallery, own gifts first.
    #[must_use]
    pub fn cards(&self) -> Vec<GiftCard> {
        gallery(&self.gifts, &self.names)
    }

    /// Loads a saved identity. Returns whether one was found.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the identity file is unreadable.
    pub async fn restore(&mut self) -> Result<bool, ClientError> {
        self.identity = self.identities.load().await?;
        Ok(self.identity.is_some())
    }

    /// Re-fetches roster, gifts and event state. All three reads must
    /// succeed before anything local changes.
    ///
    /// # Errors
    ///
    /// Returns the first backend failure; local state is unchanged.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let participants = self.backend.participants().await?;
        let gifts = self.backend.gifts(self.identity.as_ref()).await?;
        let event = self.backend.event().await?;

        if self.revealed && !event.is_revealed {
            tracing::warn!("stale read: event reported as not revealed; keeping revealed");
        }
        self.revealed |= event.is_revealed;
        self.event_name = event.name;
        self.readiness = event.readiness;
        self.names.rebuild(&participants);
        self.participants = participants;
        self.gifts = gifts;
        Ok(())
    }

    /// Joins the event and saves the identity.
    pub async fn join(&mut self, passcode: &str, display_name: &str) -> Notice {
        if let Err(e) = DisplayName::parse(display_name) {
            return Notice::Invalid(e.to_string());
        }
        if passcode.trim().is_empty() {
            return Notice::Invalid("Enter the event passcode.".to_string());
        }
        let identity = match self.backend.join(passcode.trim(), display_name).await {
            Ok(identity) => identity,
            Err(e) => return failure("join the event", &e),
        };
        if let Err(e) = self.identities.save(&identity).await {
            tracing::error!(error = %e, "could not save identity; it will be lost on restart");
        }
        tracing::info!(participant_id = %identity.participant_id, "joined event");
        let name = identity.display_name.clone();
        self.identity = Some(identity);
        self.gifts.clear();
        self.refresh_after_mutation().await;
        Notice::Success(format!("Welcome, {name}! 🎄"))
    }

    /// Sends a new gift from the current participant.
    pub async fn add_gift(&mut self, draft: GiftDraft) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Invalid("Join the event first.".to_string());
        };
        if self.revealed {
            return Notice::Invalid("The event has been revealed; no more gifts.".to_string());
        }
        let Some(recipient) = draft.recipient else {
            return Notice::Invalid("Choose who the gift is for.".to_string());
        };
        if recipient == me.participant_id {
            return Notice::Invalid("You can't give a gift to yourself.".to_string());
        }
        let Some(to_name) = self.names.get(recipient).map(str::to_string) else {
            return Notice::Invalid("That participant is no longer in the event.".to_string());
        };
        if draft.images.len() > MAX_IMAGES {
            return Notice::Invalid(format!("Attach at most {MAX_IMAGES} images."));
        }
        let message = match normalize_message(Some(draft.message)) {
            Ok(m) => m,
            Err(e) => return Notice::Invalid(e.to_string()),
        };

        let new_gift = NewGift {
            to: recipient,
            status: draft.status,
            images: draft.images,
            message,
            is_unlocked: false,
        };
        match self.backend.add_gift(&me, new_gift).await {
            Ok(view) => {
                tracing::info!(gift_id = %view.id, "gift added");
                self.gifts.push(view);
                Notice::Success(format!("Gift for {to_name} wrapped and ready! 🎁"))
            }
            Err(e) => failure("add gift", &e),
        }
    }

    /// Locks or unlocks a gift the current participant sent.
    pub async fn toggle_lock(&mut self, id: GiftId) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        match self.backend.toggle_lock(&me, id).await {
            Ok(view) => {
                let to = self.recipient_label(&view);
                let notice = if view.is_unlocked {
                    Notice::Success(format!("Gift revealed to {to}! 🎄"))
                } else {
                    Notice::Success(format!("Gift hidden from {to}"))
                };
                tracing::info!(gift_id = %id, is_unlocked = view.is_unlocked, "gift lock toggled");
                self.replace_gift(view);
                notice
            }
            Err(e) => failure("update gift", &e),
        }
    }

    /// Changes the delivery status of a gift the current participant sent.
    pub async fn set_status(&mut self, id: GiftId, status: DeliveryStatus) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        let patch = GiftPatch {
            status: Some(status),
            ..GiftPatch::default()
        };
        match self.backend.update_gift(&me, id, patch).await {
            Ok(view) => {
                self.replace_gift(view);
                Notice::Success(format!("Marked as {}", status.label()))
            }
            Err(e) => failure("update gift", &e),
        }
    }

    /// Deletes a gift the current participant sent.
    pub async fn delete_gift(&mut self, id: GiftId) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        match self.backend.delete_gift(&me, id).await {
            Ok(()) => {
                tracing::info!(gift_id = %id, "gift deleted");
                self.gifts.retain(|g| g.id != id);
                Notice::Success("Gift removed".to_string())
            }
            Err(e) => failure("remove gift", &e),
        }
    }

    /// Marks the current participant ready (or not) for the reveal.
    pub async fn set_ready(&mut self, ready: bool) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        match self.backend.update_me(&me, None, Some(ready)).await {
            Ok(updated) => {
                self.replace_participant(updated);
                if ready {
                    Notice::Success("You're ready for the reveal! ✅".to_string())
                } else {
                    Notice::Success("You're no longer marked ready".to_string())
                }
            }
            Err(e) => failure("update readiness", &e),
        }
    }

    /// Renames the current participant.
    pub async fn rename(&mut self, display_name: &str) -> Notice {
        let Some(mut me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        if let Err(e) = DisplayName::parse(display_name) {
            return Notice::Invalid(e.to_string());
        }
        match self
            .backend
            .update_me(&me, Some(display_name.to_string()), None)
            .await
        {
            Ok(updated) => {
                me.display_name = updated.display_name.to_string();
                if let Err(e) = self.identities.save(&me).await {
                    tracing::error!(error = %e, "could not save renamed identity");
                }
                let notice = Notice::Success(format!("You are now {}", me.display_name));
                self.identity = Some(me);
                self.replace_participant(updated);
                notice
            }
            Err(e) => failure("save display name", &e),
        }
    }

    /// Asks for the group reveal.
    pub async fn end_event(&mut self) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        match self.backend.request_reveal(&me).await {
            Ok(RevealOutcome::Revealed) => {
                tracing::info!("event revealed");
                self.revealed = true;
                self.refresh_after_mutation().await;
                Notice::Success(REVEAL_MESSAGE.to_string())
            }
            Ok(RevealOutcome::AlreadyRevealed) => {
                self.revealed = true;
                self.refresh_after_mutation().await;
                Notice::Success("The event has already been revealed.".to_string())
            }
            Ok(RevealOutcome::NotYet { ready, total }) => {
                self.readiness = Readiness { ready, total };
                Notice::NotYet(format!(
                    "Not everyone is ready yet ({ready}/{total}). Ask everyone to mark ready first."
                ))
            }
            Err(e) => failure("end event", &e),
        }
    }

    /// Leaves the event. Removes the participant and their gifts on the
    /// backend and forgets the saved identity.
    pub async fn leave(&mut self) -> Notice {
        let Some(me) = self.identity.clone() else {
            return Notice::Failure(SESSION_EXPIRED.to_string());
        };
        match self.backend.leave(&me).await {
            Ok(()) => {
                tracing::info!(participant_id = %me.participant_id, "left event");
                self.forget_identity().await;
                self.refresh_after_mutation().await;
                Notice::Success(format!("{} left the party", me.display_name))
            }
            Err(e) => failure("remove participant", &e),
        }
    }

    /// Forgets the identity locally. The participant stays in the event.
    pub async fn sign_out(&mut self) -> Notice {
        self.forget_identity().await;
        Notice::Success("Signed out".to_string())
    }

    async fn forget_identity(&mut self) {
        if let Err(e) = self.identities.clear().await {
            tracing::error!(error = %e, "could not remove saved identity");
        }
        self.identity = None;
        self.gifts.clear();
    }

    async fn refresh_after_mutation(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "refresh after action failed; waiting for next poll");
        }
    }

    fn replace_gift(&mut self, view: GiftView) {
        match self.gifts.iter_mut().find(|g| g.id == view.id) {
            Some(slot) => *slot = view,
            None => self.gifts.push(view),
        }
    }

    fn replace_participant(&mut self, updated: Participant) {
        if let Some(slot) = self.participants.iter_mut().find(|p| p.id == updated.id) {
            *slot = updated;
        }
        self.names.rebuild(&self.participants);
        self.readiness = Readiness::of(&self.participants);
    }

    fn recipient_label(&self, view: &GiftView) -> String {
        match (&view.recipient_name, view.recipient_id) {
            (Some(name), _) => name.clone(),
            (None, Some(id)) => self.names.name_of(id).to_string(),
            (None, None) => crate::client::names::UNKNOWN_NAME.to_string(),
        }
    }

    /// Starts background refreshes of `session` on `schedule`.
    pub fn spawn_polling(session: Arc<Mutex<Self>>, schedule: RefreshSchedule) -> PollHandle {
        schedule.spawn(move || {
            let session = Arc::clone(&session);
            async move {
                if let Err(e) = session.lock().await.refresh().await {
                    tracing::warn!(error = %e, "background refresh failed");
                }
            }
        })
    }
}

fn failure(action: &str, err: &ClientError) -> Notice {
    match err {
        ClientError::Unauthorized(_) => {
            tracing::warn!(action, error = %err, "identity rejected");
            Notice::Failure(SESSION_EXPIRED.to_string())
        }
        ClientError::Forbidden(_) => {
            tracing::warn!(action, error = %err, "action not permitted");
            Notice::Failure("You can only change your own gifts and profile.".to_string())
        }
        ClientError::Validation(m) | ClientError::NotFound(m) | ClientError::Conflict(m) => {
            tracing::warn!(action, error = %err, "action rejected");
            Notice::Failure(m.clone())
        }
        ClientError::Transport(_) | ClientError::Server(_) | ClientError::Storage(_) => {
            tracing::error!(action, error = %err, "action failed");
            Notice::Failure(format!("Failed to {action}"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::client::backend::EventState;
    use crate::client::{OfflineBackend, StorageConfig};

    /// Offline backend whose mutations can be made to fail.
    #[derive(Debug)]
    struct Unreliable {
        inner: OfflineBackend,
        down: std::sync::atomic::AtomicBool,
    }

    impl Unreliable {
        fn check(&self) -> Result<(), ClientError> {
            if self.down.load(std::sync::atomic::Ordering::SeqCst) {
                Err(ClientError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ExchangeBackend for Unreliable {
        async fn join(&self, passcode: &str, name: &str) -> Result<Identity, ClientError> {
            self.check()?;
            self.inner.join(passcode, name).await
        }
        async fn participants(&self) -> Result<Vec<Participant>, ClientError> {
            self.inner.participants().await
        }
        async fn gifts(&self, me: Option<&Identity>) -> Result<Vec<GiftView>, ClientError> {
            self.inner.gifts(me).await
        }
        async fn event(&self) -> Result<EventState, ClientError> {
            self.inner.event().await
        }
        async fn add_gift(&self, me: &Identity, gift: NewGift) -> Result<GiftView, ClientError> {
            self.check()?;
            self.inner.add_gift(me, gift).await
        }
        async fn update_gift(
            &self,
            me: &Identity,
            id: GiftId,
            patch: GiftPatch,
        ) -> Result<GiftView, ClientError> {
            self.check()?;
            self.inner.update_gift(me, id, patch).await
        }
        async fn toggle_lock(&self, me: &Identity, id: GiftId) -> Result<GiftView, ClientError> {
            self.check()?;
            self.inner.toggle_lock(me, id).await
        }
        async fn delete_gift(&self, me: &Identity, id: GiftId) -> Result<(), ClientError> {
            self.check()?;
            self.inner.delete_gift(me, id).await
        }
        async fn update_me(
            &self,
            me: &Identity,
            display_name: Option<String>,
            is_ready: Option<bool>,
        ) -> Result<Participant, ClientError> {
            self.check()?;
            self.inner.update_me(me, display_name, is_ready).await
        }
        async fn request_reveal(&self, me: &Identity) -> Result<RevealOutcome, ClientError> {
            self.check()?;
            self.inner.request_reveal(me).await
        }
        async fn leave(&self, me: &Identity) -> Result<(), ClientError> {
            self.check()?;
            self.inner.leave(me).await
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        backend: Arc<Unreliable>,
        config: StorageConfig,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let config = StorageConfig::in_dir(dir.path());
        let Ok(inner) = OfflineBackend::open(&config).await else {
            panic!("open failed");
        };
        Fixture {
            _dir: dir,
            backend: Arc::new(Unreliable {
                inner,
                down: std::sync::atomic::AtomicBool::new(false),
            }),
            config,
        }
    }

    async fn session_as(fx: &Fixture, name: &str) -> Session {
        let backend: Arc<dyn ExchangeBackend> = Arc::clone(&fx.backend) as Arc<dyn ExchangeBackend>;
        let dir = fx.config.identity_path.with_file_name(format!("{name}.json"));
        let store = IdentityStore::new(&StorageConfig {
            identity_path: dir,
            offline_data_path: fx.config.offline_data_path.clone(),
        });
        let mut session = Session::new(backend, store);
        let notice = session.join("demo", name).await;
        assert!(notice.is_success(), "join failed: {notice:?}");
        session
    }

    fn draft_for(id: ParticipantId) -> GiftDraft {
        GiftDraft {
            recipient: Some(id),
            images: vec![GiftImage::from_url("data:image/png;base64,AAAA")],
            message: "Merry Christmas".to_string(),
            ..GiftDraft::default()
        }
    }

    fn id_of(session: &Session) -> ParticipantId {
        let Some(me) = session.identity() else {
            panic!("not joined");
        };
        me.participant_id
    }

    #[tokio::test]
    async fn missing_recipient_is_caught_before_sending() {
        let fx = fixture().await;
        let mut alice = session_as(&fx, "Alice").await;
        let notice = alice.add_gift(GiftDraft::default()).await;
        assert!(matches!(notice, Notice::Invalid(_)));
        assert!(fx.backend.gifts(None).await.is_ok_and(|g| g.is_empty()));
    }

    #[tokio::test]
    async fn failed_toggle_leaves_local_state_alone() {
        let fx = fixture().await;
        let bob = session_as(&fx, "Bob").await;
        let mut alice = session_as(&fx, "Alice").await;
        assert!(alice.refresh().await.is_ok());
        assert!(alice.add_gift(draft_for(id_of(&bob))).await.is_success());
        let Some(gift_id) = alice.gifts().first().map(|g| g.id) else {
            panic!("gift missing");
        };

        fx.backend.down.store(true, std::sync::atomic::Ordering::SeqCst);
        let notice = alice.toggle_lock(gift_id).await;
        assert_eq!(notice, Notice::Failure("Failed to update gift".to_string()));
        assert!(alice.gifts().first().is_some_and(|g| !g.is_unlocked));

        fx.backend.down.store(false, std::sync::atomic::Ordering::SeqCst);
        assert!(alice.toggle_lock(gift_id).await.is_success());
        assert!(alice.gifts().first().is_some_and(|g| g.is_unlocked));
        assert!(alice.toggle_lock(gift_id).await.is_success());
        assert!(alice.gifts().first().is_some_and(|g| !g.is_unlocked));
    }

    #[tokio::test]
    async fn deleting_someone_elses_gift_is_rejected() {
        let fx = fixture().await;
        let mut bob = session_as(&fx, "Bob").await;
        let mut alice = session_as(&fx, "Alice").await;
        assert!(alice.refresh().await.is_ok());
        assert!(alice.add_gift(draft_for(id_of(&bob))).await.is_success());

        assert!(bob.refresh().await.is_ok());
        let Some(gift_id) = bob.gifts().first().map(|g| g.id) else {
            panic!("gift missing");
        };
        let notice = bob.delete_gift(gift_id).await;
        assert!(matches!(notice, Notice::Failure(_)));
        assert_eq!(bob.gifts().len(), 1);
        assert!(fx.backend.gifts(None).await.is_ok_and(|g| g.len() == 1));
    }

    #[tokio::test]
    async fn reveal_flag_never_goes_back() {
        let fx = fixture().await;
        let mut alice = session_as(&fx, "Alice").await;
        assert!(alice.end_event().await.is_success());
        assert!(alice.is_revealed());

        let notice = alice.end_event().await;
        assert!(notice.is_success());
        assert!(alice.refresh().await.is_ok());
        assert!(alice.is_revealed());
    }

    #[tokio::test]
    async fn leave_forgets_identity() {
        let fx = fixture().await;
        let mut alice = session_as(&fx, "Alice").await;
        assert!(alice.leave().await.is_success());
        assert!(alice.identity().is_none());
        assert!(alice.participants().is_empty());

        let store = IdentityStore::new(&StorageConfig {
            identity_path: fx.config.identity_path.with_file_name("Alice.json"),
            offline_data_path: fx.config.offline_data_path.clone(),
        });
        assert!(matches!(store.load().await, Ok(None)));
    }

    #[tokio::test]
    async fn polling_picks_up_other_clients_changes() {
        let fx = fixture().await;
        let mut bob = session_as(&fx, "Bob").await;
        let alice = session_as(&fx, "Alice").await;
        let alice_id = id_of(&alice);
        assert!(bob.refresh().await.is_ok());
        assert!(bob.add_gift(draft_for(alice_id)).await.is_success());
        assert!(alice.gifts().is_empty());

        let alice = Arc::new(Mutex::new(alice));
        let handle = Session::spawn_polling(
            Arc::clone(&alice),
            RefreshSchedule::every(Duration::from_secs(3)),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        let alice = alice.lock().await;
        assert_eq!(alice.gifts().len(), 1);
        assert!(alice.gifts().first().is_some_and(|g| g.access.is_recipient));
        handle.cancel();
    }
}

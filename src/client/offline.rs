//! Offline/demo backend: the whole exchange in one local JSON file.
//!
//! Gifts are addressed by display name, so the visibility policy runs on
//! name matching here. Every mutation is written to disk first and only
//! becomes visible once the write succeeds. The reveal does not wait for readiness: a demo has a
//! single operator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::client::backend::{EventState, ExchangeBackend, Identity};
use crate::client::{ClientError, StorageConfig};
use crate::domain::gift::{GiftFields, normalize_message, validate_images};
use crate::domain::participant::names_match;
use crate::domain::{
    DeliveryStatus, DisplayName, Event, GiftAccess, GiftId, GiftImage, GiftPatch, GiftRecord,
    GiftView, NewGift, Participant, PartyRef, PlayerKey, Readiness, RevealOutcome,
};
use crate::error::ExchangeError;

/// A gift addressed by sender and recipient display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalGift {
    /// Gift identifier.
    pub id: GiftId,
    /// Sender's display name.
    pub from_name: String,
    /// Recipient's display name.
    pub to_name: String,
    /// Delivery status.
    pub status: DeliveryStatus,
    /// Attached images.
    pub images: Vec<GiftImage>,
    /// Optional message.
    #[serde(default)]
    pub message: Option<String>,
    /// Lock flag.
    pub is_unlocked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl GiftRecord for LocalGift {
    fn gift_id(&self) -> GiftId {
        self.id
    }

    fn sender(&self) -> PartyRef<'_> {
        PartyRef::by_name(&self.from_name)
    }

    fn recipient(&self) -> PartyRef<'_> {
        PartyRef::by_name(&self.to_name)
    }

    fn is_unlocked(&self) -> bool {
        self.is_unlocked
    }

    fn status(&self) -> DeliveryStatus {
        self.status
    }

    fn images(&self) -> &[GiftImage] {
        &self.images
    }

    fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OfflineData {
    event: Event,
    participants: Vec<Participant>,
    gifts: Vec<LocalGift>,
}

impl Default for OfflineData {
    fn default() -> Self {
        Self {
            event: Event::new("Secret Santa"),
            participants: Vec::new(),
            gifts: Vec::new(),
        }
    }
}

impl OfflineData {
    fn participant_mut(&mut self, me: &Identity) -> Result<&mut Participant, ClientError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == me.participant_id)
            .ok_or_else(|| ClientError::Unauthorized("unknown local participant".to_string()))
    }

    fn display_name(&self, me: &Identity) -> Result<String, ClientError> {
        self.participants
            .iter()
            .find(|p| p.id == me.participant_id)
            .map(|p| p.display_name.to_string())
            .ok_or_else(|| ClientError::Unauthorized("unknown local participant".to_string()))
    }

    fn name_taken(&self, name: &DisplayName, except: Option<&Identity>) -> bool {
        self.participants.iter().any(|p| {
            except.is_none_or(|me| p.id != me.participant_id)
                && p.display_name.normalized() == name.normalized()
        })
    }

    fn view(&self, gift: &LocalGift, viewer: &PartyRef<'_>) -> GiftView {
        GiftView::redact(gift, viewer, self.event.is_revealed)
    }

    /// Finds a gift `me` sent.
    fn own_gift_mut(&mut self, me_name: &str, id: GiftId) -> Result<&mut LocalGift, ClientError> {
        let revealed = self.event.is_revealed;
        let gift = self
            .gifts
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| ClientError::from(ExchangeError::GiftNotFound(id)))?;
        if !GiftAccess::evaluate(&*gift, &PartyRef::by_name(me_name), revealed).is_owner {
            return Err(ClientError::Forbidden(
                "only the sender may change this gift".to_string(),
            ));
        }
        Ok(gift)
    }
}

/// Backend persisting to [`StorageConfig::offline_data_path`].
#[derive(Debug)]
pub struct OfflineBackend {
    path: PathBuf,
    data: Mutex<OfflineData>,
}

impl OfflineBackend {
    /// Opens the data file, starting empty if it does not exist. A file that
    /// cannot be parsed is moved aside to `<name>.corrupt` before starting
    /// empty, so the next write does not destroy it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the file exists but cannot be
    /// read, or if an unparsable file cannot be moved aside.
    pub async fn open(config: &StorageConfig) -> Result<Self, ClientError> {
        let path = config.offline_data_path.clone();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(data) => data,
                Err(e) => {
                    let aside = corrupt_path(&path);
                    tokio::fs::rename(&path, &aside).await?;
                    tracing::warn!(
                        path = %path.display(),
                        moved_to = %aside.display(),
                        error = %e,
                        "offline data unreadable; starting fresh"
                    );
                    OfflineData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => OfflineData::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    async fn persist(&self, data: &OfflineData) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// Writes `next` to disk, then makes it the live state. On a failed
    /// write the live state is left as it was.
    async fn commit(&self, live: &mut OfflineData, next: OfflineData) -> Result<(), ClientError> {
        self.persist(&next).await?;
        *live = next;
        Ok(())
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    PathBuf::from(aside)
}

#[async_trait]
impl ExchangeBackend for OfflineBackend {
    async fn join(&self, _passcode: &str, display_name: &str) -> Result<Identity, ClientError> {
        let name = DisplayName::parse(display_name)?;
        let mut data = self.data.lock().await;
        if data.name_taken(&name, None) {
            return Err(ExchangeError::NameTaken(name.to_string()).into());
        }
        let participant = Participant::new(name);
        let identity = Identity {
            participant_id: participant.id,
            display_name: participant.display_name.to_string(),
            player_key: PlayerKey::mint().expose().to_string(),
            event_id: Some(data.event.id),
        };
        let mut next = data.clone();
        next.participants.push(participant);
        self.commit(&mut data, next).await?;
        Ok(identity)
    }

    async fn participants(&self) -> Result<Vec<Participant>, ClientError> {
        Ok(self.data.lock().await.participants.clone())
    }

    async fn gifts(&self, me: Option<&Identity>) -> Result<Vec<GiftView>, ClientError> {
        let data = self.data.lock().await;
        let me_name = match me {
            Some(me) => Some(data.display_name(me)?),
            None => None,
        };
        let viewer = PartyRef::new(None, me_name.as_deref());
        let mut gifts: Vec<&LocalGift> = data.gifts.iter().collect();
        gifts.sort_by_key(|g| g.created_at);
        Ok(gifts.into_iter().map(|g| data.view(g, &viewer)).collect())
    }

    async fn event(&self) -> Result<EventState, ClientError> {
        let data = self.data.lock().await;
        Ok(EventState {
            name: data.event.name.clone(),
            is_revealed: data.event.is_revealed,
            readiness: Readiness::of(&data.participants),
        })
    }

    async fn add_gift(&self, me: &Identity, gift: NewGift) -> Result<GiftView, ClientError> {
        let mut data = self.data.lock().await;
        if data.event.is_revealed {
            return Err(ExchangeError::EventRevealed.into());
        }
        let from_name = data.display_name(me)?;
        let to_name = data
            .participants
            .iter()
            .find(|p| p.id == gift.to)
            .map(|p| p.display_name.to_string())
            .ok_or(ExchangeError::UnknownRecipient(gift.to))?;
        if names_match(&from_name, &to_name) {
            return Err(ExchangeError::SelfGift.into());
        }
        validate_images(&gift.images)?;
        let local = LocalGift {
            id: GiftId::new(),
            from_name,
            to_name,
            status: gift.status,
            images: gift.images,
            message: normalize_message(gift.message)?,
            is_unlocked: gift.is_unlocked,
            created_at: Utc::now(),
        };
        let view = data.view(&local, &PartyRef::by_name(&local.from_name));
        let mut next = data.clone();
        next.gifts.push(local);
        self.commit(&mut data, next).await?;
        Ok(view)
    }

    async fn update_gift(
        &self,
        me: &Identity,
        id: GiftId,
        patch: GiftPatch,
    ) -> Result<GiftView, ClientError> {
        let mut data = self.data.lock().await;
        let me_name = data.display_name(me)?;
        let mut next = data.clone();
        let gift = next.own_gift_mut(&me_name, id)?;
        patch.apply_to(GiftFields {
            status: &mut gift.status,
            images: &mut gift.images,
            message: &mut gift.message,
            is_unlocked: &mut gift.is_unlocked,
        })?;
        let updated = gift.clone();
        let view = next.view(&updated, &PartyRef::by_name(&me_name));
        self.commit(&mut data, next).await?;
        Ok(view)
    }

    async fn toggle_lock(&self, me: &Identity, id: GiftId) -> Result<GiftView, ClientError> {
        let mut data = self.data.lock().await;
        let me_name = data.display_name(me)?;
        let mut next = data.clone();
        let gift = next.own_gift_mut(&me_name, id)?;
        gift.is_unlocked = !gift.is_unlocked;
        let updated = gift.clone();
        let view = next.view(&updated, &PartyRef::by_name(&me_name));
        self.commit(&mut data, next).await?;
        Ok(view)
    }

    async fn delete_gift(&self, me: &Identity, id: GiftId) -> Result<(), ClientError> {
        let mut data = self.data.lock().await;
        let me_name = data.display_name(me)?;
        let mut next = data.clone();
        let _ = next.own_gift_mut(&me_name, id)?;
        next.gifts.retain(|g| g.id != id);
        self.commit(&mut data, next).await
    }

    async fn update_me(
        &self,
        me: &Identity,
        display_name: Option<String>,
        is_ready: Option<bool>,
    ) -> Result<Participant, ClientError> {
        let mut data = self.data.lock().await;
        let new_name = display_name
            .map(|raw| DisplayName::parse(&raw))
            .transpose()?;
        let mut next = data.clone();
        if let Some(name) = &new_name {
            if next.name_taken(name, Some(me)) {
                return Err(ExchangeError::NameTaken(name.to_string()).into());
            }
            let old_name = next.display_name(me)?;
            for gift in &mut next.gifts {
                if names_match(&gift.from_name, &old_name) {
                    gift.from_name = name.to_string();
                }
                if names_match(&gift.to_name, &old_name) {
                    gift.to_name = name.to_string();
                }
            }
        }
        let participant = next.participant_mut(me)?;
        if let Some(name) = new_name {
            participant.display_name = name;
        }
        if let Some(is_ready) = is_ready {
            participant.is_ready = is_ready;
        }
        let updated = participant.clone();
        self.commit(&mut data, next).await?;
        Ok(updated)
    }

    async fn request_reveal(&self, me: &Identity) -> Result<RevealOutcome, ClientError> {
        let mut data = self.data.lock().await;
        let _ = data.display_name(me)?;
        if data.event.is_revealed {
            return Ok(RevealOutcome::AlreadyRevealed);
        }
        let mut next = data.clone();
        next.event.is_revealed = true;
        next.event.revealed_at = Some(Utc::now());
        self.commit(&mut data, next).await?;
        Ok(RevealOutcome::Revealed)
    }

    async fn leave(&self, me: &Identity) -> Result<(), ClientError> {
        let mut data = self.data.lock().await;
        let me_name = data.display_name(me)?;
        let mut next = data.clone();
        next.participants.retain(|p| p.id != me.participant_id);
        next.gifts
            .retain(|g| !names_match(&g.from_name, &me_name) && !names_match(&g.to_name, &me_name));
        self.commit(&mut data, next).await
    }
}

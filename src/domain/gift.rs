//! Gift records, delivery status and the per-gift lock state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GiftId, ParticipantId};
use crate::error::ExchangeError;

/// Maximum length of a gift message in characters.
pub const MAX_MESSAGE_CHARS: usize = 1_000;

/// Maximum number of images attached to one gift.
pub const MAX_IMAGES: usize = 12;

/// Delivery-tracking state. Independent of the lock state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Shipped, not yet arrived.
    #[default]
    Pending,
    /// Some parts arrived.
    Partial,
    /// Fully delivered.
    Delivered,
}

impl DeliveryStatus {
    /// Human-readable badge label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "On the way",
            Self::Partial => "Partially delivered",
            Self::Delivered => "Delivered",
        }
    }

    /// Wire string (`"pending"`, `"partial"`, `"delivered"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Delivered => "delivered",
        }
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "delivered" => Ok(Self::Delivered),
            other => Err(ExchangeError::InvalidRequest(format!(
                "unknown delivery status: {other}"
            ))),
        }
    }
}

/// An image attached to a gift (usually a screenshot, often a `data:` URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftImage {
    /// Client-side identifier, stable across edits.
    pub id: uuid::Uuid,
    /// Image location.
    pub url: String,
    /// Optional alt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl GiftImage {
    /// Wraps a bare URL with a fresh id and no caption.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            url: url.into(),
            caption: None,
        }
    }
}

/// Whether the recipient may open a gift before the group reveal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Contents hidden from the recipient. Initial state.
    #[default]
    Locked,
    /// Contents visible to the recipient.
    Unlocked,
}

impl LockState {
    /// Flips the state. The only transition.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Locked => Self::Unlocked,
            Self::Unlocked => Self::Locked,
        }
    }

    /// Returns `true` for [`LockState::Unlocked`].
    #[must_use]
    pub const fn is_unlocked(self) -> bool {
        matches!(self, Self::Unlocked)
    }
}

impl From<bool> for LockState {
    fn from(is_unlocked: bool) -> Self {
        if is_unlocked {
            Self::Unlocked
        } else {
            Self::Locked
        }
    }
}

/// Submission payload for a new gift. The sender is the authenticated
/// caller and is never taken from the payload.
#[derive(Debug, Clone)]
pub struct NewGift {
    /// Recipient.
    pub to: ParticipantId,
    /// Initial delivery status.
    pub status: DeliveryStatus,
    /// Attached images.
    pub images: Vec<GiftImage>,
    /// Optional message to the recipient.
    pub message: Option<String>,
    /// Initial lock state; normally `false`.
    pub is_unlocked: bool,
}

/// Partial update applied by the sender.
#[derive(Debug, Clone, Default)]
pub struct GiftPatch {
    /// New delivery status.
    pub status: Option<DeliveryStatus>,
    /// Replacement image list.
    pub images: Option<Vec<GiftImage>>,
    /// Replacement message; an empty string clears it.
    pub message: Option<String>,
    /// New lock state.
    pub is_unlocked: Option<bool>,
}

impl GiftPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.images.is_none()
            && self.message.is_none()
            && self.is_unlocked.is_none()
    }

    /// Validates the whole patch, then writes each present field into
    /// `target`. Nothing is written if validation fails.
    pub(crate) fn apply_to(self, target: GiftFields<'_>) -> Result<(), ExchangeError> {
        if self.is_empty() {
            return Err(ExchangeError::InvalidRequest(
                "patch must change at least one field".to_string(),
            ));
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        let message = match self.message {
            Some(m) => Some(normalize_message(Some(m))?),
            None => None,
        };

        if let Some(status) = self.status {
            *target.status = status;
        }
        if let Some(images) = self.images {
            *target.images = images;
        }
        if let Some(message) = message {
            *target.message = message;
        }
        if let Some(is_unlocked) = self.is_unlocked {
            *target.is_unlocked = is_unlocked;
        }
        Ok(())
    }
}

/// Mutable views of the sender-editable fields of a gift record.
pub(crate) struct GiftFields<'a> {
    pub(crate) status: &'a mut DeliveryStatus,
    pub(crate) images: &'a mut Vec<GiftImage>,
    pub(crate) message: &'a mut Option<String>,
    pub(crate) is_unlocked: &'a mut bool,
}

/// A gift from one participant to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    /// Gift identifier.
    pub id: GiftId,
    /// Sender; the only participant allowed to mutate the record.
    pub from_participant_id: ParticipantId,
    /// Recipient. Never equal to the sender.
    pub to_participant_id: ParticipantId,
    /// Delivery status.
    pub status: DeliveryStatus,
    /// Attached images.
    pub images: Vec<GiftImage>,
    /// Optional message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the recipient may see the contents.
    pub is_unlocked: bool,
    /// Creation timestamp; gift lists are ordered by it.
    pub created_at: DateTime<Utc>,
}

impl Gift {
    /// Builds a validated gift sent by `from`.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::SelfGift`] if `from` is the recipient, or
    /// [`ExchangeError::InvalidRequest`] if the message or images are
    /// out of bounds.
    pub fn create(from: ParticipantId, new: NewGift) -> Result<Self, ExchangeError> {
        if from == new.to {
            return Err(ExchangeError::SelfGift);
        }
        validate_images(&new.images)?;
        Ok(Self {
            id: GiftId::new(),
            from_participant_id: from,
            to_participant_id: new.to,
            status: new.status,
            images: new.images,
            message: normalize_message(new.message)?,
            is_unlocked: new.is_unlocked,
            created_at: Utc::now(),
        })
    }

    /// Current lock state.
    #[must_use]
    pub fn lock_state(&self) -> LockState {
        LockState::from(self.is_unlocked)
    }

    /// Flips the lock and returns the new state.
    pub fn toggle_lock(&mut self) -> LockState {
        let next = self.lock_state().toggle();
        self.is_unlocked = next.is_unlocked();
        next
    }

    /// Applies a sender's patch. Validates before touching any field.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::InvalidRequest`] if the patch is empty or the
    /// new message or images are out of bounds; the gift is unchanged in
    /// that case.
    pub fn apply(&mut self, patch: GiftPatch) -> Result<(), ExchangeError> {
        patch.apply_to(GiftFields {
            status: &mut self.status,
            images: &mut self.images,
            message: &mut self.message,
            is_unlocked: &mut self.is_unlocked,
        })
    }
}

/// Trims a message; blank becomes `None`.
///
/// # Errors
///
/// Returns [`ExchangeError::InvalidRequest`] if the trimmed message exceeds
/// [`MAX_MESSAGE_CHARS`].
pub fn normalize_message(message: Option<String>) -> Result<Option<String>, ExchangeError> {
    let Some(message) = message else {
        return Ok(None);
    };
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ExchangeError::InvalidRequest(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

pub(crate) fn validate_images(images: &[GiftImage]) -> Result<(), ExchangeError> {
    if images.len() > MAX_IMAGES {
        return Err(ExchangeError::InvalidRequest(format!(
            "at most {MAX_IMAGES} images per gift"
        )));
    }
    if images.iter().any(|img| img.url.trim().is_empty()) {
        return Err(ExchangeError::InvalidRequest(
            "image url must not be empty".to_string(),
        ));
    }
    Ok(())
}

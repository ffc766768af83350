//! Gift DTOs. Gifts always leave the server already redacted for the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    DeliveryStatus, GiftAccess, GiftId, GiftImage, GiftPatch, GiftView, NewGift, ParticipantId,
};
use crate::error::ExchangeError;

/// An image attached to a gift.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftImageDto {
    /// Image identifier; assigned by the server when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<uuid::Uuid>,
    /// Image URL.
    pub url: String,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl From<GiftImageDto> for GiftImage {
    fn from(dto: GiftImageDto) -> Self {
        Self {
            id: dto.id.unwrap_or_else(uuid::Uuid::new_v4),
            url: dto.url,
            caption: dto.caption,
        }
    }
}

impl From<GiftImage> for GiftImageDto {
    fn from(image: GiftImage) -> Self {
        Self {
            id: Some(image.id),
            url: image.url,
            caption: image.caption,
        }
    }
}

/// Request body for `POST /gifts`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateGiftRequest {
    /// Recipient participant.
    pub to_participant_id: uuid::Uuid,
    /// Delivery status: `pending`, `partial` or `delivered`. Defaults to `pending`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Attached images.
    #[serde(default)]
    pub images: Vec<GiftImageDto>,
    /// Optional note to the recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Create the gift already unlocked.
    #[serde(default)]
    pub is_unlocked: bool,
}

impl TryFrom<CreateGiftRequest> for NewGift {
    type Error = ExchangeError;

    fn try_from(req: CreateGiftRequest) -> Result<Self, Self::Error> {
        let status = match req.status {
            Some(s) => s.parse()?,
            None => DeliveryStatus::default(),
        };
        Ok(Self {
            to: ParticipantId::from_uuid(req.to_participant_id),
            status,
            images: req.images.into_iter().map(GiftImage::from).collect(),
            message: req.message,
            is_unlocked: req.is_unlocked,
        })
    }
}

/// Request body for `PATCH /gifts/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGiftRequest {
    /// New delivery status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Replacement image list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<GiftImageDto>>,
    /// Replacement message; an empty string clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// New lock flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unlocked: Option<bool>,
}

impl TryFrom<UpdateGiftRequest> for GiftPatch {
    type Error = ExchangeError;

    fn try_from(req: UpdateGiftRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            status: req.status.map(|s| s.parse()).transpose()?,
            images: req
                .images
                .map(|list| list.into_iter().map(GiftImage::from).collect()),
            message: req.message,
            is_unlocked: req.is_unlocked,
        })
    }
}

/// Policy flags computed for the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GiftAccessDto {
    /// Caller sent the gift.
    pub is_owner: bool,
    /// Caller receives the gift.
    pub is_recipient: bool,
    /// Caller may see who sent it.
    pub can_see_sender: bool,
    /// Caller may see images and message.
    pub can_view_contents: bool,
}

/// A gift as the caller is allowed to see it. Hidden fields are `null`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftDto {
    /// Gift identifier.
    pub id: uuid::Uuid,
    /// Sender, if visible.
    pub sender_id: Option<uuid::Uuid>,
    /// Recipient.
    pub recipient_id: Option<uuid::Uuid>,
    /// Delivery status, if visible.
    pub status: Option<String>,
    /// Images, if visible.
    pub images: Option<Vec<GiftImageDto>>,
    /// Message, if visible.
    pub message: Option<String>,
    /// Lock flag.
    pub is_unlocked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Policy flags for the caller.
    pub access: GiftAccessDto,
}

impl From<GiftView> for GiftDto {
    fn from(view: GiftView) -> Self {
        Self {
            id: *view.id.as_uuid(),
            sender_id: view.sender_id.map(uuid::Uuid::from),
            recipient_id: view.recipient_id.map(uuid::Uuid::from),
            status: view.status.map(|s| s.as_str().to_string()),
            images: view
                .images
                .map(|list| list.into_iter().map(GiftImageDto::from).collect()),
            message: view.message,
            is_unlocked: view.is_unlocked,
            created_at: view.created_at,
            access: GiftAccessDto {
                is_owner: view.access.is_owner,
                is_recipient: view.access.is_recipient,
                can_see_sender: view.access.can_see_sender,
                can_view_contents: view.access.can_view_contents,
            },
        }
    }
}

impl TryFrom<GiftDto> for GiftView {
    type Error = ExchangeError;

    fn try_from(dto: GiftDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: GiftId::from_uuid(dto.id),
            sender_id: dto.sender_id.map(ParticipantId::from_uuid),
            sender_name: None,
            recipient_id: dto.recipient_id.map(ParticipantId::from_uuid),
            recipient_name: None,
            status: dto.status.map(|s| s.parse()).transpose()?,
            images: dto
                .images
                .map(|list| list.into_iter().map(GiftImage::from).collect()),
            message: dto.message,
            is_unlocked: dto.is_unlocked,
            created_at: dto.created_at,
            access: GiftAccess {
                is_owner: dto.access.is_owner,
                is_recipient: dto.access.is_recipient,
                can_see_sender: dto.access.can_see_sender,
                can_view_contents: dto.access.can_view_contents,
            },
        })
    }
}

/// Response body for `GET /gifts`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GiftListResponse {
    /// Gifts in creation order.
    pub data: Vec<GiftDto>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_rejected() {
        let req = CreateGiftRequest {
            to_participant_id: uuid::Uuid::new_v4(),
            status: Some("lost".to_string()),
            images: Vec::new(),
            message: None,
            is_unlocked: false,
        };
        let result = NewGift::try_from(req);
        assert!(matches!(result, Err(ExchangeError::InvalidRequest(_))));
    }

    #[test]
    fn images_without_id_get_one() {
        let image = GiftImage::from(GiftImageDto {
            id: None,
            url: "https://img.example/a.png".to_string(),
            caption: None,
        });
        assert!(!image.id.is_nil());
    }

    #[test]
    fn hidden_fields_serialize_as_null() {
        let dto = GiftDto {
            id: uuid::Uuid::new_v4(),
            sender_id: None,
            recipient_id: Some(uuid::Uuid::new_v4()),
            status: None,
            images: None,
            message: None,
            is_unlocked: false,
            created_at: Utc::now(),
            access: GiftAccessDto {
                is_owner: false,
                is_recipient: false,
                can_see_sender: false,
                can_view_contents: false,
            },
        };
        let Ok(json) = serde_json::to_value(&dto) else {
            panic!("serialization failed");
        };
        assert!(json.get("sender_id").is_some_and(serde_json::Value::is_null));
        assert!(json.get("images").is_some_and(serde_json::Value::is_null));
    }
}

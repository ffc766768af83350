//! Gift visibility policy.
//!
//! Pure functions deciding what a viewer may see of a gift. Three answers
//! are independent of each other:
//!
//! - **sender identity**: visible to the sender, or to everyone once the
//!   event is revealed;
//! - **contents** (images, message): visible to the sender, and to the
//!   recipient only while the gift is unlocked;
//! - **status**: visible whenever contents are, or to the sender.
//!
//! A gift can therefore be opened by its recipient while the sender stays
//! hidden.
//!
//! Parties are addressed by [`PartyRef`]. Identifiers win whenever both
//! sides carry one; display names are compared only when an id is missing
//! (offline mode).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::participant::names_match;
use super::{DeliveryStatus, Gift, GiftId, GiftImage, ParticipantId};

/// Shown in place of the sender while the sender is hidden.
pub const HIDDEN_SENDER_LABEL: &str = "Secret Santa 🤫";

/// Reference to a party of a gift, or to the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartyRef<'a> {
    /// Stable participant identifier, when known.
    pub id: Option<ParticipantId>,
    /// Display name, when known.
    pub name: Option<&'a str>,
}

impl<'a> PartyRef<'a> {
    /// A reference carrying both an id and a name.
    #[must_use]
    pub const fn new(id: Option<ParticipantId>, name: Option<&'a str>) -> Self {
        Self { id, name }
    }

    /// An id-only reference.
    #[must_use]
    pub const fn by_id(id: ParticipantId) -> Self {
        Self {
            id: Some(id),
            name: None,
        }
    }

    /// A name-only reference (offline mode).
    #[must_use]
    pub const fn by_name(name: &'a str) -> Self {
        Self {
            id: None,
            name: Some(name),
        }
    }

    /// A viewer that is nobody in particular.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            id: None,
            name: None,
        }
    }

    /// Whether two references denote the same participant.
    ///
    /// Ids decide when both are present, even if the names agree.
    #[must_use]
    pub fn matches(&self, other: &PartyRef<'_>) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        match (self.name, other.name) {
            (Some(a), Some(b)) => names_match(a, b),
            _ => false,
        }
    }
}

/// Read access to the fields the policy needs, for online and offline
/// gift records alike.
pub trait GiftRecord {
    /// Gift identifier.
    fn gift_id(&self) -> GiftId;
    /// Who sent it.
    fn sender(&self) -> PartyRef<'_>;
    /// Who receives it.
    fn recipient(&self) -> PartyRef<'_>;
    /// Lock flag.
    fn is_unlocked(&self) -> bool;
    /// Delivery status.
    fn status(&self) -> DeliveryStatus;
    /// Attached images.
    fn images(&self) -> &[GiftImage];
    /// Optional message.
    fn message(&self) -> Option<&str>;
    /// Creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;
}

impl GiftRecord for Gift {
    fn gift_id(&self) -> GiftId {
        self.id
    }

    fn sender(&self) -> PartyRef<'_> {
        PartyRef::by_id(self.from_participant_id)
    }

    fn recipient(&self) -> PartyRef<'_> {
        PartyRef::by_id(self.to_participant_id)
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

/// What one viewer may do and see with one gift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftAccess {
    /// Viewer sent the gift.
    pub is_owner: bool,
    /// Viewer receives the gift.
    pub is_recipient: bool,
    /// Viewer may learn the sender's identity.
    pub can_see_sender: bool,
    /// Viewer may see images and message.
    pub can_view_contents: bool,
}

impl GiftAccess {
    /// Evaluates the policy.
    #[must_use]
    pub fn evaluate<G: GiftRecord + ?Sized>(
        gift: &G,
        viewer: &PartyRef<'_>,
        event_is_revealed: bool,
    ) -> Self {
        let is_owner = viewer.matches(&gift.sender());
        let is_recipient = viewer.matches(&gift.recipient());
        Self {
            is_owner,
            is_recipient,
            can_see_sender: is_owner || event_is_revealed,
            can_view_contents: is_owner || (is_recipient && gift.is_unlocked()),
        }
    }

    /// Status badge visibility.
    #[must_use]
    pub const fn can_see_status(&self) -> bool {
        self.can_view_contents || self.is_owner
    }
}

/// A gift as one viewer is allowed to see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftView {
    /// Gift identifier.
    pub id: GiftId,
    /// Sender id, present only if the viewer may see the sender.
    #[serde(default)]
    pub sender_id: Option<ParticipantId>,
    /// Sender name, present only if the viewer may see the sender and the
    /// record carries a name.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Recipient id, when the record carries one.
    #[serde(default)]
    pub recipient_id: Option<ParticipantId>,
    /// Recipient name, when the record carries one.
    #[serde(default)]
    pub recipient_name: Option<String>,
    /// Delivery status, if visible.
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
    /// Images, if contents are visible.
    #[serde(default)]
    pub images: Option<Vec<GiftImage>>,
    /// Message, if contents are visible and there is one.
    #[serde(default)]
    pub message: Option<String>,
    /// Lock flag; the lock indicator is public.
    pub is_unlocked: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Policy answers for this viewer.
    pub access: GiftAccess,
}

impl GiftView {
    /// Builds the redacted view of `gift` for `viewer`.
    #[must_use]
    pub fn redact<G: GiftRecord + ?Sized>(
        gift: &G,
        viewer: &PartyRef<'_>,
        event_is_revealed: bool,
    ) -> Self {
        let access = GiftAccess::evaluate(gift, viewer, event_is_revealed);
        let sender = gift.sender();
        let recipient = gift.recipient();
        let (sender_id, sender_name) = if access.can_see_sender {
            (sender.id, sender.name.map(str::to_string))
        } else {
            (None, None)
        };
        let (images, message) = if access.can_view_contents {
            (
                Some(gift.images().to_vec()),
                gift.message().map(str::to_string),
            )
        } else {
            (None, None)
        };
        Self {
            id: gift.gift_id(),
            sender_id,
            sender_name,
            recipient_id: recipient.id,
            recipient_name: recipient.name.map(str::to_string),
            status: access.can_see_status().then(|| gift.status()),
            images,
            message,
            is_unlocked: gift.is_unlocked(),
            created_at: gift.created_at(),
            access,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::NewGift;

    fn gift(from: ParticipantId, to: ParticipantId, unlocked: bool) -> Gift {
        let Ok(g) = Gift::create(
            from,
            NewGift {
                to,
                status: DeliveryStatus::Partial,
                images: vec![GiftImage::from_url("https://img.example/a.png")],
                message: Some("for you".to_string()),
                is_unlocked: unlocked,
            },
        ) else {
            panic!("valid gift rejected");
        };
        g
    }

    #[test]
    fn contents_visible_only_to_owner_or_unlocked_recipient() {
        let (a, b, c) = (ParticipantId::new(), ParticipantId::new(), ParticipantId::new());
        for unlocked in [false, true] {
            let g = gift(a, b, unlocked);
            for revealed in [false, true] {
                for viewer in [a, b, c] {
                    let access = GiftAccess::evaluate(&g, &PartyRef::by_id(viewer), revealed);
                    let allowed = viewer == a || (viewer == b && unlocked);
                    assert_eq!(access.can_view_contents, allowed);
                }
            }
        }
    }

    #[test]
    fn recipient_sees_sender_iff_revealed() {
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let g = gift(a, b, true);
        let viewer = PartyRef::by_id(b);
        assert!(!GiftAccess::evaluate(&g, &viewer, false).can_see_sender);
        assert!(GiftAccess::evaluate(&g, &viewer, true).can_see_sender);
    }

    #[test]
    fn unlocked_gift_keeps_sender_hidden_before_reveal() {
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let view = GiftView::redact(&gift(a, b, true), &PartyRef::by_id(b), false);
        assert!(view.access.can_view_contents);
        assert!(view.sender_id.is_none());
        assert_eq!(view.message.as_deref(), Some("for you"));
        assert_eq!(view.status, Some(DeliveryStatus::Partial));
    }

    #[test]
    fn bystander_view_is_redacted() {
        let (a, b, c) = (ParticipantId::new(), ParticipantId::new(), ParticipantId::new());
        let view = GiftView::redact(&gift(a, b, true), &PartyRef::by_id(c), false);
        assert!(view.images.is_none());
        assert!(view.message.is_none());
        assert!(view.status.is_none());
        assert!(view.sender_id.is_none());
        assert_eq!(view.recipient_id, Some(b));
        assert!(view.is_unlocked);
    }

    #[test]
    fn owner_sees_everything() {
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let view = GiftView::redact(&gift(a, b, false), &PartyRef::by_id(a), false);
        assert!(view.access.is_owner);
        assert_eq!(view.sender_id, Some(a));
        assert!(view.images.is_some());
        assert!(view.status.is_some());
    }

    #[test]
    fn anonymous_viewer_matches_nobody() {
        let (a, b) = (ParticipantId::new(), ParticipantId::new());
        let access = GiftAccess::evaluate(&gift(a, b, true), &PartyRef::anonymous(), false);
        assert_eq!(access, GiftAccess::default());
    }

    #[test]
    fn ids_take_precedence_over_names() {
        let same_name_other_person = PartyRef::new(Some(ParticipantId::new()), Some("Alex"));
        let alex = PartyRef::new(Some(ParticipantId::new()), Some("alex"));
        assert!(!same_name_other_person.matches(&alex));
    }

    #[test]
    fn names_match_case_insensitively_without_ids() {
        let viewer = PartyRef::by_name("ALEX ");
        assert!(viewer.matches(&PartyRef::by_name("alex")));
        assert!(viewer.matches(&PartyRef::new(Some(ParticipantId::new()), Some("Alex"))));
        assert!(!viewer.matches(&PartyRef::by_id(ParticipantId::new())));
    }
}

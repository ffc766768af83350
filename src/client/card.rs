//! Render-ready gift cards and gallery ordering.

use crate::client::names::{NameCache, UNKNOWN_NAME};
use crate::domain::{GiftId, GiftImage, GiftView, HIDDEN_SENDER_LABEL};

/// Hint on a wrapped gift, shown to its recipient.
pub const RECIPIENT_WRAPPED_HINT: &str = "This gift is still wrapped! Wait for the reveal...";

/// Hint on a wrapped gift, shown to everyone else.
pub const PRIVATE_GIFT_HINT: &str = "Only the gifter and recipient can see this";

/// Buttons available to the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardActions {
    /// Show the lock/unlock button.
    pub can_toggle_lock: bool,
    /// Show the delete button.
    pub can_delete: bool,
    /// Show the status picker.
    pub can_edit_status: bool,
}

/// Everything a front end needs to draw one gift.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftCard {
    /// Gift identifier.
    pub id: GiftId,
    /// Sender name, or [`HIDDEN_SENDER_LABEL`].
    pub sender_label: String,
    /// Recipient name.
    pub recipient_label: String,
    /// Status badge text, if visible.
    pub status_label: Option<&'static str>,
    /// Images, if visible.
    pub images: Option<Vec<GiftImage>>,
    /// Message, if visible.
    pub message: Option<String>,
    /// Placeholder text shown instead of hidden contents.
    pub wrapped_hint: Option<&'static str>,
    /// Lock indicator.
    pub is_unlocked: bool,
    /// Viewer sent this gift.
    pub is_mine: bool,
    /// Viewer receives this gift.
    pub is_for_me: bool,
    /// Owner controls.
    pub actions: CardActions,
}

impl GiftCard {
    /// Builds the card for an already-redacted view.
    ///
    /// Names come from the view when it carries them (offline mode),
    /// otherwise from `names`.
    #[must_use]
    pub fn build(view: &GiftView, names: &NameCache) -> Self {
        let access = view.access;
        let sender_label = if access.can_see_sender {
            label(view.sender_name.as_deref(), view.sender_id.map(|id| names.name_of(id)))
        } else {
            HIDDEN_SENDER_LABEL.to_string()
        };
        let recipient_label = label(
            view.recipient_name.as_deref(),
            view.recipient_id.map(|id| names.name_of(id)),
        );
        let wrapped_hint = match (access.can_view_contents, access.is_recipient) {
            (true, _) => None,
            (false, true) => Some(RECIPIENT_WRAPPED_HINT),
            (false, false) => Some(PRIVATE_GIFT_HINT),
        };
        Self {
            id: view.id,
            sender_label,
            recipient_label,
            status_label: view.status.map(|s| s.label()),
            images: view.images.clone(),
            message: view.message.clone(),
            wrapped_hint,
            is_unlocked: view.is_unlocked,
            is_mine: access.is_owner,
            is_for_me: access.is_recipient,
            actions: CardActions {
                can_toggle_lock: access.is_owner,
                can_delete: access.is_owner,
                can_edit_status: access.is_owner,
            },
        }
    }
}

fn label(carried: Option<&str>, cached: Option<&str>) -> String {
    carried.or(cached).unwrap_or(UNKNOWN_NAME).to_string()
}

/// Builds the gallery: the viewer's own gifts first, then gifts for the
/// viewer, then the rest. Order within each group is preserved.
#[must_use]
pub fn gallery(views: &[GiftView], names: &NameCache) -> Vec<GiftCard> {
    let mut cards: Vec<GiftCard> = views.iter().map(|v| GiftCard::build(v, names)).collect();
    cards.sort_by_key(|card| match (card.is_mine, card.is_for_me) {
        (true, _) => 0,
        (false, true) => 1,
        (false, false) => 2,
    });
    cards
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{
        DeliveryStatus, DisplayName, Gift, NewGift, Participant, ParticipantId, PartyRef,
    };

    fn participant(name: &str) -> Participant {
        let Ok(name) = DisplayName::parse(name) else {
            panic!("valid name rejected");
        };
        Participant::new(name)
    }

    fn gift(from: ParticipantId, to: ParticipantId, unlocked: bool) -> Gift {
        let Ok(g) = Gift::create(
            from,
            NewGift {
                to,
                status: DeliveryStatus::Delivered,
                images: vec![GiftImage::from_url("https://img.example/1.png")],
                message: Some("hi".to_string()),
                is_unlocked: unlocked,
            },
        ) else {
            panic!("valid gift rejected");
        };
        g
    }

    #[test]
    fn unlocked_gift_keeps_sender_hidden_before_reveal() {
        let (a, b) = (participant("Alice"), participant("Bob"));
        let mut names = NameCache::default();
        names.rebuild(&[a.clone(), b.clone()]);

        let view = GiftView::redact(&gift(a.id, b.id, true), &PartyRef::by_id(b.id), false);
        let card = GiftCard::build(&view, &names);
        assert_eq!(card.sender_label, HIDDEN_SENDER_LABEL);
        assert_eq!(card.recipient_label, "Bob");
        assert!(card.images.is_some());
        assert_eq!(card.status_label, Some("Delivered"));
        assert!(card.wrapped_hint.is_none());
        assert!(!card.actions.can_delete);
    }

    #[test]
    fn wrapped_hints_differ_for_recipient_and_bystander() {
        let (a, b, c) = (participant("Alice"), participant("Bob"), participant("Carol"));
        let names = NameCache::default();
        let locked = gift(a.id, b.id, false);

        let for_b = GiftCard::build(&GiftView::redact(&locked, &PartyRef::by_id(b.id), false), &names);
        assert_eq!(for_b.wrapped_hint, Some(RECIPIENT_WRAPPED_HINT));
        assert!(for_b.status_label.is_none());

        let for_c = GiftCard::build(&GiftView::redact(&locked, &PartyRef::by_id(c.id), true), &names);
        assert_eq!(for_c.wrapped_hint, Some(PRIVATE_GIFT_HINT));
        assert_eq!(for_c.sender_label, UNKNOWN_NAME);
    }

    #[test]
    fn gallery_puts_own_gifts_first_then_received() {
        let (a, b, c) = (participant("Alice"), participant("Bob"), participant("Carol"));
        let names = NameCache::default();
        let viewer = PartyRef::by_id(a.id);
        let other = gift(b.id, c.id, false);
        let received = gift(c.id, a.id, false);
        let own = gift(a.id, b.id, false);
        let views: Vec<GiftView> = [&other, &received, &own]
            .into_iter()
            .map(|g| GiftView::redact(g, &viewer, false))
            .collect();

        let ids: Vec<GiftId> = gallery(&views, &names).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![own.id, received.id, other.id]);
    }
}

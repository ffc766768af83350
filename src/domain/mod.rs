//! Domain layer: identifiers, records, credentials and the visibility policy.
//!
//! Everything here is synchronous and free of I/O. The store and the
//! service build on these types; the client reuses the policy for its
//! offline mode.

pub mod credentials;
pub mod event;
pub mod gift;
pub mod ids;
pub mod participant;
pub mod visibility;

pub use credentials::{PasscodeGate, PlayerKey};
pub use event::{Event, EventPhase, Readiness, RevealOutcome};
pub use gift::{DeliveryStatus, Gift, GiftImage, GiftPatch, LockState, NewGift};
pub use ids::{EventId, GiftId, ParticipantId};
pub use participant::{DisplayName, Participant};
pub use visibility::{GiftAccess, GiftRecord, GiftView, HIDDEN_SENDER_LABEL, PartyRef};

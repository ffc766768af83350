//! The gift-exchange event and its one-way reveal latch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, Participant};

/// Lifecycle of an event. `Revealed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    /// Gifts are being exchanged; senders are hidden.
    Active,
    /// Everyone can see who their Secret Santa was.
    Revealed,
}

impl EventPhase {
    /// Wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revealed => "revealed",
        }
    }
}

/// How many participants have signalled readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    /// Participants marked ready.
    pub ready: usize,
    /// All participants.
    pub total: usize,
}

impl Readiness {
    /// Counts readiness over a participant list.
    #[must_use]
    pub fn of(participants: &[Participant]) -> Self {
        Self {
            ready: participants.iter().filter(|p| p.is_ready).count(),
            total: participants.len(),
        }
    }

    /// The reveal barrier: at least one participant, and all of them ready.
    #[must_use]
    pub const fn all_ready(&self) -> bool {
        self.total > 0 && self.ready == self.total
    }
}

/// Result of a reveal request. `NotYet` is an expected answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevealOutcome {
    /// This request flipped the latch.
    Revealed,
    /// The event was already revealed; nothing changed.
    AlreadyRevealed,
    /// Not every participant is ready.
    NotYet {
        /// Participants marked ready.
        ready: usize,
        /// All participants.
        total: usize,
    },
}

impl RevealOutcome {
    /// Returns `true` if the event is revealed after this request.
    #[must_use]
    pub const fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed | Self::AlreadyRevealed)
    }
}

/// The single global gift-exchange event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Event title.
    pub name: String,
    /// One-way latch: false → true, never back.
    pub is_revealed: bool,
    /// When the latch flipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revealed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates an active event.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            name: name.into(),
            is_revealed: false,
            revealed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EventPhase {
        if self.is_revealed {
            EventPhase::Revealed
        } else {
            EventPhase::Active
        }
    }

    /// Attempts the `active → revealed` transition against the current
    /// participant roster.
    pub fn request_reveal(&mut self, participants: &[Participant]) -> RevealOutcome {
        if self.is_revealed {
            return RevealOutcome::AlreadyRevealed;
        }
        let readiness = Readiness::of(participants);
        if !readiness.all_ready() {
            return RevealOutcome::NotYet {
                ready: readiness.ready,
                total: readiness.total,
            };
        }
        self.is_revealed = true;
        self.revealed_at = Some(Utc::now());
        RevealOutcome::Revealed
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DisplayName;

    fn roster(ready: &[bool]) -> Vec<Participant> {
        ready
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let Ok(name) = DisplayName::parse(&format!("player {i}")) else {
                    panic!("valid name rejected");
                };
                let mut p = Participant::new(name);
                p.is_ready = *r;
                p
            })
            .collect()
    }

    #[test]
    fn two_of_three_ready_is_not_yet() {
        let mut event = Event::new("Secret Santa");
        let outcome = event.request_reveal(&roster(&[true, true, false]));
        assert_eq!(outcome, RevealOutcome::NotYet { ready: 2, total: 3 });
        assert!(!event.is_revealed);
        assert_eq!(event.phase(), EventPhase::Active);
    }

    #[test]
    fn all_ready_reveals_once() {
        let mut event = Event::new("Secret Santa");
        let players = roster(&[true, true, true]);
        assert_eq!(event.request_reveal(&players), RevealOutcome::Revealed);
        assert!(event.revealed_at.is_some());
        assert_eq!(event.request_reveal(&players), RevealOutcome::AlreadyRevealed);
    }

    #[test]
    fn latch_never_reverses() {
        let mut event = Event::new("Secret Santa");
        let _ = event.request_reveal(&roster(&[true]));
        let outcome = event.request_reveal(&roster(&[false, false]));
        assert!(outcome.is_revealed());
        assert_eq!(event.phase(), EventPhase::Revealed);
    }

    #[test]
    fn empty_roster_cannot_reveal() {
        assert!(!Readiness::of(&[]).all_ready());
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let Ok(json) = serde_json::to_string(&RevealOutcome::NotYet { ready: 1, total: 2 }) else {
            panic!("serialization failed");
        };
        assert!(json.contains("\"outcome\":\"not_yet\""));
    }
}

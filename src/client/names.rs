//! Participant id to display name lookup, for labels only.

use std::collections::HashMap;

use crate::domain::{Participant, ParticipantId};

/// Label for ids not in the roster (e.g. someone who left).
pub const UNKNOWN_NAME: &str = "Someone";

/// Read-through cache of display names keyed by participant id.
///
/// Rebuilt from scratch on every roster refresh. Never consulted for
/// authorization.
#[derive(Debug, Clone, Default)]
pub struct NameCache {
    names: HashMap<ParticipantId, String>,
}

impl NameCache {
    /// Replaces the cache with the given roster.
    pub fn rebuild(&mut self, participants: &[Participant]) {
        self.names = participants
            .iter()
            .map(|p| (p.id, p.display_name.to_string()))
            .collect();
    }

    /// Looks up a name.
    #[must_use]
    pub fn get(&self, id: ParticipantId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Name for `id`, or [`UNKNOWN_NAME`].
    #[must_use]
    pub fn name_of(&self, id: ParticipantId) -> &str {
        self.get(id).unwrap_or(UNKNOWN_NAME)
    }

    /// Number of cached names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no roster has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

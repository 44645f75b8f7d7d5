//! Room configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a director creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Candidates seated next to each focal participant. Also the
    /// allocation ratio: a room needs `1` focal of one category and
    /// `candidates_per_room` candidates of the other.
    pub candidates_per_room: usize,

    /// Prompts issued before a room moves to voting. Independent of
    /// `candidates_per_room`; the default of 8 gives every seat two turns
    /// with three candidates.
    pub prompt_limit: usize,

    /// Seed for prompt selection. `None` draws a fresh seed per room.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            candidates_per_room: 3,
            prompt_limit: 8,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → Active → Voting → Finished
///    └────────────────↗          ↑
///    (admin override)   (forced from any state)
/// ```
///
/// - **Waiting**: room exists, participants notified, not started.
/// - **Active**: prompts are issued and answered in turn.
/// - **Voting**: the focal participant picks a candidate.
/// - **Finished**: terminal. The director tears the room down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Waiting,
    Active,
    Voting,
    Finished,
}

impl RoomState {
    /// Returns `true` while the question/answer loop runs.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` once the room can't change anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The regular successor state, ignoring overrides.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Active),
            Self::Active => Some(Self::Voting),
            Self::Voting => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` is allowed, including the
    /// administrative shortcuts (straight to voting, forced finish).
    pub fn can_transition_to(self, target: Self) -> bool {
        if self.next() == Some(target) {
            return true;
        }
        match (self, target) {
            (Self::Waiting, Self::Voting) => true,
            (Self::Waiting | Self::Active, Self::Finished) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Active => write!(f, "Active"),
            Self::Voting => write!(f, "Voting"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

//! The stored shape of a registered participant.

use matchroom_protocol::{Category, ParticipantId};
use serde::{Deserialize, Serialize};

/// One registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Transport identity.
    pub id: ParticipantId,

    /// Display name given at registration (full name in practice).
    pub name: String,

    /// Declared category. Decides which side of a room the participant
    /// can sit on.
    pub category: Category,

    /// Whether an administrator approved the registration.
    pub approved: bool,
}

impl UserRecord {
    /// The profile text other room members see.
    pub fn profile(&self) -> String {
        format!("{} (category {})", self.name, self.category)
    }
}

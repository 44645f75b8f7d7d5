//! The waiting pool: registered participants not currently in a room.

use std::collections::{BTreeMap, HashMap};

use matchroom_protocol::{Category, ParticipantId};

use crate::RoomError;

/// Unmatched participants keyed by identity.
///
/// Iteration and allocation follow admission order. Re-admitting a
/// participant who is already waiting keeps their place and only
/// updates the category.
#[derive(Debug, Default)]
pub struct WaitingPool {
    /// Admission sequence → participant.
    order: BTreeMap<u64, ParticipantId>,
    /// Participant → (category, admission sequence).
    entries: HashMap<ParticipantId, (Category, u64)>,
    next_seq: u64,
}

impl WaitingPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a participant. Returns `true` if the
    /// participant was not waiting before.
    pub fn admit(&mut self, id: ParticipantId, category: Category) -> bool {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.0 = category;
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id);
        self.entries.insert(id, (category, seq));
        true
    }

    /// Removes a participant and returns their category.
    ///
    /// # Errors
    /// [`RoomError::NotInPool`] if the participant isn't waiting.
    pub fn withdraw(&mut self, id: ParticipantId) -> Result<Category, RoomError> {
        let (category, seq) = self.entries.remove(&id).ok_or(RoomError::NotInPool(id))?;
        self.order.remove(&seq);
        Ok(category)
    }

    /// Withdraws the longest-waiting participant of `category`.
    pub fn take_first(&mut self, category: Category) -> Option<ParticipantId> {
        let id = self
            .iter()
            .find(|(_, c)| *c == category)
            .map(|(id, _)| id)?;
        self.withdraw(id).ok()?;
        Some(id)
    }

    /// Number of waiting participants of `category`.
    pub fn count_by_category(&self, category: Category) -> usize {
        self.entries.values().filter(|(c, _)| *c == category).count()
    }

    /// Category of a waiting participant.
    pub fn category_of(&self, id: ParticipantId) -> Option<Category> {
        self.entries.get(&id).map(|(c, _)| *c)
    }

    /// Returns `true` if `id` is waiting.
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Waiting participants in admission order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, Category)> + '_ {
        self.order.values().map(|id| (*id, self.entries[id].0))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

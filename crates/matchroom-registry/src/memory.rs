//! In-memory [`Registry`] implementation.
//!
//! # Concurrency note
//!
//! `MemoryRegistry` is not thread-safe by itself. It is owned by the
//! server's event task and only touched from there.

use std::collections::{BTreeMap, BTreeSet};

use matchroom_protocol::{Category, ParticipantId};

use crate::{Registry, RegistryError, UserRecord};

/// A registry backed by two ordered maps.
///
/// Administrators are kept apart from user records: an operator doesn't
/// have to register as a participant to run rounds.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    users: BTreeMap<ParticipantId, UserRecord>,
    admins: BTreeSet<ParticipantId>,
    duty: Option<ParticipantId>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the given administrators pre-seeded.
    pub fn with_admins(admins: impl IntoIterator<Item = ParticipantId>) -> Self {
        Self {
            users: BTreeMap::new(),
            admins: admins.into_iter().collect(),
            duty: None,
        }
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if nobody registered yet.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Registry for MemoryRegistry {
    fn get(&self, id: ParticipantId) -> Option<UserRecord> {
        self.users.get(&id).cloned()
    }

    fn add(
        &mut self,
        id: ParticipantId,
        name: &str,
        category: Category,
    ) -> Result<UserRecord, RegistryError> {
        if self.users.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        let record = UserRecord {
            id,
            name: name.trim().to_string(),
            category,
            approved: false,
        };
        self.users.insert(id, record.clone());
        tracing::info!(participant = %id, %category, "participant registered");
        Ok(record)
    }

    fn approve(&mut self, id: ParticipantId) -> Result<UserRecord, RegistryError> {
        let record = self.users.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        record.approved = true;
        tracing::info!(participant = %id, "participant approved");
        Ok(record.clone())
    }

    fn all(&self) -> Vec<UserRecord> {
        self.users.values().cloned().collect()
    }

    fn list_admins(&self) -> BTreeSet<ParticipantId> {
        self.admins.clone()
    }

    fn is_admin(&self, id: ParticipantId) -> bool {
        self.admins.contains(&id)
    }

    fn add_admin(&mut self, id: ParticipantId) -> bool {
        let added = self.admins.insert(id);
        if added {
            tracing::info!(participant = %id, "administrator added");
        }
        added
    }

    fn remove_admin(&mut self, id: ParticipantId) -> bool {
        let removed = self.admins.remove(&id);
        if removed {
            tracing::info!(participant = %id, "administrator removed");
            if self.duty == Some(id) {
                self.duty = None;
            }
        }
        removed
    }

    fn duty_admin(&self) -> Option<ParticipantId> {
        self.duty
    }

    fn set_duty_admin(&mut self, id: Option<ParticipantId>) {
        tracing::info!(duty = ?id, "duty administrator changed");
        self.duty = id;
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    #[test]
    fn test_add_then_get_returns_record() {
        let mut reg = MemoryRegistry::new();
        reg.add(pid(1), "  Ada Lovelace ", Category::A).unwrap();

        let record = reg.get(pid(1)).expect("should exist");
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.category, Category::A);
        assert!(!record.approved);
        assert!(reg.exists(pid(1)));
        assert!(!reg.exists(pid(2)));
    }

    #[test]
    fn test_add_twice_returns_already_registered() {
        let mut reg = MemoryRegistry::new();
        reg.add(pid(1), "Ada", Category::A).unwrap();

        let result = reg.add(pid(1), "Ada again", Category::B);
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(p)) if p == pid(1)));
        // The original record is untouched.
        assert_eq!(reg.get(pid(1)).unwrap().category, Category::A);
    }

    #[test]
    fn test_approve_unknown_returns_not_found() {
        let mut reg = MemoryRegistry::new();
        assert!(matches!(reg.approve(pid(3)), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_approve_sets_flag() {
        let mut reg = MemoryRegistry::new();
        reg.add(pid(1), "Ada", Category::A).unwrap();
        assert!(reg.approve(pid(1)).unwrap().approved);
        assert!(reg.get(pid(1)).unwrap().approved);
    }

    #[test]
    fn test_all_is_ordered_by_identity() {
        let mut reg = MemoryRegistry::new();
        reg.add(pid(5), "E", Category::B).unwrap();
        reg.add(pid(2), "B", Category::A).unwrap();
        let ids: Vec<_> = reg.all().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![pid(2), pid(5)]);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_admin_set_add_and_remove() {
        let mut reg = MemoryRegistry::with_admins([pid(1)]);
        assert!(reg.is_admin(pid(1)));
        assert!(reg.add_admin(pid(2)));
        assert!(!reg.add_admin(pid(2)), "second add is a no-op");
        assert!(reg.remove_admin(pid(1)));
        assert!(!reg.remove_admin(pid(1)));
        assert_eq!(reg.list_admins().into_iter().collect::<Vec<_>>(), vec![pid(2)]);
    }

    #[test]
    fn test_duty_admin_defaults_to_none_and_follows_admin_rights() {
        let mut reg = MemoryRegistry::with_admins([pid(1), pid(2)]);
        assert_eq!(reg.duty_admin(), None);

        reg.set_duty_admin(Some(pid(2)));
        assert_eq!(reg.duty_admin(), Some(pid(2)));

        reg.remove_admin(pid(1));
        assert_eq!(reg.duty_admin(), Some(pid(2)));
        reg.remove_admin(pid(2));
        assert_eq!(reg.duty_admin(), None);
    }
}

//! The registry trait.
//!
//! Matchroom doesn't own user storage. The command handler only needs a
//! handful of lookups, so they are expressed as the [`Registry`] trait and
//! whatever database the deployment uses implements it.

use std::collections::BTreeSet;

use matchroom_protocol::{Category, ParticipantId};

use crate::{RegistryError, UserRecord};

/// Lookups and updates on registered participants.
///
/// Methods are synchronous: the registry is queried from inside the
/// single event-processing task, and every implementation so far is a
/// local store.
pub trait Registry: Send + 'static {
    /// Returns `true` if a record exists for `id`.
    fn exists(&self, id: ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// Looks up a participant's record.
    fn get(&self, id: ParticipantId) -> Option<UserRecord>;

    /// Registers a new participant.
    ///
    /// # Errors
    /// [`RegistryError::AlreadyRegistered`] if `id` already has a record.
    fn add(
        &mut self,
        id: ParticipantId,
        name: &str,
        category: Category,
    ) -> Result<UserRecord, RegistryError>;

    /// Marks a registration as approved.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if `id` has no record.
    fn approve(&mut self, id: ParticipantId) -> Result<UserRecord, RegistryError>;

    /// Every record, ordered by identity.
    fn all(&self) -> Vec<UserRecord>;

    /// Identities with administrator rights.
    fn list_admins(&self) -> BTreeSet<ParticipantId>;

    /// Returns `true` if `id` is an administrator.
    fn is_admin(&self, id: ParticipantId) -> bool {
        self.list_admins().contains(&id)
    }

    /// Grants administrator rights. Returns `false` if `id` already had them.
    fn add_admin(&mut self, id: ParticipantId) -> bool;

    /// Revokes administrator rights. Returns `false` if `id` didn't have them.
    ///
    /// Revoking the duty administrator also clears the duty slot.
    fn remove_admin(&mut self, id: ParticipantId) -> bool;

    /// The administrator that receives approval requests, if one is set.
    fn duty_admin(&self) -> Option<ParticipantId>;

    /// Replaces the duty administrator. `None` clears it.
    fn set_duty_admin(&mut self, id: Option<ParticipantId>);
}

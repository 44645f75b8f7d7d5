//! Participant registry for Matchroom.
//!
//! The registry answers "who is this person?" for the rest of the system:
//!
//! 1. **Lookups**: does a participant exist, what's their record
//!    ([`Registry`] trait)
//! 2. **Registration and approval**: `add` / `approve`
//! 3. **Administrators**: the set of identities allowed to run rounds
//!
//! Real deployments keep users in a database; [`MemoryRegistry`] is the
//! in-process implementation used by the demo and the tests.
//!
//! # How it fits in the stack
//!
//! ```text
//! Command handler (above)  ← admin gating, registration, profiles
//!     ↕
//! Registry Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← provides ParticipantId, Category
//! ```

mod error;
mod memory;
mod record;
mod registry;

pub use error::RegistryError;
pub use memory::MemoryRegistry;
pub use record::UserRecord;
pub use registry::Registry;

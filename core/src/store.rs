//! In-memory persistence with an explicit pessimistic lock handle
//!
//! The relational store of the surrounding system is modelled as a single
//! [`MemoryStore`] guarding every aggregate behind one `RwLock`.
//! [`MemoryStore::begin`] yields a [`StoreTxn`] write guard — the engine's
//! row-lock surrogate. Every method that mutates a shared counter takes
//! `&mut StoreTxn`, so the type system enforces that the caller already
//! holds the lock before evaluating any cap and before writing; a plain
//! read-then-conditional-write cannot be expressed against this API.
//!
//! A transaction spans a whole check-then-act sequence: validation failures
//! return before any insert, so a failed create/claim never persists
//! partial state.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{Block, Link, LinkStatus, LinkUsage, Program};

/// Every aggregate the engine owns, keyed by id.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub programs: HashMap<Uuid, Program>,
    pub links: HashMap<Uuid, Link>,
    pub usages: HashMap<Uuid, LinkUsage>,
    pub blocks: HashMap<Uuid, Block>,
}

impl StoreState {
    #[must_use]
    pub fn program_by_name(&self, name: &str) -> Option<&Program> {
        self.programs
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// All programs flagged as default; the invariant allows at most one.
    #[must_use]
    pub fn default_programs(&self) -> Vec<&Program> {
        self.programs.values().filter(|p| p.is_default).collect()
    }

    #[must_use]
    pub fn link_by_name(&self, user_id: Uuid, program_id: Uuid, name: &str) -> Option<&Link> {
        self.links.values().find(|l| {
            l.user_id == user_id && l.program_id == program_id && l.name.eq_ignore_ascii_case(name)
        })
    }

    #[must_use]
    pub fn active_link_for(&self, user_id: Uuid, program_id: Uuid) -> Option<&Link> {
        self.links.values().find(|l| {
            l.user_id == user_id && l.program_id == program_id && l.status == LinkStatus::Active
        })
    }

    /// The referee's usage for a program; unique on (user, program).
    #[must_use]
    pub fn usage_for(&self, user_id: Uuid, program_id: Uuid) -> Option<&LinkUsage> {
        self.usages
            .values()
            .find(|u| u.user_id == user_id && u.program_id == program_id)
    }

    pub fn usages_for_link(&self, link_id: Uuid) -> impl Iterator<Item = &LinkUsage> {
        self.usages.values().filter(move |u| u.link_id == link_id)
    }

    pub fn links_for_user(&self, user_id: Uuid) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.user_id == user_id)
    }

    pub fn links_for_program(&self, program_id: Uuid) -> impl Iterator<Item = &Link> {
        self.links
            .values()
            .filter(move |l| l.program_id == program_id)
    }

    /// All active blocks for a user; the invariant allows at most one.
    #[must_use]
    pub fn active_blocks_for(&self, user_id: Uuid) -> Vec<&Block> {
        self.blocks
            .values()
            .filter(|b| b.user_id == user_id && b.active)
            .collect()
    }
}

/// Shared store backing every service.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Begins a transaction, taking the store-wide pessimistic lock.
    ///
    /// Holders must not call back into a method that begins its own
    /// transaction; cross-service work inside a transaction passes the
    /// handle down instead.
    #[must_use]
    pub fn begin(&self) -> StoreTxn<'_> {
        StoreTxn {
            state: self.state.write().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Shared read access for queries that mutate nothing.
    #[must_use]
    pub fn read(&self) -> StoreReader<'_> {
        StoreReader {
            state: self.state.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// A deep copy of the current state, for snapshotting to disk.
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.read().clone()
    }
}

/// Exclusive lock handle over the whole store; the unit of atomicity for
/// every read-then-write sequence in the engine.
pub struct StoreTxn<'a> {
    state: RwLockWriteGuard<'a, StoreState>,
}

impl Deref for StoreTxn<'_> {
    type Target = StoreState;

    fn deref(&self) -> &StoreState {
        &self.state
    }
}

impl DerefMut for StoreTxn<'_> {
    fn deref_mut(&mut self) -> &mut StoreState {
        &mut self.state
    }
}

/// Shared read handle.
pub struct StoreReader<'a> {
    state: RwLockReadGuard<'a, StoreState>,
}

impl Deref for StoreReader<'_> {
    type Target = StoreState;

    fn deref(&self) -> &StoreState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn link(user_id: Uuid, program_id: Uuid, name: &str, status: LinkStatus) -> Link {
        let now = Utc::now();
        Link {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            program_id,
            user_id,
            status,
            url: "https://app.example.org/referral/claim/x".parse().expect("static url"),
            short_url: "https://sho.rt/1".into(),
            completion_total: 0,
            zlto_reward_cumulative: 0,
            date_created: now,
            date_modified: now,
        }
    }

    #[test]
    fn link_name_lookup_is_case_insensitive_and_scoped() {
        let user = Uuid::new_v4();
        let other_user = Uuid::new_v4();
        let program = Uuid::new_v4();

        let store = MemoryStore::new();
        {
            let mut txn = store.begin();
            let l = link(user, program, "My Link", LinkStatus::Active);
            txn.links.insert(l.id, l);
        }

        let reader = store.read();
        assert!(reader.link_by_name(user, program, "my link").is_some());
        assert!(reader.link_by_name(other_user, program, "My Link").is_none());
        assert!(reader.link_by_name(user, Uuid::new_v4(), "My Link").is_none());
    }

    #[test]
    fn active_link_lookup_ignores_terminal_links() {
        let user = Uuid::new_v4();
        let program = Uuid::new_v4();

        let store = MemoryStore::new();
        {
            let mut txn = store.begin();
            let l = link(user, program, "Old", LinkStatus::Cancelled);
            txn.links.insert(l.id, l);
        }
        assert!(store.read().active_link_for(user, program).is_none());

        {
            let mut txn = store.begin();
            let l = link(user, program, "New", LinkStatus::Active);
            txn.links.insert(l.id, l);
        }
        assert!(store.read().active_link_for(user, program).is_some());
    }

    #[test]
    fn snapshot_round_trips_through_serde() {
        let user = Uuid::new_v4();
        let program = Uuid::new_v4();
        let store = MemoryStore::new();
        {
            let mut txn = store.begin();
            let l = link(user, program, "My Link", LinkStatus::Active);
            txn.links.insert(l.id, l);
        }

        let json = serde_json::to_string(&store.snapshot()).expect("serialize");
        let restored: StoreState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.links.len(), 1);
        assert!(restored.link_by_name(user, program, "My Link").is_some());
    }
}

//! In-process store backed by a concurrent map.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::storage::{email_key, InsertOutcome, StoreError, WaitlistStore};
use crate::waitlist::types::{NewEntry, WaitlistEntry};

/// A thread-safe, non-durable waitlist store.
///
/// Keyed by normalized email; the map's entry API makes insert-if-absent
/// atomic per key. Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, WaitlistEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry by email (any casing or surrounding whitespace).
    pub fn get(&self, email: &str) -> Option<WaitlistEntry> {
        self.entries.get(&email_key(email)).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn count_since(&self, ip_hash: &str, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let count = self
            .entries
            .iter()
            .filter(|r| r.ip_hash == ip_hash && r.created_at >= cutoff)
            .count();
        Ok(count as u64)
    }

    async fn insert(&self, entry: NewEntry) -> Result<InsertOutcome, StoreError> {
        match self.entries.entry(email_key(&entry.email)) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                let stored = WaitlistEntry::new(entry);
                slot.insert(stored.clone());
                Ok(InsertOutcome::Inserted(stored))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

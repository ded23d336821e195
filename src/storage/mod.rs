//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! Submission handler
//!     → count_since (rate limiter, per hashed IP)
//!     → insert (uniqueness enforced by the store itself)
//!         → Inserted(entry) | Duplicate | Err(StoreError)
//! ```
//!
//! # Design Decisions
//! - Uniqueness of the normalized email is a store constraint, never a
//!   check-then-insert in the caller
//! - A duplicate key is an ordinary outcome, not an error
//! - Entries are append-only: no update or delete operations exist

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::waitlist::types::{NewEntry, WaitlistEntry};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors a store can report. Duplicate emails are not among them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// How an insert attempt ended when the store itself worked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(WaitlistEntry),
    /// An entry with the same email already exists; nothing was written.
    Duplicate,
}

/// Durable home of waitlist entries.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Number of entries with exactly `ip_hash` created at or after `cutoff`.
    async fn count_since(&self, ip_hash: &str, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Atomically insert unless the email is already present.
    async fn insert(&self, entry: NewEntry) -> Result<InsertOutcome, StoreError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Canonical form used as the uniqueness key.
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

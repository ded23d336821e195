//! SQLite-backed store.
//!
//! Timestamps are stored as Unix nanoseconds so the window query compares
//! integers at the full precision of `DateTime<Utc>`; no rounding moves an
//! entry across the window boundary. The email column is `UNIQUE COLLATE NOCASE`; SQLite rejects the
//! second of two racing inserts.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::storage::{email_key, InsertOutcome, StoreError, WaitlistStore};
use crate::waitlist::types::{NewEntry, Role, WaitlistEntry};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS waitlist_entries (
    id          TEXT PRIMARY KEY NOT NULL,
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    role        TEXT NOT NULL,
    custom_role TEXT,
    ip_hash     TEXT NOT NULL,
    created_at  INTEGER NOT NULL
)";

const CREATE_RATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_waitlist_entries_ip_hash_created_at
    ON waitlist_entries (ip_hash, created_at)";

/// Waitlist store on a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database and apply the schema.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);

        // Every connection to `sqlite::memory:` is a separate database, so an
        // in-memory pool is pinned to a single long-lived connection.
        let in_memory = config.database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;

        tracing::info!(database_url = %config.database_url, "SQLite store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_RATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Fetch an entry by email (any casing or surrounding whitespace).
    pub async fn get(&self, email: &str) -> Result<Option<WaitlistEntry>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, role, custom_role, ip_hash, created_at
             FROM waitlist_entries WHERE email = ?",
        )
        .bind(email_key(email))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| entry_from_row(&row)).transpose()
    }

    /// Total number of entries.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<WaitlistEntry, StoreError> {
    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;
    let created_at: i64 = row.try_get("created_at")?;

    Ok(WaitlistEntry {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::Corrupt(format!("id '{id}': {e}")))?,
        email: row.try_get("email")?,
        role: Role::from_str(&role).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        custom_role: row.try_get("custom_role")?,
        ip_hash: row.try_get("ip_hash")?,
        created_at: DateTime::from_timestamp_nanos(created_at),
    })
}

/// Cutoffs before 1677 (the i64 nanosecond range) count everything.
fn cutoff_nanos(cutoff: DateTime<Utc>) -> i64 {
    cutoff.timestamp_nanos_opt().unwrap_or(i64::MIN)
}

#[async_trait]
impl WaitlistStore for SqliteStore {
    async fn count_since(&self, ip_hash: &str, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM waitlist_entries WHERE ip_hash = ? AND created_at >= ?",
        )
        .bind(ip_hash)
        .bind(cutoff_nanos(cutoff))
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn insert(&self, entry: NewEntry) -> Result<InsertOutcome, StoreError> {
        let mut stored = WaitlistEntry::new(entry);
        stored.email = email_key(&stored.email);
        let created_at = stored.created_at.timestamp_nanos_opt().ok_or_else(|| {
            StoreError::Corrupt(format!("created_at {} out of range", stored.created_at))
        })?;

        let result = sqlx::query(
            "INSERT INTO waitlist_entries (id, email, role, custom_role, ip_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(stored.id.to_string())
        .bind(&stored.email)
        .bind(stored.role.as_str())
        .bind(stored.custom_role.as_deref())
        .bind(&stored.ip_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(stored)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

//! Submission flow against the SQLite store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use waitlist_service::config::{StorageBackend, StorageConfig, WaitlistConfig};
use waitlist_service::security::hash_ip;
use waitlist_service::storage::{SqliteStore, WaitlistStore};
use waitlist_service::waitlist::{NewEntry, Role};

mod common;

use common::{start_server, submission};

async fn sqlite_store() -> SqliteStore {
    SqliteStore::connect(&StorageConfig {
        backend: StorageBackend::Sqlite,
        database_url: "sqlite::memory:".into(),
        ..StorageConfig::default()
    })
    .await
    .unwrap()
}

async fn seed(store: &SqliteStore, ip: &str, count: usize, age: Duration) {
    for i in 0..count {
        store
            .insert(NewEntry {
                email: format!("seed{i}@x.com"),
                role: Role::Student,
                custom_role: None,
                ip_hash: hash_ip(ip),
                created_at: Utc::now() - age,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_concurrent_duplicates_admit_exactly_one() {
    let store = sqlite_store().await;
    let mut config = WaitlistConfig::default();
    config.rate_limit.enabled = false;
    let server = Arc::new(start_server(config, Arc::new(store.clone())).await);

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let server = server.clone();
            tokio::spawn(async move {
                server
                    .join(submission("race@x.com", "founder"), &format!("192.0.2.{i}"))
                    .await
                    .0
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|&&s| s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|&&s| s == 409).count(), 7);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_recent_entries_block_client() {
    let store = sqlite_store().await;
    seed(&store, "203.0.113.44", 3, Duration::minutes(10)).await;
    let server = start_server(WaitlistConfig::default(), Arc::new(store.clone())).await;

    let (status, body) = server.join(submission("new@x.com", "student"), "203.0.113.44").await;
    assert_eq!(status, 429);
    assert_eq!(body["message"], "Too many requests");
    assert!(store.get("new@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_entries_release_client() {
    let store = sqlite_store().await;
    seed(&store, "203.0.113.45", 3, Duration::minutes(61)).await;
    let server = start_server(WaitlistConfig::default(), Arc::new(store.clone())).await;

    let (status, _) = server.join(submission("later@x.com", "student"), "203.0.113.45").await;
    assert_eq!(status, 201);

    let entry = store.get("later@x.com").await.unwrap().unwrap();
    assert_eq!(entry.ip_hash, hash_ip("203.0.113.45"));
    assert_eq!(entry.role, Role::Student);
}

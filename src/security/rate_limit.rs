//! Per-client submission rate limiting.
//!
//! Counts are derived from the store on every call, never from in-process
//! counters, so the limit holds across any number of service instances.
//! Only admitted (persisted) submissions consume quota.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Duration, Utc};

use crate::config::RateLimitConfig;
use crate::storage::{StoreError, WaitlistStore};

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { recent: u64 },
    Limited { recent: u64, limit: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Trailing-window limiter keyed by hashed client address.
pub struct SubmissionRateLimiter {
    store: Arc<dyn WaitlistStore>,
    policy: Arc<ArcSwap<RateLimitConfig>>,
}

impl SubmissionRateLimiter {
    pub fn new(store: Arc<dyn WaitlistStore>, config: RateLimitConfig) -> Self {
        Self {
            store,
            policy: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Replace the live policy. Subsequent checks use it immediately.
    pub fn update_policy(&self, config: RateLimitConfig) {
        let current = self.policy.load();
        if **current != config {
            tracing::info!(
                enabled = config.enabled,
                max_submissions = config.max_submissions,
                window_secs = config.window_secs,
                "Rate limit policy updated"
            );
            self.policy.store(Arc::new(config));
        }
    }

    pub fn policy(&self) -> Arc<RateLimitConfig> {
        self.policy.load_full()
    }

    /// Decide whether `ip_hash` may submit at `now`.
    ///
    /// Entries created at or after `now - window` count; the check denies once
    /// that count reaches the limit.
    pub async fn check(&self, ip_hash: &str, now: DateTime<Utc>) -> Result<RateDecision, StoreError> {
        let policy = self.policy.load_full();
        if !policy.enabled {
            return Ok(RateDecision::Allowed { recent: 0 });
        }

        let cutoff = window_start(now, policy.window_secs);
        let recent = self.store.count_since(ip_hash, cutoff).await?;

        if recent >= policy.max_submissions {
            tracing::warn!(
                ip_hash = %ip_hash,
                recent,
                limit = policy.max_submissions,
                "Submission rate limit exceeded"
            );
            Ok(RateDecision::Limited {
                recent,
                limit: policy.max_submissions,
            })
        } else {
            Ok(RateDecision::Allowed { recent })
        }
    }
}

/// Inclusive lower bound of the window ending at `now`.
fn window_start(now: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    i64::try_from(window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

//! Submission orchestration.
//!
//! # Flow
//! ```text
//! SubmissionInput
//!     → validate + normalize        (Invalid)
//!     → resolve client IP, hash it
//!     → rate-limit check             (RateLimited, nothing persisted)
//!     → insert                       (AlreadyRegistered | Joined)
//!     → any store failure or timeout (Failed, logged, never exposed)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::{hash_ip, resolve_client_ip, HeaderSource, RateDecision, SubmissionRateLimiter};
use crate::storage::{InsertOutcome, StoreError, WaitlistStore};
use crate::waitlist::schema::{validate, Violation};
use crate::waitlist::types::{ActionResult, NewEntry, SubmissionInput, WaitlistEntry};

pub const JOINED_MESSAGE: &str = "You're on the list! We'll be in touch soon.";
pub const VALIDATION_MESSAGE: &str = "Validation error";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests";
pub const RATE_LIMITED_ERROR: &str = "You have submitted too many requests. Please try again later.";
pub const DUPLICATE_MESSAGE: &str = "You're already on the list!";
pub const DUPLICATE_ERROR: &str = "This email is already registered. We'll keep you updated!";
pub const FAILED_MESSAGE: &str = "Something went wrong";
pub const FAILED_ERROR: &str = "An unexpected error occurred. Please try again later.";

/// Why a submission was not admitted.
#[derive(Debug, Error)]
enum SubmissionError {
    #[error("validation failed")]
    Validation(Vec<Violation>),

    #[error("rate limit exceeded ({recent}/{limit})")]
    RateLimited { recent: u64, limit: u64 },

    #[error("email already registered")]
    AlreadyRegistered,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
}

/// Terminal state of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Joined(WaitlistEntry),
    /// Violations in evaluation order; never empty.
    Invalid(Vec<Violation>),
    RateLimited,
    AlreadyRegistered,
    /// Internal failure. Details were logged, not returned.
    Failed,
}

impl SubmissionOutcome {
    /// Stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Joined(_) => "joined",
            SubmissionOutcome::Invalid(_) => "invalid",
            SubmissionOutcome::RateLimited => "rate_limited",
            SubmissionOutcome::AlreadyRegistered => "already_registered",
            SubmissionOutcome::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Joined(_))
    }

    /// The user-facing result.
    pub fn to_result(&self) -> ActionResult {
        match self {
            SubmissionOutcome::Joined(_) => ActionResult::ok(JOINED_MESSAGE),
            SubmissionOutcome::Invalid(violations) => ActionResult::failed(
                VALIDATION_MESSAGE,
                violations.first().map(|v| v.message).unwrap_or(VALIDATION_MESSAGE),
            ),
            SubmissionOutcome::RateLimited => {
                ActionResult::failed(RATE_LIMITED_MESSAGE, RATE_LIMITED_ERROR)
            }
            SubmissionOutcome::AlreadyRegistered => {
                ActionResult::failed(DUPLICATE_MESSAGE, DUPLICATE_ERROR)
            }
            SubmissionOutcome::Failed => ActionResult::failed(FAILED_MESSAGE, FAILED_ERROR),
        }
    }
}

impl From<&SubmissionOutcome> for ActionResult {
    fn from(outcome: &SubmissionOutcome) -> Self {
        outcome.to_result()
    }
}

/// Admits visitors onto the waitlist.
pub struct WaitlistService {
    store: Arc<dyn WaitlistStore>,
    limiter: SubmissionRateLimiter,
    deadline: Option<Duration>,
}

impl WaitlistService {
    pub fn new(store: Arc<dyn WaitlistStore>, rate_limit: RateLimitConfig) -> Self {
        let limiter = SubmissionRateLimiter::new(store.clone(), rate_limit);
        Self {
            store,
            limiter,
            deadline: None,
        }
    }

    /// Bound the store work of each submission. A submission still pending
    /// at the deadline is abandoned and reported as `Failed`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn rate_limiter(&self) -> &SubmissionRateLimiter {
        &self.limiter
    }

    pub fn store(&self) -> &Arc<dyn WaitlistStore> {
        &self.store
    }

    /// Handle one submission using the current time.
    pub async fn submit<H>(&self, input: &SubmissionInput, headers: &H) -> SubmissionOutcome
    where
        H: HeaderSource + Sync + ?Sized,
    {
        self.submit_at(input, headers, Utc::now()).await
    }

    /// Handle one submission as if it arrived at `now`.
    ///
    /// This is the only place unclassified failures are caught.
    pub async fn submit_at<H>(
        &self,
        input: &SubmissionInput,
        headers: &H,
        now: DateTime<Utc>,
    ) -> SubmissionOutcome
    where
        H: HeaderSource + Sync + ?Sized,
    {
        let start = Instant::now();

        let admitted = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.admit(input, headers, now))
                .await
                .unwrap_or(Err(SubmissionError::Timeout(deadline))),
            None => self.admit(input, headers, now).await,
        };

        let outcome = match admitted {
            Ok(entry) => {
                tracing::info!(entry_id = %entry.id, role = %entry.role, ip_hash = %entry.ip_hash, "Waitlist entry created");
                SubmissionOutcome::Joined(entry)
            }
            Err(SubmissionError::Validation(violations)) => {
                tracing::debug!(violations = violations.len(), first = %violations[0], "Submission failed validation");
                SubmissionOutcome::Invalid(violations)
            }
            Err(SubmissionError::RateLimited { .. }) => {
                metrics::record_rate_limited();
                SubmissionOutcome::RateLimited
            }
            Err(SubmissionError::AlreadyRegistered) => {
                tracing::info!("Duplicate waitlist submission");
                SubmissionOutcome::AlreadyRegistered
            }
            Err(e @ (SubmissionError::Store(_) | SubmissionError::Timeout(_))) => {
                tracing::error!(error = %e, "Waitlist submission error");
                SubmissionOutcome::Failed
            }
        };

        metrics::record_submission(outcome.label(), start);
        outcome
    }

    async fn admit<H>(
        &self,
        input: &SubmissionInput,
        headers: &H,
        now: DateTime<Utc>,
    ) -> Result<WaitlistEntry, SubmissionError>
    where
        H: HeaderSource + Sync + ?Sized,
    {
        let submission = validate(input).map_err(SubmissionError::Validation)?;

        let ip_hash = hash_ip(&resolve_client_ip(headers));

        if let RateDecision::Limited { recent, limit } = self.limiter.check(&ip_hash, now).await? {
            return Err(SubmissionError::RateLimited { recent, limit });
        }

        match self
            .store
            .insert(NewEntry::from_submission(submission, ip_hash, now))
            .await?
        {
            InsertOutcome::Inserted(entry) => Ok(entry),
            InsertOutcome::Duplicate => Err(SubmissionError::AlreadyRegistered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use async_trait::async_trait;
    use chrono::Duration;

    use crate::storage::MemoryStore;
    use crate::waitlist::schema::CUSTOM_ROLE_REQUIRED;
    use crate::waitlist::types::Role;

    fn service() -> (WaitlistService, MemoryStore) {
        let store = MemoryStore::new();
        let service = WaitlistService::new(Arc::new(store.clone()), RateLimitConfig::default());
        (service, store)
    }

    fn from_ip(ip: &str) -> HashMap<String, String> {
        HashMap::from([("x-forwarded-for".to_string(), ip.to_string())])
    }

    #[tokio::test]
    async fn test_scenario_a_first_signup() {
        let (service, store) = service();
        let outcome = service
            .submit(&SubmissionInput::new("a@x.com", "developer"), &from_ip("203.0.113.1"))
            .await;

        assert_eq!(outcome.to_result(), ActionResult::ok(JOINED_MESSAGE));
        let stored = store.get("a@x.com").unwrap();
        assert_eq!(stored.role, Role::Developer);
        assert_eq!(stored.custom_role, None);
        assert_eq!(stored.ip_hash, hash_ip("203.0.113.1"));
    }

    #[tokio::test]
    async fn test_scenario_b_duplicate_email() {
        let (service, store) = service();
        let headers = from_ip("203.0.113.1");
        service.submit(&SubmissionInput::new("a@x.com", "developer"), &headers).await;

        let outcome = service
            .submit(&SubmissionInput::new("a@x.com", "founder"), &headers)
            .await;
        assert_eq!(outcome, SubmissionOutcome::AlreadyRegistered);
        assert_eq!(outcome.to_result(), ActionResult::failed(DUPLICATE_MESSAGE, DUPLICATE_ERROR));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a@x.com").unwrap().role, Role::Developer);
    }

    #[tokio::test]
    async fn test_scenario_c_short_custom_role() {
        let (service, store) = service();
        let input = SubmissionInput::new("b@x.com", "other").with_custom_role("x");
        let outcome = service.submit(&input, &from_ip("203.0.113.1")).await;

        assert_eq!(
            outcome.to_result(),
            ActionResult::failed(VALIDATION_MESSAGE, CUSTOM_ROLE_REQUIRED)
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_d_custom_role_stored() {
        let (service, store) = service();
        let input = SubmissionInput::new("c@x.com", "other").with_custom_role("Marketer");
        let outcome = service.submit(&input, &from_ip("203.0.113.1")).await;

        assert!(outcome.is_success());
        assert_eq!(store.get("c@x.com").unwrap().custom_role.as_deref(), Some("Marketer"));
    }

    #[tokio::test]
    async fn test_scenario_e_fourth_submission_limited() {
        let (service, store) = service();
        let headers = from_ip("198.51.100.9");

        for i in 0..3 {
            let input = SubmissionInput::new(format!("user{i}@x.com"), "student");
            assert!(service.submit(&input, &headers).await.is_success());
        }

        let outcome = service
            .submit(&SubmissionInput::new("user3@x.com", "student"), &headers)
            .await;
        assert_eq!(outcome, SubmissionOutcome::RateLimited);
        assert_eq!(
            outcome.to_result(),
            ActionResult::failed(RATE_LIMITED_MESSAGE, RATE_LIMITED_ERROR)
        );
        assert!(store.get("user3@x.com").is_none());
        assert_eq!(store.len(), 3);

        // A different client is unaffected.
        let other = service
            .submit(&SubmissionInput::new("user3@x.com", "student"), &from_ip("198.51.100.10"))
            .await;
        assert!(other.is_success());
    }

    #[tokio::test]
    async fn test_normalized_emails_collide() {
        let (service, store) = service();
        let first = service
            .submit(&SubmissionInput::new("  Foo@Bar.com ", "designer"), &from_ip("192.0.2.1"))
            .await;
        assert!(first.is_success());
        assert_eq!(store.get("foo@bar.com").unwrap().email, "foo@bar.com");

        let second = service
            .submit(&SubmissionInput::new("foo@bar.com", "designer"), &from_ip("192.0.2.2"))
            .await;
        assert_eq!(second, SubmissionOutcome::AlreadyRegistered);
    }

    #[tokio::test]
    async fn test_limited_client_denied_even_for_registered_email() {
        let (service, _store) = service();
        let headers = from_ip("192.0.2.50");
        for i in 0..3 {
            service
                .submit(&SubmissionInput::new(format!("u{i}@x.com"), "student"), &headers)
                .await;
        }

        // Already-registered email from a limited client is still denied by the limiter.
        let outcome = service.submit(&SubmissionInput::new("u0@x.com", "student"), &headers).await;
        assert_eq!(outcome, SubmissionOutcome::RateLimited);
    }

    #[tokio::test]
    async fn test_failures_do_not_consume_quota() {
        let (service, store) = service();
        let headers = from_ip("192.0.2.60");

        service.submit(&SubmissionInput::new("dup@x.com", "student"), &headers).await;
        for _ in 0..5 {
            let outcome = service.submit(&SubmissionInput::new("dup@x.com", "student"), &headers).await;
            assert_eq!(outcome, SubmissionOutcome::AlreadyRegistered);
            let outcome = service.submit(&SubmissionInput::new("bad", "student"), &headers).await;
            assert!(matches!(outcome, SubmissionOutcome::Invalid(_)));
        }

        assert!(service
            .submit(&SubmissionInput::new("second@x.com", "student"), &headers)
            .await
            .is_success());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_old_entries_release_quota() {
        let (service, _store) = service();
        let headers = from_ip("192.0.2.70");
        let then = Utc::now() - Duration::minutes(90);

        for i in 0..3 {
            let input = SubmissionInput::new(format!("early{i}@x.com"), "founder");
            assert!(service.submit_at(&input, &headers, then).await.is_success());
        }

        let outcome = service
            .submit(&SubmissionInput::new("late@x.com", "founder"), &headers)
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_missing_headers_share_unknown_bucket() {
        let (service, store) = service();
        let none: HashMap<String, String> = HashMap::new();
        service.submit(&SubmissionInput::new("n@x.com", "student"), &none).await;
        assert_eq!(store.get("n@x.com").unwrap().ip_hash, hash_ip("unknown"));
    }

    struct BrokenStore;

    #[async_trait]
    impl WaitlistStore for BrokenStore {
        async fn count_since(&self, _: &str, _: DateTime<Utc>) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn insert(&self, _: NewEntry) -> Result<InsertOutcome, StoreError> {
            Err(StoreError::Unavailable("connection refused to 10.1.2.3".into()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_generic() {
        let service = WaitlistService::new(Arc::new(BrokenStore), RateLimitConfig::default());
        let outcome = service
            .submit(&SubmissionInput::new("a@x.com", "student"), &from_ip("192.0.2.1"))
            .await;

        assert_eq!(outcome, SubmissionOutcome::Failed);
        let result = outcome.to_result();
        assert_eq!(result, ActionResult::failed(FAILED_MESSAGE, FAILED_ERROR));
        assert!(!result.error.unwrap().contains("10.1.2.3"));
    }

    struct StalledStore;

    #[async_trait]
    impl WaitlistStore for StalledStore {
        async fn count_since(&self, _: &str, _: DateTime<Utc>) -> Result<u64, StoreError> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(0)
        }

        async fn insert(&self, _: NewEntry) -> Result<InsertOutcome, StoreError> {
            Err(StoreError::Unavailable("unreachable".into()))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_store_fails_at_deadline() {
        let service = WaitlistService::new(Arc::new(StalledStore), RateLimitConfig::default())
            .with_deadline(std::time::Duration::from_millis(50));

        let started = Instant::now();
        let outcome = service
            .submit(&SubmissionInput::new("a@x.com", "student"), &from_ip("192.0.2.1"))
            .await;

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(outcome, SubmissionOutcome::Failed);
        assert_eq!(outcome.to_result(), ActionResult::failed(FAILED_MESSAGE, FAILED_ERROR));
    }

    #[tokio::test]
    async fn test_validation_short_circuits_store() {
        let service = WaitlistService::new(Arc::new(BrokenStore), RateLimitConfig::default());
        let outcome = service
            .submit(&SubmissionInput::new("a@x.com", "pilot"), &from_ip("192.0.2.1"))
            .await;
        assert!(matches!(outcome, SubmissionOutcome::Invalid(_)));
    }
}

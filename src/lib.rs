//! Waitlist signup service.
//!
//! A visitor submits an email address and a role. The submission is validated,
//! rate-limited per anonymized client address, deduplicated by email, and
//! persisted.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod storage;
pub mod waitlist;

pub use config::WaitlistConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use waitlist::{ActionResult, SubmissionInput, SubmissionOutcome, WaitlistService};

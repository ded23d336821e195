//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming submission:
//!     → client_ip.rs (resolve address from proxy headers)
//!     → ip_hash.rs (anonymize, raw address is dropped here)
//!     → rate_limit.rs (count recent admitted entries for the hash)
//!     → Pass to insert
//! ```
//!
//! # Design Decisions
//! - The raw client address never leaves this module
//! - Rate-limit state lives in the store, not in process memory
//! - Header lookup is injected so the core has no framework dependency

pub mod client_ip;
pub mod ip_hash;
pub mod rate_limit;

pub use client_ip::{resolve_client_ip, HeaderSource, UNKNOWN_CLIENT};
pub use ip_hash::hash_ip;
pub use rate_limit::{RateDecision, SubmissionRateLimiter};

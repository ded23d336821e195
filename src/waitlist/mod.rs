//! Waitlist domain: submission types, validation and admission.

pub mod email;
pub mod schema;
pub mod service;
pub mod types;

pub use schema::{validate, Field, Violation};
pub use service::{SubmissionOutcome, WaitlistService};
pub use types::{
    ActionResult, NewEntry, Role, RoleOption, SubmissionInput, ValidSubmission, WaitlistEntry,
};

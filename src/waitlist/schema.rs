//! Submission validation.
//!
//! Checks run in a fixed order and every violation is collected; callers show
//! the first one. The cross-field `customRole` rule runs after the per-field
//! checks.

use std::fmt;

use serde::Serialize;

use crate::waitlist::email::is_valid_email;
use crate::waitlist::types::{Role, SubmissionInput, ValidSubmission};

pub const MAX_EMAIL_CHARS: usize = 255;
pub const MAX_CUSTOM_ROLE_CHARS: usize = 100;
pub const MIN_CUSTOM_ROLE_CHARS: usize = 2;

pub const INVALID_EMAIL: &str = "Please enter a valid email address";
pub const EMAIL_TOO_LONG: &str = "Email must be at most 255 characters";
pub const INVALID_ROLE: &str = "Please select a valid role";
pub const CUSTOM_ROLE_TOO_LONG: &str = "Custom role must be at most 100 characters";
pub const CUSTOM_ROLE_REQUIRED: &str = "Please specify your role (minimum 2 characters)";

/// Input field a violation is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Email,
    Role,
    CustomRole,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Email => "email",
            Field::Role => "role",
            Field::CustomRole => "customRole",
        })
    }
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: Field,
    pub message: &'static str,
}

impl Violation {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate and normalize a raw submission.
///
/// On success the email is trimmed and lowercased, and `custom_role` is kept
/// (trimmed) only for `Role::Other`. On failure the violations are returned in
/// evaluation order; the list is never empty.
pub fn validate(input: &SubmissionInput) -> Result<ValidSubmission, Vec<Violation>> {
    let mut violations = Vec::new();

    let email = input.email.trim();
    if !is_valid_email(email) {
        violations.push(Violation::new(Field::Email, INVALID_EMAIL));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        violations.push(Violation::new(Field::Email, EMAIL_TOO_LONG));
    }

    let role = input.role.parse::<Role>().ok();
    if role.is_none() {
        violations.push(Violation::new(Field::Role, INVALID_ROLE));
    }

    let custom_role = input.custom_role.as_deref();
    if custom_role.is_some_and(|value| value.chars().count() > MAX_CUSTOM_ROLE_CHARS) {
        violations.push(Violation::new(Field::CustomRole, CUSTOM_ROLE_TOO_LONG));
    }

    if role == Some(Role::Other) {
        let specified = custom_role
            .map(|value| value.trim().chars().count() >= MIN_CUSTOM_ROLE_CHARS)
            .unwrap_or(false);
        if !specified {
            violations.push(Violation::new(Field::CustomRole, CUSTOM_ROLE_REQUIRED));
        }
    }

    match role {
        Some(role) if violations.is_empty() => Ok(ValidSubmission {
            email: email.to_lowercase(),
            role,
            custom_role: match role {
                Role::Other => custom_role.map(|value| value.trim().to_string()),
                _ => None,
            },
        }),
        _ => Err(violations),
    }
}

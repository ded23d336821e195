//! Waitlist domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the visitor describes themselves as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Developer,
    Founder,
    Designer,
    /// Free-form role, spelled out in `custom_role`.
    Other,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Student,
        Role::Developer,
        Role::Founder,
        Role::Designer,
        Role::Other,
    ];

    /// Wire and storage value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Developer => "developer",
            Role::Founder => "founder",
            Role::Designer => "designer",
            Role::Other => "other",
        }
    }

    /// Human-readable label for selection widgets.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Developer => "Developer",
            Role::Founder => "Founder",
            Role::Designer => "Designer",
            Role::Other => "Other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names none of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact, case-sensitive match on the wire value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// One option of the role dropdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleOption {
    pub value: Role,
    pub label: String,
}

impl From<Role> for RoleOption {
    fn from(role: Role) -> Self {
        Self {
            value: role,
            label: role.label().to_string(),
        }
    }
}

/// Raw submission as sent by the form. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub custom_role: Option<String>,
}

impl SubmissionInput {
    pub fn new(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: role.into(),
            custom_role: None,
        }
    }

    pub fn with_custom_role(mut self, custom_role: impl Into<String>) -> Self {
        self.custom_role = Some(custom_role.into());
        self
    }
}

/// A submission that passed validation, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    /// Trimmed and lowercased.
    pub email: String,
    pub role: Role,
    /// Present only for `Role::Other`, trimmed.
    pub custom_role: Option<String>,
}

/// Everything the store needs to create an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub email: String,
    pub role: Role,
    pub custom_role: Option<String>,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewEntry {
    pub fn from_submission(
        submission: ValidSubmission,
        ip_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email: submission.email,
            role: submission.role,
            custom_role: submission.custom_role,
            ip_hash,
            created_at,
        }
    }
}

/// A persisted waitlist entry. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub custom_role: Option<String>,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn new(entry: NewEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: entry.email,
            role: entry.role,
            custom_role: entry.custom_role,
            ip_hash: entry.ip_hash,
            created_at: entry.created_at,
        }
    }
}

/// The result shape handed back to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!("founder".parse::<Role>(), Ok(Role::Founder));
        assert!("Founder".parse::<Role>().is_err());
        assert!(" other".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_input_accepts_camel_case_and_missing_fields() {
        let input: SubmissionInput =
            serde_json::from_str(r#"{"role":"other","customRole":"Marketer"}"#).unwrap();
        assert_eq!(input.email, "");
        assert_eq!(input.role, "other");
        assert_eq!(input.custom_role.as_deref(), Some("Marketer"));
    }

    #[test]
    fn test_action_result_omits_absent_error() {
        let json = serde_json::to_value(ActionResult::ok("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));

        let json = serde_json::to_value(ActionResult::failed("nope", "why")).unwrap();
        assert_eq!(json["error"], "why");
    }
}

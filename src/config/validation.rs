//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, limits > 0)
//! - Validate socket addresses and storage URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WaitlistConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{StorageBackend, WaitlistConfig};
use crate::observability::logging::filter_directives;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending key (e.g. "rate_limit.window_secs").
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &WaitlistConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_submissions == 0 {
            errors.push(ValidationError::new(
                "rate_limit.max_submissions",
                "must be greater than zero when rate limiting is enabled",
            ));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.window_secs",
                "must be greater than zero when rate limiting is enabled",
            ));
        }
    }

    if config.storage.backend == StorageBackend::Sqlite {
        if !config.storage.database_url.starts_with("sqlite:") {
            errors.push(ValidationError::new(
                "storage.database_url",
                "must be a sqlite: connection string",
            ));
        }
        if config.storage.max_connections == 0 {
            errors.push(ValidationError::new("storage.max_connections", "must be greater than zero"));
        }
    }

    if EnvFilter::try_new(filter_directives(&config.observability.log_level)).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not a valid filter directive", config.observability.log_level),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WaitlistConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = WaitlistConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limit.max_submissions = 0;
        config.rate_limit.window_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "rate_limit.max_submissions", "rate_limit.window_secs"]
        );
    }

    #[test]
    fn test_log_level_accepts_level_or_directives() {
        let mut config = WaitlistConfig::default();
        config.observability.log_level = "info,sqlx=warn".into();
        assert!(validate_config(&config).is_ok());

        config.observability.log_level = "waitlist_service=loud".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.log_level");
    }

    #[test]
    fn test_disabled_rate_limit_skips_range_checks() {
        let mut config = WaitlistConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_submissions = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_sqlite_url_checked_only_for_sqlite_backend() {
        let mut config = WaitlistConfig::default();
        config.storage.database_url = "postgres://localhost/db".into();
        assert!(validate_config(&config).is_ok());

        config.storage.backend = StorageBackend::Sqlite;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "storage.database_url");
    }
}

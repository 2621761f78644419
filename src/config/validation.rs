//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject an empty backend list and malformed backend URLs
//! - Validate value ranges (intervals and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("invalid backend url '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("backend url '{url}' uses unsupported scheme '{scheme}' (only http is supported)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("duplicate backend url '{0}'")]
    DuplicateBackend(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Parse a backend URL, rejecting anything the forwarder cannot reach.
pub fn parse_backend_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    if url.host_str().is_none() {
        return Err(ValidationError::InvalidBackendUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Render a list of errors on one line.
pub fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen: Vec<Url> = Vec::with_capacity(config.backends.len());
    for backend in &config.backends {
        match parse_backend_url(&backend.url) {
            Ok(url) => {
                if seen.contains(&url) {
                    errors.push(ValidationError::DuplicateBackend(backend.url.clone()));
                } else {
                    seen.push(url);
                }
            }
            Err(e) => errors.push(e),
        }
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::Zero { field: "health_check.interval_secs" });
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::Zero { field: "health_check.timeout_secs" });
        }
    }

    if config.failover.max_attempts == Some(0) {
        errors.push(ValidationError::Zero { field: "failover.max_attempts" });
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
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
    fn test_valid_config() {
        let config = ProxyConfig::with_servers("http://127.0.0.1:5001,http://127.0.0.1:5002");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_backends_rejected() {
        let config = ProxyConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoBackends]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::with_servers("not a url,https://secure:443,http://ok:1,http://ok:1");
        config.health_check.interval_secs = 0;
        config.failover.max_attempts = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ValidationError::InvalidBackendUrl { .. }));
        assert!(matches!(errors[1], ValidationError::UnsupportedScheme { .. }));
        assert_eq!(errors[2], ValidationError::DuplicateBackend("http://ok:1".into()));
        assert_eq!(errors[3], ValidationError::Zero { field: "health_check.interval_secs" });
        assert_eq!(errors[4], ValidationError::Zero { field: "failover.max_attempts" });
    }

    #[test]
    fn test_disabled_health_check_skips_interval_check() {
        let mut config = ProxyConfig::with_servers("http://127.0.0.1:5001");
        config.health_check.enabled = false;
        config.health_check.interval_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}

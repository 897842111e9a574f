//! Error taxonomy for release validation

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reasons a release fails validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0} must be defined")]
    MissingAttribute(&'static str),

    #[error("CreatedAt {created_at} is older than 5 mins (or in the future), checked at {checked_at}")]
    StaleRelease {
        created_at: DateTime<Utc>,
        checked_at: DateTime<Utc>,
    },

    #[error("Error getting {key}: {source}")]
    StorageRead {
        key: String,
        #[source]
        source: odin_common::Error,
    },

    #[error("Error writing {key}: {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: odin_common::Error,
    },

    #[error("Release SHA incorrect, stored release hashes to {stored}, expected {sealed}")]
    TamperedRelease { stored: String, sealed: String },

    #[error("UserData SHA incorrect, payload hashes to {actual}, declared {declared}")]
    TamperedPayload { actual: String, declared: String },

    #[error("Services nil or empty")]
    NoServices,

    #[error("Service {0} is nil")]
    NilService(String),

    #[error("LifeCycleHook {0} is nil")]
    NilLifecycleHook(String),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error("Failed to serialize release: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation failure raised by a nested lifecycle hook or service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("{kind}({name}) {field} must be defined")]
    MissingField {
        kind: &'static str,
        name: String,
        field: &'static str,
    },

    #[error("{kind}({name}) {field} invalid: {reason}")]
    InvalidField {
        kind: &'static str,
        name: String,
        field: &'static str,
        reason: String,
    },
}

/// Outcome annotation attempted after the release reached a terminal state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutcomeError {
    #[error("release already finished with success={0}")]
    AlreadyTerminal(bool),
}

/// A validation failure carrying the release-identifying prefix
#[derive(Error, Debug)]
#[error("{prefix} {reason}")]
pub struct Rejected {
    pub prefix: String,
    #[source]
    pub reason: ValidationError,
}

impl Rejected {
    pub fn new(release_id: Option<&str>, reason: ValidationError) -> Self {
        let prefix = match release_id {
            Some(id) if !id.is_empty() => format!("Release({}) Error:", id),
            _ => "Release Error:".to_string(),
        };
        Self { prefix, reason }
    }

    pub fn reason(&self) -> &ValidationError {
        &self.reason
    }
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_with_release_id() {
        let err = Rejected::new(Some("r-42"), ValidationError::MissingAttribute("Bucket"));
        assert_eq!(err.to_string(), "Release(r-42) Error: Bucket must be defined");
    }

    #[test]
    fn test_generic_prefix_without_release_id() {
        let err = Rejected::new(None, ValidationError::NoServices);
        assert_eq!(err.to_string(), "Release Error: Services nil or empty");

        let err = Rejected::new(Some(""), ValidationError::NoServices);
        assert!(err.to_string().starts_with("Release Error:"));
    }

    #[test]
    fn test_component_error_is_transparent() {
        let inner = ComponentError::MissingField {
            kind: "Service",
            name: "web".to_string(),
            field: "InstanceType",
        };
        let err = ValidationError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}

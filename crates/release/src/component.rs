//! Shared resolve/validate capability for the entities nested inside a release

use crate::error::ComponentError;

/// Release-level values a nested component resolves its defaults against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseContext {
    pub aws_region: Option<String>,
    pub aws_account_id: Option<String>,
    pub project_name: Option<String>,
    pub config_name: Option<String>,
    pub release_id: Option<String>,
}

/// A named entity owned by a release (lifecycle hook or service)
///
/// Resolution must be idempotent: resolving an already resolved component with
/// the same context and name yields an identical component.
pub trait Component: Sized {
    /// Human readable kind used in error messages
    const KIND: &'static str;

    /// Fill defaults relative to the owning release
    fn resolve(self, ctx: &ReleaseContext, name: &str) -> Self;

    /// Check the component is complete and consistent
    fn validate(&self) -> Result<(), ComponentError>;
}

pub(crate) fn missing(kind: &'static str, name: Option<&str>, field: &'static str) -> ComponentError {
    ComponentError::MissingField {
        kind,
        name: name.unwrap_or_default().to_string(),
        field,
    }
}

pub(crate) fn invalid(
    kind: &'static str,
    name: Option<&str>,
    field: &'static str,
    reason: impl Into<String>,
) -> ComponentError {
    ComponentError::InvalidField {
        kind,
        name: name.unwrap_or_default().to_string(),
        field,
        reason: reason.into(),
    }
}

pub(crate) fn is_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

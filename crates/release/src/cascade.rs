//! Validation of the services and lifecycle hooks nested in a release
//!
//! Entries are visited in sorted key order and the first failure wins, so the
//! reported error is reproducible when several entries are invalid.

use std::collections::BTreeMap;

use crate::component::Component;
use crate::error::{Result, ValidationError};
use crate::models::Release;

fn validate_entries<C: Component>(
    entries: &BTreeMap<String, Option<C>>,
    nil: fn(String) -> ValidationError,
) -> Result<()> {
    for (name, entry) in entries {
        let component = entry.as_ref().ok_or_else(|| nil(name.clone()))?;
        component.validate()?;
    }
    Ok(())
}

impl Release {
    /// Validate every service, then every lifecycle hook
    ///
    /// Hook failures surface from this step too: a null hook is reported as
    /// [`ValidationError::NilLifecycleHook`] and a malformed one as
    /// [`ValidationError::Component`], after all services have passed.
    pub fn validate_services(&self) -> Result<()> {
        let services = match &self.services {
            Some(services) if !services.is_empty() => services,
            _ => return Err(ValidationError::NoServices),
        };

        validate_entries(services, ValidationError::NilService)?;

        if let Some(hooks) = &self.lifecycle_hooks {
            validate_entries(hooks, ValidationError::NilLifecycleHook)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::hook::{LifecycleHook, LifecycleHookSpec};
    use crate::service::{Service, ServiceSpec};

    fn service(instance_type: Option<&str>) -> Option<Service> {
        Some(Service::new(ServiceSpec {
            instance_type: instance_type.map(str::to_string),
            ..Default::default()
        }))
    }

    fn release(services: Vec<(&str, Option<Service>)>) -> Release {
        Release {
            release_id: Some("r-1".to_string()),
            services: Some(
                services
                    .into_iter()
                    .map(|(name, svc)| (name.to_string(), svc))
                    .collect(),
            ),
            ..Default::default()
        }
        .with_defaults()
    }

    #[test]
    fn test_no_services() {
        let release = Release::default();
        assert!(matches!(
            release.validate_services(),
            Err(ValidationError::NoServices)
        ));

        let release = self::release(vec![]);
        assert!(matches!(
            release.validate_services(),
            Err(ValidationError::NoServices)
        ));
    }

    #[test]
    fn test_nil_service_is_named() {
        let release = release(vec![("api", service(Some("m5.large"))), ("web", None)]);
        match release.validate_services() {
            Err(ValidationError::NilService(name)) => assert_eq!(name, "web"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_service_error_bubbles_unchanged() {
        let release = release(vec![("web", service(None))]);
        match release.validate_services() {
            Err(ValidationError::Component(ComponentError::MissingField { name, field, .. })) => {
                assert_eq!(name, "web");
                assert_eq!(field, "InstanceType");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_first_invalid_service_in_key_order() {
        let release = release(vec![
            ("zeta", service(None)),
            ("alpha", service(None)),
            ("mid", service(Some("m5.large"))),
        ]);
        match release.validate_services() {
            Err(ValidationError::Component(ComponentError::MissingField { name, .. })) => {
                assert_eq!(name, "alpha")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_valid_services_pass() {
        let release = release(vec![("web", service(Some("c5.large")))]);
        assert!(release.validate_services().is_ok());
    }

    #[test]
    fn test_hooks_are_validated_after_services() {
        let mut release = release(vec![("web", service(Some("c5.large")))]);
        let mut hooks = BTreeMap::new();
        hooks.insert("drain".to_string(), None::<LifecycleHook>);
        release.lifecycle_hooks = Some(hooks);
        assert!(matches!(
            release.validate_services(),
            Err(ValidationError::NilLifecycleHook(name)) if name == "drain"
        ));

        let mut hooks = BTreeMap::new();
        hooks.insert(
            "drain".to_string(),
            Some(LifecycleHook::new(LifecycleHookSpec::default())),
        );
        release.lifecycle_hooks = Some(hooks);
        let release = release.with_defaults();
        assert!(matches!(
            release.validate_services(),
            Err(ValidationError::Component(ComponentError::MissingField {
                field: "Transition",
                ..
            }))
        ));
    }
}

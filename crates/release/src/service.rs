//! Per-service definitions carried by a release

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::component::{invalid, is_empty, missing, Component, ReleaseContext};
use crate::error::ComponentError;

pub const DEFAULT_EBS_VOLUME_TYPE: &str = "gp2";
pub const DEFAULT_EBS_VOLUME_SIZE: i64 = 20;
pub const DEFAULT_EBS_DEVICE_NAME: &str = "/dev/xvda";
pub const DEFAULT_SPREAD: f64 = 0.2;

const EBS_VOLUME_TYPES: &[&str] = &["gp2", "gp3", "io1", "io2", "st1", "sc1", "standard"];

/// Tags the deployer writes itself; services may not override them
const RESERVED_TAGS: &[&str] = &["ProjectName", "ConfigName", "ServiceName", "ReleaseID"];

/// Auto Scaling group sizing for a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoscalingSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,

    /// Maximum instances terminated at once during a rollout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_terminations: Option<i64>,

    /// Fraction of extra capacity launched above the desired count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
}

/// Persisted form of a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub elbs: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_groups: Option<Vec<String>>,

    /// IAM instance profile name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingSpec>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_volume_size: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_volume_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebs_device_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// A service as held by a release, with the release context it was resolved
/// against and the payload propagated from the release
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub spec: ServiceSpec,
    name: Option<String>,
    context: ReleaseContext,
    payload: Option<Vec<u8>>,
}

impl Service {
    pub fn new(spec: ServiceSpec) -> Self {
        Self {
            spec,
            ..Default::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn context(&self) -> &ReleaseContext {
        &self.context
    }

    /// `{project}-{config}-{service}`, used for naming the scaling group
    pub fn full_name(&self) -> Option<String> {
        Some(format!(
            "{}-{}-{}",
            self.context.project_name.as_deref()?,
            self.context.config_name.as_deref()?,
            self.name()?
        ))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn set_payload(&mut self, payload: Option<Vec<u8>>) {
        self.payload = payload;
    }
}

impl From<ServiceSpec> for Service {
    fn from(spec: ServiceSpec) -> Self {
        Self::new(spec)
    }
}

impl Component for Service {
    const KIND: &'static str = "Service";

    fn resolve(mut self, ctx: &ReleaseContext, name: &str) -> Self {
        self.name = Some(name.to_string());
        self.context = ctx.clone();

        let asg = self.spec.autoscaling.get_or_insert_with(Default::default);
        let min_size = *asg.min_size.get_or_insert(1);
        asg.max_size.get_or_insert(min_size.max(1));
        asg.max_terminations.get_or_insert(0);
        asg.spread.get_or_insert(DEFAULT_SPREAD);

        let ebs_unset = self.spec.ebs_volume_size.is_none()
            && self.spec.ebs_volume_type.is_none()
            && self.spec.ebs_device_name.is_none();
        if ebs_unset {
            self.spec.ebs_volume_size = Some(DEFAULT_EBS_VOLUME_SIZE);
            self.spec.ebs_volume_type = Some(DEFAULT_EBS_VOLUME_TYPE.to_string());
            self.spec.ebs_device_name = Some(DEFAULT_EBS_DEVICE_NAME.to_string());
        }

        self
    }

    fn validate(&self) -> Result<(), ComponentError> {
        let name = self.name();

        match name {
            None | Some("") => return Err(missing(Self::KIND, name, "ServiceName")),
            Some(n) if !n.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "ServiceName",
                    "must only contain [a-zA-Z0-9-]",
                ))
            }
            Some(_) => {}
        }

        if is_empty(&self.spec.instance_type) {
            return Err(missing(Self::KIND, name, "InstanceType"));
        }

        if let Some(asg) = &self.spec.autoscaling {
            if let (Some(min), Some(max)) = (asg.min_size, asg.max_size) {
                if min < 0 || min > max {
                    return Err(invalid(
                        Self::KIND,
                        name,
                        "Autoscaling",
                        format!("min_size {} must be between 0 and max_size {}", min, max),
                    ));
                }
            }
            if let Some(spread) = asg.spread {
                if !(0.0..=1.0).contains(&spread) {
                    return Err(invalid(
                        Self::KIND,
                        name,
                        "Autoscaling",
                        format!("spread {} must be between 0 and 1", spread),
                    ));
                }
            }
            if asg.max_terminations.is_some_and(|t| t < 0) {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "Autoscaling",
                    "max_terminations must not be negative",
                ));
            }
        }

        if let Some(size) = self.spec.ebs_volume_size {
            if size <= 0 {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "EBSVolumeSize",
                    format!("{} must be greater than 0", size),
                ));
            }
        }

        if let Some(kind) = self.spec.ebs_volume_type.as_deref() {
            if !EBS_VOLUME_TYPES.contains(&kind) {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "EBSVolumeType",
                    format!("unknown volume type {}", kind),
                ));
            }
        }

        if let Some(tags) = &self.spec.tags {
            if let Some(reserved) = tags.keys().find(|k| RESERVED_TAGS.contains(&k.as_str())) {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "Tags",
                    format!("{} is reserved", reserved),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ReleaseContext {
        ReleaseContext {
            aws_region: Some("us-east-1".to_string()),
            aws_account_id: Some("000000000001".to_string()),
            project_name: Some("checkout".to_string()),
            config_name: Some("prod".to_string()),
            release_id: Some("r-1".to_string()),
        }
    }

    fn web() -> Service {
        Service::new(ServiceSpec {
            instance_type: Some("c5.large".to_string()),
            security_groups: Some(vec!["web-sg".to_string()]),
            ..Default::default()
        })
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let service = web().resolve(&context(), "web");

        assert_eq!(service.name(), Some("web"));
        assert_eq!(service.full_name().as_deref(), Some("checkout-prod-web"));

        let asg = service.spec.autoscaling.as_ref().unwrap();
        assert_eq!(asg.min_size, Some(1));
        assert_eq!(asg.max_size, Some(1));
        assert_eq!(asg.max_terminations, Some(0));
        assert_eq!(asg.spread, Some(DEFAULT_SPREAD));

        assert_eq!(service.spec.ebs_volume_size, Some(DEFAULT_EBS_VOLUME_SIZE));
        assert_eq!(service.spec.ebs_volume_type.as_deref(), Some("gp2"));
        assert!(service.validate().is_ok());
    }

    #[test]
    fn test_resolve_keeps_partial_ebs_settings() {
        let mut service = web();
        service.spec.ebs_volume_size = Some(100);
        let service = service.resolve(&context(), "web");

        assert_eq!(service.spec.ebs_volume_size, Some(100));
        assert_eq!(service.spec.ebs_volume_type, None);
    }

    #[test]
    fn test_max_size_follows_min_size() {
        let mut service = web();
        service.spec.autoscaling = Some(AutoscalingSpec {
            min_size: Some(3),
            ..Default::default()
        });
        let service = service.resolve(&context(), "web");
        assert_eq!(service.spec.autoscaling.unwrap().max_size, Some(3));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let once = web().resolve(&context(), "web");
        let twice = once.clone().resolve(&context(), "web");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_requires_instance_type() {
        let service = Service::new(ServiceSpec::default()).resolve(&context(), "web");
        assert_eq!(
            service.validate().unwrap_err(),
            ComponentError::MissingField {
                kind: "Service",
                name: "web".to_string(),
                field: "InstanceType",
            }
        );
    }

    #[test]
    fn test_validate_rejects_bad_name() {
        let service = web().resolve(&context(), "web_worker");
        assert!(matches!(
            service.validate().unwrap_err(),
            ComponentError::InvalidField { field: "ServiceName", .. }
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_sizes() {
        let mut service = web();
        service.spec.autoscaling = Some(AutoscalingSpec {
            min_size: Some(5),
            max_size: Some(2),
            ..Default::default()
        });
        let service = service.resolve(&context(), "web");
        assert!(matches!(
            service.validate().unwrap_err(),
            ComponentError::InvalidField { field: "Autoscaling", .. }
        ));
    }

    #[test]
    fn test_validate_rejects_reserved_tag() {
        let mut service = web();
        let mut tags = BTreeMap::new();
        tags.insert("ReleaseID".to_string(), "spoofed".to_string());
        service.spec.tags = Some(tags);
        let service = service.resolve(&context(), "web");
        assert!(matches!(
            service.validate().unwrap_err(),
            ComponentError::InvalidField { field: "Tags", .. }
        ));
    }

    #[test]
    fn test_unresolved_service_fails_validation() {
        assert!(matches!(
            web().validate().unwrap_err(),
            ComponentError::MissingField { field: "ServiceName", .. }
        ));
    }
}

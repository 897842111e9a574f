//! Auto Scaling lifecycle hooks attached to a release

use serde::{Deserialize, Serialize};

use crate::component::{invalid, is_empty, missing, Component, ReleaseContext};
use crate::error::ComponentError;

pub const TRANSITION_LAUNCHING: &str = "autoscaling:EC2_INSTANCE_LAUNCHING";
pub const TRANSITION_TERMINATING: &str = "autoscaling:EC2_INSTANCE_TERMINATING";

/// Default heartbeat timeout in seconds
pub const DEFAULT_HEARTBEAT_TIMEOUT: i64 = 300;

const MIN_HEARTBEAT_TIMEOUT: i64 = 30;
const MAX_HEARTBEAT_TIMEOUT: i64 = 7200;

/// Persisted form of a lifecycle hook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleHookSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,

    /// SNS topic name, expanded into `notification_target_arn`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sns: Option<String>,

    /// IAM role name, expanded into `role_arn`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_target_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_timeout: Option<i64>,
}

/// A lifecycle hook as held by a release
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleHook {
    pub spec: LifecycleHookSpec,
    name: Option<String>,
}

impl LifecycleHook {
    pub fn new(spec: LifecycleHookSpec) -> Self {
        Self { spec, name: None }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<LifecycleHookSpec> for LifecycleHook {
    fn from(spec: LifecycleHookSpec) -> Self {
        Self::new(spec)
    }
}

impl Component for LifecycleHook {
    const KIND: &'static str = "LifeCycleHook";

    fn resolve(mut self, ctx: &ReleaseContext, name: &str) -> Self {
        self.name = Some(name.to_string());

        let region = ctx.aws_region.as_deref().unwrap_or_default();
        let account = ctx.aws_account_id.as_deref().unwrap_or_default();

        if self.spec.notification_target_arn.is_none() {
            if let Some(sns) = &self.spec.sns {
                self.spec.notification_target_arn =
                    Some(format!("arn:aws:sns:{}:{}:{}", region, account, sns));
            }
        }

        if self.spec.role_arn.is_none() {
            if let Some(role) = &self.spec.role {
                self.spec.role_arn = Some(format!("arn:aws:iam::{}:role/{}", account, role));
            }
        }

        if self.spec.heartbeat_timeout.is_none() {
            self.spec.heartbeat_timeout = Some(DEFAULT_HEARTBEAT_TIMEOUT);
        }

        self
    }

    fn validate(&self) -> Result<(), ComponentError> {
        let name = self.name();

        if is_empty(&self.name) {
            return Err(missing(Self::KIND, name, "Name"));
        }

        match self.spec.transition.as_deref() {
            None | Some("") => return Err(missing(Self::KIND, name, "Transition")),
            Some(TRANSITION_LAUNCHING) | Some(TRANSITION_TERMINATING) => {}
            Some(other) => {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "Transition",
                    format!("unknown transition {}", other),
                ))
            }
        }

        if is_empty(&self.spec.notification_target_arn) {
            return Err(missing(Self::KIND, name, "NotificationTargetARN"));
        }

        if is_empty(&self.spec.role_arn) {
            return Err(missing(Self::KIND, name, "RoleARN"));
        }

        match self.spec.heartbeat_timeout {
            None => return Err(missing(Self::KIND, name, "HeartbeatTimeout")),
            Some(t) if !(MIN_HEARTBEAT_TIMEOUT..=MAX_HEARTBEAT_TIMEOUT).contains(&t) => {
                return Err(invalid(
                    Self::KIND,
                    name,
                    "HeartbeatTimeout",
                    format!(
                        "{} outside {}..={}",
                        t, MIN_HEARTBEAT_TIMEOUT, MAX_HEARTBEAT_TIMEOUT
                    ),
                ))
            }
            Some(_) => {}
        }

        Ok(())
    }
}

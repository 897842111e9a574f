//! Default resolution applied before validation
//!
//! Every resolver consumes the release and returns the resolved copy, and each
//! one is idempotent.

use tracing::debug;

use crate::component::{is_empty, Component};
use crate::error::Result;
use crate::models::Release;
use crate::storage::ObjectStore;

/// Deployment timeout in seconds when the client sets none
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default alias to the default S3 KMS key
pub const DEFAULT_KMS_KEY: &str = "alias/aws/s3";

pub const BUCKET_PREFIX: &str = "coinbase-odin-";

impl Release {
    /// Fill account and region from the deployer's environment when unset, and
    /// derive the bucket from the account id
    pub fn with_region_account(mut self, region: Option<&str>, account: Option<&str>) -> Self {
        if is_empty(&self.aws_account_id) {
            if let Some(account) = account {
                self.aws_account_id = Some(account.to_string());
            }
        }

        if is_empty(&self.aws_region) {
            if let Some(region) = region {
                self.aws_region = Some(region.to_string());
            }
        }

        if is_empty(&self.bucket) && !is_empty(&self.aws_account_id) {
            self.bucket = self
                .aws_account_id
                .as_deref()
                .map(|account| format!("{}{}", BUCKET_PREFIX, account));
        }

        self
    }

    /// Assign default values and resolve nested hooks and services
    pub fn with_defaults(mut self) -> Self {
        self.timeout.get_or_insert(DEFAULT_TIMEOUT_SECS);
        self.healthy.get_or_insert(false);
        self.user_data_kms_key.get_or_insert_with(|| DEFAULT_KMS_KEY.to_string());

        let ctx = self.context();

        if let Some(hooks) = self.lifecycle_hooks.as_mut() {
            for (name, slot) in hooks.iter_mut() {
                if let Some(hook) = slot.take() {
                    *slot = Some(hook.resolve(&ctx, name));
                }
            }
        }

        if let Some(services) = self.services.as_mut() {
            for (name, slot) in services.iter_mut() {
                if let Some(service) = slot.take() {
                    *slot = Some(service.resolve(&ctx, name));
                }
            }
        }

        self
    }

    /// [`Release::with_defaults`] followed by a payload download, handing the
    /// payload to every service
    pub fn with_defaults_and_payload<S: ObjectStore + ?Sized>(self, store: &S) -> Result<Self> {
        let mut release = self.with_defaults();
        let payload = release.fetch_payload(store)?.to_vec();

        if let Some(services) = release.services.as_mut() {
            for service in services.values_mut().flatten() {
                service.set_payload(Some(payload.clone()));
            }
        }

        debug!(
            "Resolved defaults for release {}",
            release.release_id.as_deref().unwrap_or("<unknown>")
        );
        Ok(release)
    }
}

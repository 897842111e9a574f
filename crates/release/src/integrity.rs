//! Release validation run by the deployer before acting on a release
//!
//! Checks, in order, stopping at the first failure:
//! 1. attributes: identity fields present, `created_at` inside the freshness window
//! 2. release digest: the stored definition hashes to the sealed in-memory digest
//! 3. payload digest: the stored payload hashes to `user_data_sha256`
//! 4. services and lifecycle hooks, see [`crate::cascade`]

use chrono::{DateTime, Duration, Utc};
use odin_common::ContentDigest;
use tracing::{debug, info, warn};

use crate::component::is_empty;
use crate::document::ReleaseDocument;
use crate::error::{Rejected, Result, ValidationError};
use crate::models::Release;
use crate::storage::{get_struct, ObjectStore};

/// How far in the past `created_at` may lie
pub const MAX_RELEASE_AGE_SECS: i64 = 300;

/// How far in the future `created_at` may lie (clock skew)
pub const MAX_CLOCK_SKEW_SECS: i64 = 120;

impl Release {
    /// Run every check against the current time
    pub fn validate<S: ObjectStore + ?Sized>(&mut self, store: &S) -> Result<(), Rejected> {
        self.validate_at(store, Utc::now())
    }

    /// Run every check with `now` as the reference time for freshness
    pub fn validate_at<S: ObjectStore + ?Sized>(
        &mut self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<(), Rejected> {
        match self.run_checks(store, now) {
            Ok(()) => {
                info!(
                    "Release {} passed validation",
                    self.release_id.as_deref().unwrap_or_default()
                );
                Ok(())
            }
            Err(reason) => {
                let rejected = Rejected::new(self.release_id.as_deref(), reason);
                warn!("{}", rejected);
                Err(rejected)
            }
        }
    }

    fn run_checks<S: ObjectStore + ?Sized>(&mut self, store: &S, now: DateTime<Utc>) -> Result<()> {
        self.validate_attributes_at(now)?;
        self.validate_release_digest(store)?;
        self.validate_payload_digest(store)?;
        self.validate_services()
    }

    /// Check required fields and freshness
    pub fn validate_attributes_at(&self, now: DateTime<Utc>) -> Result<()> {
        let required: [(&Option<String>, &'static str); 8] = [
            (&self.project_name, "ProjectName"),
            (&self.config_name, "ConfigName"),
            (&self.uuid, "UUID"),
            (&self.aws_region, "AwsRegion"),
            (&self.aws_account_id, "AwsAccountID"),
            (&self.user_data_sha256, "UserDataSHA256"),
            (&self.release_id, "ReleaseID"),
            (&self.bucket, "Bucket"),
        ];

        if let Some((_, field)) = required.iter().find(|(value, _)| is_empty(value)) {
            return Err(ValidationError::MissingAttribute(*field));
        }

        let created_at = self
            .created_at
            .ok_or(ValidationError::MissingAttribute("CreatedAt"))?;

        let oldest = now - Duration::seconds(MAX_RELEASE_AGE_SECS);
        let newest = now + Duration::seconds(MAX_CLOCK_SKEW_SECS);
        if created_at < oldest || created_at > newest {
            return Err(ValidationError::StaleRelease {
                created_at,
                checked_at: now,
            });
        }

        Ok(())
    }

    /// Compare the stored release definition against the sealed digest
    pub fn validate_release_digest<S: ObjectStore + ?Sized>(&self, store: &S) -> Result<()> {
        let bucket = self.bucket_name()?;
        let key = self.release_path()?;

        let stored: ReleaseDocument =
            get_struct(store, bucket, &key).map_err(|source| ValidationError::StorageRead {
                key: key.clone(),
                source,
            })?;

        let stored_digest = ContentDigest::of_json(&stored).map_err(|source| {
            ValidationError::StorageRead {
                key: key.clone(),
                source,
            }
        })?;

        match self.definition_digest() {
            Some(sealed) if sealed == stored_digest => {
                debug!("Release digest {} matches {}", stored_digest, key);
                Ok(())
            }
            sealed => Err(ValidationError::TamperedRelease {
                stored: stored_digest.to_hex(),
                sealed: sealed.map(|d| d.to_hex()).unwrap_or_default(),
            }),
        }
    }

    /// Download the payload and compare its digest with `user_data_sha256`
    pub fn validate_payload_digest<S: ObjectStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let declared = self
            .user_data_sha256
            .clone()
            .ok_or(ValidationError::MissingAttribute("UserDataSHA256"))?;

        let actual = ContentDigest::of_bytes(self.fetch_payload(store)?);

        match ContentDigest::from_hex(&declared) {
            Ok(expected) if expected == actual => {
                debug!("Payload digest {} matches declared hash", actual);
                Ok(())
            }
            _ => Err(ValidationError::TamperedPayload {
                actual: actual.to_hex(),
                declared,
            }),
        }
    }
}

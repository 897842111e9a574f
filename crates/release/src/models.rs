//! The release domain entity and its mapping to and from [`ReleaseDocument`]

use chrono::{DateTime, Utc};
use odin_common::ContentDigest;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::component::ReleaseContext;
use crate::document::{ErrorRecord, ReleaseDocument};
use crate::error::Result;
use crate::hook::LifecycleHook;
use crate::service::Service;

/// Release is the data structure passed between client and deployer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Release {
    pub aws_account_id: Option<String>,
    pub aws_region: Option<String>,

    pub uuid: Option<String>,
    pub release_id: Option<String>,

    pub project_name: Option<String>,
    pub config_name: Option<String>,
    pub bucket: Option<String>,

    pub subnets: Option<Vec<String>>,
    pub timeout: Option<u64>,

    pub created_at: Option<DateTime<Utc>>,

    pub success: Option<bool>,

    pub image: Option<String>,

    pub user_data_sha256: Option<String>,
    pub user_data_kms_key: Option<String>,

    pub lifecycle_hooks: Option<BTreeMap<String, Option<LifecycleHook>>>,

    pub healthy: Option<bool>,
    pub error: Option<ErrorRecord>,

    pub services: Option<BTreeMap<String, Option<Service>>>,

    pub(crate) payload: Option<Vec<u8>>,
    pub(crate) definition_digest: Option<ContentDigest>,
}

impl Release {
    /// Create a release for one project configuration
    pub fn new(
        project_name: impl Into<String>,
        config_name: impl Into<String>,
        release_id: impl Into<String>,
    ) -> Self {
        Self {
            project_name: Some(project_name.into()),
            config_name: Some(config_name.into()),
            release_id: Some(release_id.into()),
            ..Default::default()
        }
    }

    /// Assign a fresh time-ordered UUID
    pub fn assign_uuid(&mut self) {
        self.uuid = Some(format!("release-{}", Uuid::now_v7()));
    }

    /// Set `created_at` unless the client already did
    pub fn stamp_created_at(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
    }

    /// Snapshot of the release-level values nested components resolve against
    pub fn context(&self) -> ReleaseContext {
        ReleaseContext {
            aws_region: self.aws_region.clone(),
            aws_account_id: self.aws_account_id.clone(),
            project_name: self.project_name.clone(),
            config_name: self.config_name.clone(),
            release_id: self.release_id.clone(),
        }
    }

    /// The in-memory payload, if fetched or set
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn set_payload(&mut self, payload: Option<Vec<u8>>) {
        self.payload = payload;
    }

    /// Digest of the release definition as first received, never serialized
    pub fn definition_digest(&self) -> Option<ContentDigest> {
        self.definition_digest
    }

    pub fn set_definition_digest(&mut self, digest: ContentDigest) {
        self.definition_digest = Some(digest);
    }

    /// Hash the canonical serialization of this release
    pub fn compute_definition_digest(&self) -> Result<ContentDigest> {
        let bytes = self.to_document().to_json()?;
        Ok(ContentDigest::of_bytes(&bytes))
    }

    /// Record the digest of the definition as it stands now
    ///
    /// The deployer seals the release exactly as received, before resolving
    /// defaults, and later compares it against the stored copy.
    pub fn seal(&mut self) -> Result<ContentDigest> {
        let digest = self.compute_definition_digest()?;
        self.definition_digest = Some(digest);
        Ok(digest)
    }

    /// Map to the persisted form, dropping process-local state
    pub fn to_document(&self) -> ReleaseDocument {
        ReleaseDocument {
            aws_account_id: self.aws_account_id.clone(),
            aws_region: self.aws_region.clone(),
            uuid: self.uuid.clone(),
            release_id: self.release_id.clone(),
            project_name: self.project_name.clone(),
            config_name: self.config_name.clone(),
            bucket: self.bucket.clone(),
            subnets: self.subnets.clone(),
            timeout: self.timeout,
            created_at: self.created_at,
            success: self.success,
            image: self.image.clone(),
            user_data_sha256: self.user_data_sha256.clone(),
            user_data_kms_key: self.user_data_kms_key.clone(),
            lifecycle_hooks: self.lifecycle_hooks.as_ref().map(|hooks| {
                hooks
                    .iter()
                    .map(|(name, hook)| (name.clone(), hook.as_ref().map(|h| h.spec.clone())))
                    .collect()
            }),
            healthy: self.healthy,
            error: self.error.clone(),
            services: self.services.as_ref().map(|services| {
                services
                    .iter()
                    .map(|(name, svc)| (name.clone(), svc.as_ref().map(|s| s.spec.clone())))
                    .collect()
            }),
        }
    }
}

impl From<ReleaseDocument> for Release {
    fn from(doc: ReleaseDocument) -> Self {
        Self {
            aws_account_id: doc.aws_account_id,
            aws_region: doc.aws_region,
            uuid: doc.uuid,
            release_id: doc.release_id,
            project_name: doc.project_name,
            config_name: doc.config_name,
            bucket: doc.bucket,
            subnets: doc.subnets,
            timeout: doc.timeout,
            created_at: doc.created_at,
            success: doc.success,
            image: doc.image,
            user_data_sha256: doc.user_data_sha256,
            user_data_kms_key: doc.user_data_kms_key,
            lifecycle_hooks: doc.lifecycle_hooks.map(|hooks| {
                hooks
                    .into_iter()
                    .map(|(name, spec)| (name, spec.map(LifecycleHook::from)))
                    .collect()
            }),
            healthy: doc.healthy,
            error: doc.error,
            services: doc.services.map(|services| {
                services
                    .into_iter()
                    .map(|(name, spec)| (name, spec.map(Service::from)))
                    .collect()
            }),
            payload: None,
            definition_digest: None,
        }
    }
}

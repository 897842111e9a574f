//! Wire/storage representation of a release
//!
//! The document carries exactly what is persisted at `{root}/{release_id}/release`
//! and exchanged with the deployer. Process-local state (the payload bytes and the
//! sealed definition digest) lives only on [`crate::Release`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hook::LifecycleHookSpec;
use crate::service::ServiceSpec;

/// Error recorded on a failed release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// Canonical serialized release definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_account_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    /// Generated by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Generated by the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Vec<String>>,

    /// Deployment timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(rename = "ami", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data_sha256: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data_kms_key: Option<String>,

    #[serde(rename = "lifecycle", skip_serializing_if = "Option::is_none")]
    pub lifecycle_hooks: Option<BTreeMap<String, Option<LifecycleHookSpec>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<BTreeMap<String, Option<ServiceSpec>>>,
}

impl ReleaseDocument {
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let doc = ReleaseDocument {
            image: Some("ami-123".to_string()),
            lifecycle_hooks: Some(BTreeMap::new()),
            ..Default::default()
        };
        let json = String::from_utf8(doc.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"ami":"ami-123","lifecycle":{}}"#);
    }

    #[test]
    fn test_null_service_entry_is_preserved() {
        let doc = ReleaseDocument::from_json(br#"{"services":{"web":null}}"#).unwrap();
        let services = doc.services.unwrap();
        assert_eq!(services.len(), 1);
        assert!(services["web"].is_none());
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let doc = ReleaseDocument::from_json(br#"{"release_id":"r-1","userdata":"secret"}"#)
            .unwrap();
        let json = String::from_utf8(doc.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"release_id":"r-1"}"#);
    }
}

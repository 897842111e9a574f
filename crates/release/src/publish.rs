//! Client side of the hand-off: persist a release and its payload

use chrono::{DateTime, Utc};
use odin_common::ContentDigest;
use tracing::info;

use crate::error::{Result, ValidationError};
use crate::models::Release;
use crate::storage::{put_struct, ObjectStore};

/// Write `payload` and the release definition to the store
///
/// Assigns a UUID and creation time when missing, records the payload hash,
/// resolves defaults and seals the returned release against the document that
/// was written, so a deployer reading the same store accepts it.
pub fn publish<S: ObjectStore + ?Sized>(
    release: Release,
    payload: &[u8],
    store: &S,
    now: DateTime<Utc>,
) -> Result<Release> {
    let mut release = release;
    if release.uuid.as_deref().map_or(true, str::is_empty) {
        release.assign_uuid();
    }
    release.stamp_created_at(now);
    release.user_data_sha256 = Some(ContentDigest::of_bytes(payload).to_hex());

    let mut release = release.with_defaults();

    let bucket = release.bucket_name()?.to_string();
    let user_data_key = release.user_data_path()?;
    let release_key = release.release_path()?;
    let kms_key = release.user_data_kms_key.clone();

    store
        .put(&bucket, &user_data_key, payload, kms_key.as_deref())
        .map_err(|source| ValidationError::StorageWrite {
            key: user_data_key.clone(),
            source,
        })?;

    let document = release.to_document();
    put_struct(store, &bucket, &release_key, &document, None).map_err(|source| {
        ValidationError::StorageWrite {
            key: release_key.clone(),
            source,
        }
    })?;

    let digest = release.seal()?;
    release.set_payload(Some(payload.to_vec()));

    info!(
        "Published release {} to {}/{} ({})",
        release.release_id.as_deref().unwrap_or_default(),
        bucket,
        release_key,
        digest
    );

    Ok(release)
}

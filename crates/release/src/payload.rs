//! Fetching the bootstrap payload stored next to the release definition

use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::models::Release;
use crate::storage::ObjectStore;

impl Release {
    /// Download the payload from `{root}/{release_id}/userdata` and cache it on
    /// the release. Each call performs a fresh read.
    pub fn fetch_payload<S: ObjectStore + ?Sized>(&mut self, store: &S) -> Result<&[u8]> {
        let bucket = self.bucket_name()?.to_string();
        let key = self.user_data_path()?;

        let bytes = store
            .get(&bucket, &key)
            .map_err(|source| ValidationError::StorageRead {
                key: key.clone(),
                source,
            })?;

        debug!("Fetched {} payload bytes from {}/{}", bytes.len(), bucket, key);
        self.set_payload(Some(bytes));
        Ok(self.payload().unwrap_or_default())
    }
}

//! Object storage used to hand releases from the client to the deployer
//!
//! Reads are assumed strongly consistent: a get following a put observes it.
//! No backend retries; that belongs to whoever drives the deploy.

use odin_common::{Error, Result};
use redis::Commands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Read/write access to an object store
pub trait ObjectStore {
    /// Fetch the object at `bucket`/`key`, `Error::NotFound` when absent
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store `body` at `bucket`/`key`, encrypted with `encryption_key` when the
    /// backend supports it
    fn put(&self, bucket: &str, key: &str, body: &[u8], encryption_key: Option<&str>)
        -> Result<()>;
}

/// Fetch and deserialize a JSON document
pub fn get_struct<T, S>(store: &S, bucket: &str, key: &str) -> Result<T>
where
    T: DeserializeOwned,
    S: ObjectStore + ?Sized,
{
    let bytes = store.get(bucket, key)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Serialize and store a JSON document
pub fn put_struct<T, S>(
    store: &S,
    bucket: &str,
    key: &str,
    value: &T,
    encryption_key: Option<&str>,
) -> Result<()>
where
    T: Serialize + ?Sized,
    S: ObjectStore + ?Sized,
{
    let bytes = serde_json::to_vec(value)?;
    store.put(bucket, key, &bytes, encryption_key)
}

fn not_found(bucket: &str, key: &str) -> Error {
    Error::NotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    encryption_key: Option<String>,
}

/// In-process object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encryption key the object was written with
    pub fn encryption_key(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        let objects = self.lock()?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.encryption_key.clone())
            .ok_or_else(|| not_found(bucket, key))
    }

    /// Number of stored objects, still counted after a writer panicked
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, String), StoredObject>>> {
        self.objects
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let objects = self.lock()?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
            .ok_or_else(|| not_found(bucket, key))
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        encryption_key: Option<&str>,
    ) -> Result<()> {
        let mut objects = self.lock()?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.to_vec(),
                encryption_key: encryption_key.map(str::to_string),
            },
        );
        Ok(())
    }
}

/// Object store backed by a directory tree: `{root}/{bucket}/{key}`
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let escapes = bucket.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(Error::Storage(format!(
                "refusing object path outside store root: {}/{}",
                bucket, key
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FileStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        debug!("Reading object {}", path.display());
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found(bucket, key)),
            Err(e) => Err(e.into()),
        }
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        encryption_key: Option<&str>,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        if let Some(kms) = encryption_key {
            debug!("Object {} written with encryption key {}", path.display(), kms);
        }
        Ok(())
    }
}

/// Object store backed by Redis string keys
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Create a new store
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::Redis(e.to_string()))?;
        info!("Using Redis object store at {}", redis_url);
        Ok(Self { client })
    }

    fn object_key(bucket: &str, key: &str) -> String {
        format!("object:{}/{}", bucket, key)
    }

    fn kms_key(object_key: &str) -> String {
        format!("{}:kms", object_key)
    }

    fn connection(&self) -> Result<redis::Connection> {
        self.client
            .get_connection()
            .map_err(|e| Error::Redis(e.to_string()))
    }

    /// Encryption key the object was last written with
    pub fn encryption_key(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection()?;
        let object_key = Self::object_key(bucket, key);
        let (exists, kms): (bool, Option<String>) = redis::pipe()
            .exists(&object_key)
            .get(Self::kms_key(&object_key))
            .query(&mut conn)
            .map_err(|e| Error::Redis(e.to_string()))?;

        if !exists {
            return Err(not_found(bucket, key));
        }
        Ok(kms)
    }
}

impl ObjectStore for RedisStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.connection()?;
        let body: Option<Vec<u8>> = conn
            .get(Self::object_key(bucket, key))
            .map_err(|e| Error::Redis(e.to_string()))?;
        body.ok_or_else(|| not_found(bucket, key))
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        encryption_key: Option<&str>,
    ) -> Result<()> {
        let mut conn = self.connection()?;
        let object_key = Self::object_key(bucket, key);

        let kms_key = Self::kms_key(&object_key);

        let mut pipe = redis::pipe();
        pipe.atomic().set(&object_key, body).ignore();
        match encryption_key {
            Some(kms) => pipe.set(&kms_key, kms).ignore(),
            None => pipe.del(&kms_key).ignore(),
        };
        let _: () = pipe
            .query(&mut conn)
            .map_err(|e| Error::Redis(e.to_string()))?;

        debug!("Stored {} bytes at {}", body.len(), object_key);
        Ok(())
    }
}

//! Odin release integrity core
//!
//! A client builds a [`Release`], publishes it together with its bootstrap
//! payload to an object store, and a deployer later reads it back, resolves
//! defaults and validates it before making any infrastructure change.

pub mod cascade;
pub mod component;
pub mod defaults;
pub mod document;
pub mod error;
pub mod hook;
pub mod integrity;
pub mod models;
pub mod outcome;
pub mod paths;
pub mod payload;
pub mod publish;
pub mod service;
pub mod storage;

pub use component::{Component, ReleaseContext};
pub use document::{ErrorRecord, ReleaseDocument};
pub use error::{ComponentError, OutcomeError, Rejected, ValidationError};
pub use hook::{LifecycleHook, LifecycleHookSpec};
pub use models::Release;
pub use publish::publish;
pub use service::{AutoscalingSpec, Service, ServiceSpec};
pub use storage::{FileStore, MemoryStore, ObjectStore, RedisStore};

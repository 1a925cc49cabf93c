//! The secret store contract consumed by the provisioner

use async_trait::async_trait;
use seedvault_core::{SecretValue, StorageKey, StoreResult};
use std::sync::Arc;

/// Write semantics requested from a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PutMode {
    /// Succeed only if no value exists at the key yet
    CreateOnly,
}

/// What a backend can guarantee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// `PutMode::CreateOnly` is enforced atomically by the backend, and a
    /// conflicting create reports `StoreError::AlreadyExists`. When false, two
    /// racing creates may both succeed and the last one wins.
    pub conditional_create: bool,
}

/// A key-value secret store
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the value at `key`.
    ///
    /// A missing key must be reported as `StoreError::NotFound` and nothing
    /// else; every other failure must use a different variant.
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue>;

    /// Write `value` at `key` with the given semantics
    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()>;

    /// Guarantees offered by this backend
    fn capabilities(&self) -> StoreCapabilities;

    /// Short name used in logs and errors
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for Arc<S> {
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue> {
        (**self).get(key).await
    }

    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()> {
        (**self).put(key, value, mode).await
    }

    fn capabilities(&self) -> StoreCapabilities {
        (**self).capabilities()
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for Box<S> {
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue> {
        (**self).get(key).await
    }

    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()> {
        (**self).put(key, value, mode).await
    }

    fn capabilities(&self) -> StoreCapabilities {
        (**self).capabilities()
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

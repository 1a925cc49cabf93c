use crate::store::{PutMode, SecretStore, StoreCapabilities};
use async_trait::async_trait;
use seedvault_core::{SecretValue, StorageKey, StoreError, StoreResult};
use std::time::Duration;

/// Bounds every call to the wrapped store.
///
/// Expiry surfaces as `StoreError::Timeout`, which callers may retry. A put
/// that times out may or may not have landed; the next resolution reads the
/// key again and finds out.
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: SecretStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: SecretStore> SecretStore for TimeoutStore<S> {
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue> {
        tokio::time::timeout(self.timeout, self.inner.get(key))
            .await
            .map_err(|_| StoreError::timeout("get", key.as_str(), self.timeout))?
    }

    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()> {
        tokio::time::timeout(self.timeout, self.inner.put(key, value, mode))
            .await
            .map_err(|_| StoreError::timeout("put", key.as_str(), self.timeout))?
    }

    fn capabilities(&self) -> StoreCapabilities {
        self.inner.capabilities()
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

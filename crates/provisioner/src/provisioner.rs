//! Idempotent get-or-create resolution of secrets

use crate::generator::{CredentialGenerator, OsRngGenerator};
use dashmap::DashMap;
use futures::future::join_all;
use seedvault_core::{
    Error, Namespace, ResolvedSecret, Result, SecretName, SecretOrigin, SecretRequest,
    SecretValue, StorageKey, StoreError,
};
use seedvault_store::{PutMode, SecretStore};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;

/// Resolves logical secrets against a store, creating each one at most once.
///
/// A resolution reads the storage key first and reuses whatever is there.
/// Only a definite `NotFound` leads to a new value being generated, and the
/// write is create-only so a concurrent writer can never be overwritten.
pub struct SecretProvisioner {
    namespace: Namespace,
    store: Arc<dyn SecretStore>,
    generator: Arc<dyn CredentialGenerator>,
    key_locks: DashMap<StorageKey, Arc<Mutex<()>>>,
}

impl SecretProvisioner {
    pub fn new(namespace: Namespace, store: Arc<dyn SecretStore>) -> Self {
        Self {
            namespace,
            store,
            generator: Arc::new(OsRngGenerator),
            key_locks: DashMap::new(),
        }
    }

    /// Replace the random generator
    pub fn with_generator(mut self, generator: Arc<dyn CredentialGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn storage_key(&self, name: &SecretName) -> StorageKey {
        StorageKey::derive(name, &self.namespace)
    }

    #[cfg(test)]
    pub(crate) fn held_key_locks(&self) -> usize {
        self.key_locks.len()
    }

    /// Return the stored value for `request`, creating it if none exists.
    #[tracing::instrument(
        skip(self, request),
        fields(
            name = %request.name,
            namespace = %self.namespace,
            backend = self.store.backend_name(),
        )
    )]
    pub async fn resolve(&self, request: &SecretRequest) -> Result<ResolvedSecret> {
        request.validate()?;
        let key = self.storage_key(&request.name);

        let result = {
            let lock = KeyLock::acquire(&self.key_locks, &key);
            let _guard = lock.mutex.lock().await;
            self.resolve_locked(&key, request).await
        };

        match &result {
            Ok(resolved) => tracing::info!(
                storage_key = %resolved.storage_key,
                origin = %resolved.origin,
                "Resolved secret"
            ),
            Err(e) => tracing::warn!(storage_key = %key, error = %e, "Failed to resolve secret"),
        }
        result
    }

    /// Resolve several requests concurrently.
    ///
    /// Results come back in input order and one failure does not affect the
    /// others. Two requests mapping to the same storage key are rejected up
    /// front since their parameters could disagree.
    pub async fn resolve_all(
        &self,
        requests: &[SecretRequest],
    ) -> Result<Vec<Result<ResolvedSecret>>> {
        let mut seen = HashSet::with_capacity(requests.len());
        for request in requests {
            let key = self.storage_key(&request.name);
            if !seen.insert(key.clone()) {
                return Err(Error::invalid_request(
                    "secrets",
                    format!("secret '{}' is requested more than once ({key})", request.name),
                ));
            }
        }

        let span = tracing::info_span!(
            "resolve_all",
            namespace = %self.namespace,
            total = requests.len()
        );
        let results = join_all(requests.iter().map(|request| self.resolve(request)))
            .instrument(span)
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            namespace = %self.namespace,
            total = results.len(),
            failed,
            "Finished resolving secrets"
        );
        Ok(results)
    }

    /// Read the current value for `name` without ever creating one.
    ///
    /// Returns `Ok(None)` when nothing is stored yet.
    pub async fn lookup(&self, name: &SecretName) -> Result<Option<ResolvedSecret>> {
        let key = self.storage_key(name);
        match self.store.get(&key).await {
            Ok(value) => {
                let value = ensure_usable(&key, value)?;
                Ok(Some(ResolvedSecret {
                    storage_key: key,
                    value,
                    origin: SecretOrigin::Existing,
                }))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_locked(&self, key: &StorageKey, request: &SecretRequest) -> Result<ResolvedSecret> {
        match self.store.get(key).await {
            Ok(value) => {
                let value = ensure_usable(key, value)?;
                if !matches_request(&value, request) {
                    tracing::debug!(
                        storage_key = %key,
                        "Stored secret does not match the requested length or policy, keeping it"
                    );
                }
                Ok(ResolvedSecret {
                    storage_key: key.clone(),
                    value,
                    origin: SecretOrigin::Existing,
                })
            }
            Err(e) if e.is_not_found() => self.create(key, request).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, key: &StorageKey, request: &SecretRequest) -> Result<ResolvedSecret> {
        if request.length_is_unusual() {
            tracing::warn!(
                storage_key = %key,
                length = request.length,
                "Generating a secret with an unusual length"
            );
        }

        let value = self.generator.generate(request.length, &request.policy)?;
        tracing::debug!(storage_key = %key, length = request.length, "Creating secret");

        match self.store.put(key, &value, PutMode::CreateOnly).await {
            Ok(()) if self.store.capabilities().conditional_create => Ok(ResolvedSecret {
                storage_key: key.clone(),
                value,
                origin: SecretOrigin::Created,
            }),
            Ok(()) => self.verify_written(key, value).await,
            Err(e) if e.is_already_exists() => {
                tracing::info!(storage_key = %key, "Secret was created concurrently, adopting it");
                let value = self.read_after_conflict(key).await?;
                Ok(ResolvedSecret {
                    storage_key: key.clone(),
                    value,
                    origin: SecretOrigin::Adopted,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read back a write made to a store without conditional create.
    ///
    /// If another writer landed after us, the stored value is the one every
    /// later reader will see, so that is the one returned.
    async fn verify_written(&self, key: &StorageKey, written: SecretValue) -> Result<ResolvedSecret> {
        let stored = self.read_after_conflict(key).await?;
        if stored == written {
            return Ok(ResolvedSecret {
                storage_key: key.clone(),
                value: written,
                origin: SecretOrigin::Created,
            });
        }
        tracing::warn!(
            storage_key = %key,
            backend = self.store.backend_name(),
            "Concurrent write detected on a store without conditional create, using the stored value"
        );
        Ok(ResolvedSecret {
            storage_key: key.clone(),
            value: stored,
            origin: SecretOrigin::Adopted,
        })
    }

    /// Read a key that is known to exist.
    ///
    /// `NotFound` here means the store contradicted itself and is reported as
    /// a backend failure, never as a missing secret.
    async fn read_after_conflict(&self, key: &StorageKey) -> Result<SecretValue> {
        match self.store.get(key).await {
            Ok(value) => ensure_usable(key, value),
            Err(e) if e.is_not_found() => Err(StoreError::backend(
                self.store.backend_name(),
                format!("secret '{key}' exists but could not be read back"),
            )
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Shared per-key mutex, removed from the map once its last holder drops it.
///
/// Cleanup runs on drop so a resolution cancelled while waiting for the lock
/// does not leave its entry behind.
struct KeyLock<'a> {
    locks: &'a DashMap<StorageKey, Arc<Mutex<()>>>,
    key: &'a StorageKey,
    mutex: Arc<Mutex<()>>,
}

impl<'a> KeyLock<'a> {
    fn acquire(locks: &'a DashMap<StorageKey, Arc<Mutex<()>>>, key: &'a StorageKey) -> Self {
        let mutex = locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { locks, key, mutex }
    }
}

impl Drop for KeyLock<'_> {
    fn drop(&mut self) {
        // Our clone plus the map's own reference
        self.locks
            .remove_if(self.key, |_, mutex| Arc::strong_count(mutex) <= 2);
    }
}

/// Reject an empty stored value instead of handing it out as a credential
fn ensure_usable(key: &StorageKey, value: SecretValue) -> Result<SecretValue> {
    if value.is_empty() {
        return Err(StoreError::malformed(key.as_str(), "stored value is empty").into());
    }
    Ok(value)
}

fn matches_request(value: &SecretValue, request: &SecretRequest) -> bool {
    value.char_count() == request.length && value.expose().chars().all(|c| request.policy.allows(c))
}

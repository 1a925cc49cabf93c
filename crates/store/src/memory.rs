use crate::store::{PutMode, SecretStore, StoreCapabilities};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use seedvault_core::{SecretValue, StorageKey, StoreError, StoreResult};

/// In-process secret store.
///
/// By default creates are atomic per key: the check and the insert happen
/// under the same shard lock. [`MemorySecretStore::last_write_wins`] builds a
/// variant without that guarantee, matching stores that only offer a plain
/// put.
#[derive(Debug)]
pub struct MemorySecretStore {
    entries: DashMap<String, SecretValue>,
    conditional_create: bool,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            conditional_create: true,
        }
    }

    /// A store whose creates silently overwrite each other
    pub fn last_write_wins() -> Self {
        Self {
            entries: DashMap::new(),
            conditional_create: false,
        }
    }

    /// Store a value directly, bypassing create-only semantics
    pub fn seed(&self, key: &StorageKey, value: impl Into<String>) {
        self.entries
            .insert(key.as_str().to_string(), SecretValue::new(value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue> {
        self.entries
            .get(key.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(key.as_str()))
    }

    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()> {
        match mode {
            PutMode::CreateOnly if self.conditional_create => {
                match self.entries.entry(key.as_str().to_string()) {
                    Entry::Occupied(_) => Err(StoreError::already_exists(key.as_str())),
                    Entry::Vacant(slot) => {
                        slot.insert(value.clone());
                        Ok(())
                    }
                }
            }
            PutMode::CreateOnly => {
                self.entries.insert(key.as_str().to_string(), value.clone());
                Ok(())
            }
        }
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            conditional_create: self.conditional_create,
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

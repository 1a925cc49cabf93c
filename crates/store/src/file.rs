//! JSON-file backed secret store for local development and single-host use

use crate::store::{PutMode, SecretStore, StoreCapabilities};
use async_trait::async_trait;
use fs2::FileExt;
use seedvault_core::{SecretValue, StorageKey, StoreError, StoreResult};
use seedvault_utils::{read_if_exists, write_atomic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const BACKEND: &str = "file";
const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SecretDocument {
    version: u32,
    #[serde(default)]
    secrets: BTreeMap<String, String>,
}

/// Secrets kept in one JSON document on disk.
///
/// Creates hold an exclusive advisory lock on a sidecar `.lock` file while
/// they re-read the document, check for the key, and commit through an
/// atomic rename. Create-if-absent therefore holds across processes on the
/// same host, and an interrupted write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "secrets".into());
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StoreResult<SecretDocument> {
        let Some(content) = read_if_exists(path).map_err(io_failure)? else {
            return Ok(SecretDocument {
                version: DOCUMENT_VERSION,
                secrets: BTreeMap::new(),
            });
        };
        serde_json::from_slice(&content).map_err(|e| {
            StoreError::backend_with_source(
                BACKEND,
                format!("secrets file '{}' is corrupt", path.display()),
                e,
            )
        })
    }

    fn create_locked(&self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(parent) = self.lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(e, "create state directory"))?;
        }
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| io_error(e, "open lock file"))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| io_error(e, "lock secrets file"))?;

        let result = (|| {
            let mut document = Self::load(&self.path)?;
            if document.secrets.contains_key(key) {
                return Err(StoreError::already_exists(key));
            }
            document.version = DOCUMENT_VERSION;
            document.secrets.insert(key.to_string(), value.to_string());
            let content = serde_json::to_vec_pretty(&document).map_err(|e| {
                StoreError::backend_with_source(BACKEND, "failed to encode secrets file", e)
            })?;
            write_atomic(&self.path, &content).map_err(io_failure)
        })();

        let _ = FileExt::unlock(&lock_file);
        result
    }
}

fn io_error(error: std::io::Error, operation: &str) -> StoreError {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        StoreError::permission_denied(operation, error.to_string())
    } else {
        StoreError::backend_with_source(BACKEND, format!("failed to {operation}"), error)
    }
}

fn io_failure(error: seedvault_core::Error) -> StoreError {
    match error {
        seedvault_core::Error::FileSystem {
            operation, source, ..
        } => io_error(source, &operation),
        other => StoreError::backend_with_source(BACKEND, "file operation failed", other),
    }
}

fn join_failure(error: tokio::task::JoinError) -> StoreError {
    StoreError::backend_with_source(BACKEND, "file store task failed", error)
}

#[async_trait]
impl SecretStore for FileSecretStore {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue> {
        let path = self.path.clone();
        let key = key.as_str().to_string();
        tokio::task::spawn_blocking(move || {
            let mut document = Self::load(&path)?;
            document
                .secrets
                .remove(&key)
                .map(SecretValue::new)
                .ok_or_else(|| StoreError::not_found(key))
        })
        .await
        .map_err(join_failure)?
    }

    #[tracing::instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()> {
        let PutMode::CreateOnly = mode;
        let store = self.clone();
        let key = key.as_str().to_string();
        let value = value.clone();
        tokio::task::spawn_blocking(move || store.create_locked(&key, value.expose()))
            .await
            .map_err(join_failure)?
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities {
            conditional_create: true,
        }
    }

    fn backend_name(&self) -> &'static str {
        BACKEND
    }
}

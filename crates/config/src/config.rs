//! Configuration types
//!
//! [`ConfigFile`] mirrors the JSON document on disk, where everything is
//! optional. [`ProvisionerConfig`] is the validated result the rest of the
//! program works with.

use seedvault_core::{
    CharacterPolicy, Error, Namespace, Result, SecretName, SecretRequest, DEFAULT_SECRET_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which secret store to talk to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreSettings {
    /// In-process map, lost on exit
    Memory,
    /// JSON document on local disk
    File { path: PathBuf },
    /// AWS Secrets Manager
    Aws {
        #[serde(default)]
        profile: Option<String>,
    },
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings::Aws { profile: None }
    }
}

impl StoreSettings {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreSettings::Memory => "memory",
            StoreSettings::File { .. } => "file",
            StoreSettings::Aws { .. } => "aws",
        }
    }

    /// Resolve a relative file store path against `base`
    pub(crate) fn relative_to(self, base: &Path) -> Self {
        match self {
            StoreSettings::File { path } if path.is_relative() => StoreSettings::File {
                path: base.join(path),
            },
            other => other,
        }
    }
}

fn default_length() -> usize {
    DEFAULT_SECRET_LENGTH
}

/// One logical secret the configuration asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecretDeclaration {
    pub name: SecretName,
    #[serde(default = "default_length")]
    pub length: usize,
    #[serde(default)]
    pub policy: CharacterPolicy,
}

impl SecretDeclaration {
    pub fn to_request(&self) -> Result<SecretRequest> {
        SecretRequest::new(self.name.clone(), self.length, self.policy.clone())
    }
}

/// The configuration file as written on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub namespace: Option<String>,
    pub region: Option<String>,
    pub store: Option<StoreSettings>,
    pub store_timeout_ms: Option<u64>,
    pub expected_account_id: Option<String>,
    #[serde(default)]
    pub secrets: Vec<SecretDeclaration>,
}

impl ConfigFile {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid configuration: {e}")))
    }
}

/// Validated configuration for one provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub namespace: Namespace,
    pub region: Option<String>,
    pub store: StoreSettings,
    pub store_timeout: Duration,
    /// AWS account the credentials must belong to
    pub expected_account_id: Option<String>,
    pub secrets: Vec<SecretDeclaration>,
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
}

impl ProvisionerConfig {
    /// Requests for every declared secret, in declaration order
    pub fn requests(&self) -> Result<Vec<SecretRequest>> {
        self.secrets.iter().map(SecretDeclaration::to_request).collect()
    }

    pub fn declaration(&self, name: &SecretName) -> Option<&SecretDeclaration> {
        self.secrets.iter().find(|declaration| &declaration.name == name)
    }
}

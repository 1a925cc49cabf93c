//! Layered configuration loading
//!
//! Later layers win: the JSON file, then `SEEDVAULT_*` environment
//! variables, then explicit overrides from the command line.

use crate::config::{ConfigFile, ProvisionerConfig, StoreSettings};
use seedvault_core::{
    constants::{
        DEFAULT_CONFIG_FILENAME, DEFAULT_STORE_TIMEOUT_MS, SEEDVAULT_NAMESPACE_VAR,
        SEEDVAULT_REGION_VAR, SEEDVAULT_STORE_TIMEOUT_VAR,
    },
    Error, Namespace, Result, Validate,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values given explicitly by the caller, applied last
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub namespace: Option<String>,
    pub region: Option<String>,
    pub store: Option<StoreSettings>,
    pub store_timeout: Option<Duration>,
}

/// Builds a [`ProvisionerConfig`] from its layers
pub struct ConfigLoader {
    /// Explicit configuration file; must exist when set
    file: Option<PathBuf>,
    /// Directory to search for the default file (defaults to the current directory)
    directory: Option<PathBuf>,
    /// Whether to read `SEEDVAULT_*` environment variables
    use_env: bool,
    overrides: ConfigOverrides,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            directory: None,
            use_env: true,
            overrides: ConfigOverrides::default(),
        }
    }

    /// Read this file instead of searching for the default one
    pub fn file(mut self, path: PathBuf) -> Self {
        self.file = Some(path);
        self
    }

    /// Start the search for the default file here
    pub fn directory(mut self, dir: PathBuf) -> Self {
        self.directory = Some(dir);
        self
    }

    /// Ignore `SEEDVAULT_*` environment variables
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Load and validate the configuration
    pub fn load(self) -> Result<ProvisionerConfig> {
        let source = self.locate()?;
        let mut file = match &source {
            Some(path) => read_config_file(path)?,
            None => {
                tracing::debug!("No configuration file found, using defaults");
                ConfigFile::default()
            }
        };

        if self.use_env {
            apply_env(&mut file)?;
        }

        let ConfigOverrides {
            namespace,
            region,
            store,
            store_timeout,
        } = self.overrides;

        let namespace = namespace.or(file.namespace).ok_or_else(|| {
            Error::configuration(format!(
                "no namespace configured; set it in {DEFAULT_CONFIG_FILENAME}, \
                 {SEEDVAULT_NAMESPACE_VAR} or --namespace"
            ))
        })?;
        let namespace = Namespace::new(namespace)?;

        let region = region.or(file.region);
        if let Some(region) = &region {
            Validate::not_empty(region, "region")?;
        }

        let store = store.or(file.store).unwrap_or_default();
        if let StoreSettings::File { path } = &store {
            Validate::not_empty(&path.to_string_lossy(), "store path")?;
        }

        let store_timeout = store_timeout
            .or(file.store_timeout_ms.map(Duration::from_millis))
            .unwrap_or(Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS));
        if store_timeout.is_zero() {
            return Err(Error::configuration("store timeout must be greater than zero"));
        }

        let expected_account_id = file
            .expected_account_id
            .map(|id| {
                Validate::with_predicate(
                    id,
                    |id| id.len() == 12 && id.chars().all(|c| c.is_ascii_digit()),
                    "expectedAccountId",
                    "must be a 12-digit AWS account id",
                )
            })
            .transpose()?;

        let mut seen = HashSet::new();
        for declaration in &file.secrets {
            if !seen.insert(declaration.name.as_str()) {
                return Err(Error::configuration(format!(
                    "secret '{}' is declared more than once",
                    declaration.name
                )));
            }
            declaration.to_request()?;
        }

        let config = ProvisionerConfig {
            namespace,
            region,
            store,
            store_timeout,
            expected_account_id,
            secrets: file.secrets,
            source,
        };
        tracing::debug!(
            namespace = %config.namespace,
            backend = config.store.backend_name(),
            secrets = config.secrets.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn locate(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "configuration file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        let start = match &self.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| Error::file_system(".", "determine current directory", e))?,
        };
        Ok(find_config_file(&start))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the default configuration file in `start` or one of its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read", e))?;
    let file: ConfigFile = serde_json::from_str(&content)
        .map_err(|e| Error::configuration(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "Read configuration file");

    // Relative store paths are relative to the file that names them
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(ConfigFile {
        store: file.store.map(|store| store.relative_to(base)),
        ..file
    })
}

fn apply_env(file: &mut ConfigFile) -> Result<()> {
    if let Some(namespace) = env_var(SEEDVAULT_NAMESPACE_VAR) {
        file.namespace = Some(namespace);
    }
    if let Some(region) = env_var(SEEDVAULT_REGION_VAR) {
        file.region = Some(region);
    }
    if let Some(timeout) = env_var(SEEDVAULT_STORE_TIMEOUT_VAR) {
        let millis = timeout.parse::<u64>().map_err(|_| {
            Error::configuration(format!(
                "{SEEDVAULT_STORE_TIMEOUT_VAR} must be a number of milliseconds, got '{timeout}'"
            ))
        })?;
        file.store_timeout_ms = Some(millis);
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

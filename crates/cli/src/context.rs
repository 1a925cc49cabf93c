//! Wiring from configuration to a ready provisioner

use crate::commands::GlobalArgs;
use seedvault_config::{ConfigLoader, ProvisionerConfig, StoreSettings};
use seedvault_core::{ResolvedSecret, Result, SecretRequest, StoreError};
use seedvault_provisioner::SecretProvisioner;
use seedvault_store::{
    AwsCliOptions, AwsCliSecretStore, FileSecretStore, MemorySecretStore, SecretStore,
    TimeoutStore,
};
use seedvault_utils::retry::{retry_async, RetryConfig, RetryableError};
use std::sync::Arc;

pub struct RunContext {
    pub config: ProvisionerConfig,
    pub provisioner: SecretProvisioner,
    retry: RetryConfig,
}

impl RunContext {
    /// Load configuration, connect to the store and check the AWS account
    pub async fn build(global: &GlobalArgs) -> eyre::Result<Self> {
        let mut loader = ConfigLoader::new().overrides(global.overrides()?);
        if let Some(path) = &global.config {
            loader = loader.file(path.clone());
        }
        let config = loader.load()?;

        let store = connect(&config).await?;
        let provisioner = SecretProvisioner::new(config.namespace.clone(), store);
        let retry = RetryConfig::network().with_max_attempts(global.retries.saturating_add(1));

        Ok(Self {
            config,
            provisioner,
            retry,
        })
    }

    /// Resolve one request, retrying transient store failures
    pub async fn resolve(&self, request: &SecretRequest) -> Result<ResolvedSecret> {
        retry_async(self.retry.clone(), || self.provisioner.resolve(request)).await
    }

    /// Resolve all requests, then retry the ones that failed transiently
    pub async fn resolve_all(&self, requests: &[SecretRequest]) -> Result<Vec<Result<ResolvedSecret>>> {
        let mut results = self.provisioner.resolve_all(requests).await?;
        if self.retry.max_attempts > 1 {
            for (request, result) in requests.iter().zip(results.iter_mut()) {
                if matches!(result, Err(e) if e.is_retryable()) {
                    let retry = self.retry.clone().with_max_attempts(self.retry.max_attempts - 1);
                    *result = retry_async(retry, || self.provisioner.resolve(request)).await;
                }
            }
        }
        Ok(results)
    }
}

async fn connect(config: &ProvisionerConfig) -> Result<Arc<dyn SecretStore>> {
    let timeout = config.store_timeout;

    if config.expected_account_id.is_some() && !matches!(config.store, StoreSettings::Aws { .. }) {
        tracing::warn!(
            backend = config.store.backend_name(),
            "expectedAccountId only applies to the aws backend, ignoring it"
        );
    }

    let store: Arc<dyn SecretStore> = match &config.store {
        StoreSettings::Memory => {
            tracing::warn!("Using the memory store: secrets are discarded on exit");
            Arc::new(TimeoutStore::new(MemorySecretStore::new(), timeout))
        }
        StoreSettings::File { path } => {
            Arc::new(TimeoutStore::new(FileSecretStore::new(path.clone()), timeout))
        }
        StoreSettings::Aws { profile } => {
            let aws = AwsCliSecretStore::new(AwsCliOptions {
                region: config.region.clone(),
                profile: profile.clone(),
                program: None,
            });
            if let Some(expected) = &config.expected_account_id {
                tokio::time::timeout(timeout, aws.verify_account(expected))
                    .await
                    .map_err(|_| StoreError::timeout("verify account", expected.as_str(), timeout))??;
            }
            Arc::new(TimeoutStore::new(aws, timeout))
        }
    };

    tracing::debug!(
        backend = store.backend_name(),
        timeout = ?timeout,
        "Connected to secret store"
    );
    Ok(store)
}

//! AWS Secrets Manager through the `aws` command line
//!
//! `create-secret` fails with `ResourceExistsException` when the name is
//! taken, which gives this backend a real create-if-absent primitive.

use crate::command_executor::{CommandExecutor, SystemCommandExecutor};
use crate::store::{PutMode, SecretStore, StoreCapabilities};
use async_trait::async_trait;
use seedvault_core::{Error, Result, SecretValue, StorageKey, StoreError, StoreResult};
use serde::Deserialize;
use std::io::Write;
use std::process::Output;
use std::sync::Arc;

const BACKEND: &str = "aws";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecretValueResponse {
    secret_string: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
}

/// Connection settings for the AWS command line
#[derive(Debug, Clone, Default)]
pub struct AwsCliOptions {
    /// Region passed as `--region`; the CLI default applies when unset
    pub region: Option<String>,
    /// Named profile passed as `--profile`
    pub profile: Option<String>,
    /// Program to run, `aws` unless overridden
    pub program: Option<String>,
}

/// Secret store backed by AWS Secrets Manager
pub struct AwsCliSecretStore {
    executor: Arc<dyn CommandExecutor>,
    options: AwsCliOptions,
}

impl AwsCliSecretStore {
    pub fn new(options: AwsCliOptions) -> Self {
        Self::with_executor(options, Arc::new(SystemCommandExecutor))
    }

    pub fn with_executor(options: AwsCliOptions, executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor, options }
    }

    fn program(&self) -> &str {
        self.options.program.as_deref().unwrap_or("aws")
    }

    fn args(&self, service_args: &[&str]) -> Vec<String> {
        let mut args: Vec<String> = service_args.iter().map(|s| s.to_string()).collect();
        if let Some(region) = &self.options.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.options.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args.push("--output".to_string());
        args.push("json".to_string());
        args
    }

    async fn run(&self, key: &str, args: Vec<String>) -> StoreResult<Output> {
        let output = self
            .executor
            .execute(self.program(), &args)
            .await
            .map_err(|e| StoreError::backend_with_source(BACKEND, "failed to run aws cli", e))?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(classify_failure(
                key,
                &String::from_utf8_lossy(&output.stderr),
            ))
        }
    }

    /// The account id the configured credentials belong to
    pub async fn caller_account(&self) -> Result<String> {
        let args = self.args(&["sts", "get-caller-identity"]);
        let output = self.executor.execute(self.program(), &args).await?;
        if !output.status.success() {
            return Err(Error::command_execution(
                self.program(),
                args,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
                output.status.code(),
            ));
        }
        let identity: CallerIdentity = serde_json::from_slice(&output.stdout)?;
        Ok(identity.account)
    }

    /// Fail unless the configured credentials belong to `expected`
    pub async fn verify_account(&self, expected: &str) -> Result<()> {
        let actual = self.caller_account().await?;
        if actual == expected {
            tracing::debug!(account = %actual, "AWS account verified");
            Ok(())
        } else {
            Err(Error::permission_denied(
                "secret provisioning",
                format!("credentials belong to AWS account {actual}, expected {expected}"),
            ))
        }
    }
}

/// The service error code in `An error occurred (<Code>) when calling ...`
fn error_code(stderr: &str) -> Option<&str> {
    stderr.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("An error occurred (")?;
        let (code, _) = rest.split_once(')')?;
        let well_formed = !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.');
        well_formed.then_some(code)
    })
}

/// Map an AWS CLI failure onto the store error taxonomy.
///
/// Only the service error code decides between the outcomes the provisioner
/// acts on. Free text never produces `NotFound` or `AlreadyExists`.
fn classify_failure(key: &str, stderr: &str) -> StoreError {
    let message = stderr.trim().to_string();
    match error_code(&message) {
        Some(code) => classify_service_error(key, code, message.clone()),
        None => classify_client_error(key, message),
    }
}

fn classify_service_error(key: &str, code: &str, message: String) -> StoreError {
    match code {
        "ResourceNotFoundException" => StoreError::not_found(key),
        "ResourceExistsException" => StoreError::already_exists(key),
        "AccessDeniedException"
        | "UnrecognizedClientException"
        | "ExpiredTokenException"
        | "InvalidClientTokenId"
        | "InvalidSignatureException" => StoreError::permission_denied(key, message),
        "ThrottlingException"
        | "InternalServiceError"
        | "InternalFailure"
        | "ServiceUnavailable"
        | "RequestTimeout" => StoreError::unavailable(message),
        "InvalidParameterException" | "ValidationException" => StoreError::InvalidKey {
            key: key.to_string(),
            message,
        },
        _ => StoreError::backend(BACKEND, message),
    }
}

/// Failures raised by the CLI itself before any service response
fn classify_client_error(key: &str, message: String) -> StoreError {
    let has = |needle: &str| message.contains(needle);

    if has("Unable to locate credentials") || has("The config profile") {
        StoreError::permission_denied(key, message)
    } else if has("Could not connect to the endpoint URL")
        || has("Connection was closed")
        || has("Read timeout")
    {
        StoreError::unavailable(message)
    } else {
        StoreError::backend(BACKEND, message)
    }
}

#[async_trait]
impl SecretStore for AwsCliSecretStore {
    #[tracing::instrument(skip(self), fields(region = ?self.options.region))]
    async fn get(&self, key: &StorageKey) -> StoreResult<SecretValue> {
        let args = self.args(&[
            "secretsmanager",
            "get-secret-value",
            "--secret-id",
            key.as_str(),
        ]);
        let output = self.run(key.as_str(), args).await?;
        let response: SecretValueResponse = serde_json::from_slice(&output.stdout).map_err(|e| {
            StoreError::backend_with_source(BACKEND, "unexpected get-secret-value output", e)
        })?;
        response
            .secret_string
            .map(SecretValue::new)
            .ok_or_else(|| StoreError::malformed(key.as_str(), "secret has no string value"))
    }

    #[tracing::instrument(skip(self, value), fields(region = ?self.options.region))]
    async fn put(&self, key: &StorageKey, value: &SecretValue, mode: PutMode) -> StoreResult<()> {
        let PutMode::CreateOnly = mode;

        // The value travels through an owner-only temp file, never argv
        let mut payload = tempfile::Builder::new()
            .prefix(".seedvault-")
            .tempfile()
            .map_err(|e| StoreError::backend_with_source(BACKEND, "failed to stage secret", e))?;
        payload
            .write_all(value.expose().as_bytes())
            .and_then(|()| payload.flush())
            .map_err(|e| StoreError::backend_with_source(BACKEND, "failed to stage secret", e))?;
        let secret_arg = format!("file://{}", payload.path().display());

        let args = self.args(&[
            "secretsmanager",
            "create-secret",
            "--name",
            key.as_str(),
            "--secret-string",
            &secret_arg,
        ]);
        self.run(key.as_str(), args).await?;
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_executor::testing::ScriptedCommandExecutor;
    use seedvault_core::{Namespace, SecretName};

    fn key() -> StorageKey {
        StorageKey::derive(
            &SecretName::new("RDSPassword").unwrap(),
            &Namespace::new("prod").unwrap(),
        )
    }

    fn store(executor: Arc<ScriptedCommandExecutor>) -> AwsCliSecretStore {
        AwsCliSecretStore::with_executor(
            AwsCliOptions {
                region: Some("eu-west-1".to_string()),
                ..Default::default()
            },
            executor,
        )
    }

    #[tokio::test]
    async fn test_get_returns_secret_string() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.respond(
            "secretsmanager get-secret-value",
            r#"{"ARN":"arn:aws:secretsmanager:eu-west-1:1:secret:RDSPassword-prod","Name":"RDSPassword-prod","SecretString":"s3cr3t"}"#,
        );

        let value = store(executor.clone()).get(&key()).await.unwrap();

        assert_eq!(value.expose(), "s3cr3t");
        let call = &executor.calls()[0];
        assert_eq!(call.cmd, "aws");
        assert!(call.args.windows(2).any(|w| w == ["--secret-id", "RDSPassword-prod"]));
        assert!(call.args.windows(2).any(|w| w == ["--region", "eu-west-1"]));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.fail(
            "secretsmanager get-secret-value",
            "An error occurred (ResourceNotFoundException) when calling the GetSecretValue operation: Secrets Manager can't find the specified secret.",
            254,
        );

        let err = store(executor).get(&key()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_access_denied_is_not_not_found() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.fail(
            "secretsmanager get-secret-value",
            "An error occurred (AccessDeniedException) when calling the GetSecretValue operation",
            254,
        );

        let err = store(executor).get(&key()).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_binary_secret_is_malformed() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.respond(
            "secretsmanager get-secret-value",
            r#"{"Name":"RDSPassword-prod","SecretBinary":"AAEC"}"#,
        );

        let err = store(executor).get(&key()).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_create_passes_value_through_file() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.respond("secretsmanager create-secret", r#"{"Name":"RDSPassword-prod"}"#);

        store(executor.clone())
            .put(&key(), &SecretValue::new("s3cr3t!"), PutMode::CreateOnly)
            .await
            .unwrap();

        let call = &executor.calls()[0];
        assert!(call.args.iter().all(|a| !a.contains("s3cr3t!")));
        assert_eq!(call.file_contents, vec!["s3cr3t!".to_string()]);
    }

    #[tokio::test]
    async fn test_create_conflict_is_already_exists() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.fail(
            "secretsmanager create-secret",
            "An error occurred (ResourceExistsException) when calling the CreateSecret operation: The operation failed because the secret RDSPassword-prod already exists.",
            254,
        );

        let err = store(executor)
            .put(&key(), &SecretValue::new("x"), PutMode::CreateOnly)
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_classify_transient_failures() {
        assert!(classify_failure("k", "An error occurred (ThrottlingException)").is_retryable());
        assert!(
            classify_failure("k", "Could not connect to the endpoint URL: \"https://x\"")
                .is_retryable()
        );
        assert!(!classify_failure("k", "something unexpected").is_retryable());
    }

    #[test]
    fn test_error_code_is_read_from_the_cli_prefix() {
        assert_eq!(
            error_code("\nAn error occurred (ThrottlingException) when calling the GetSecretValue operation (reached max retries: 2): Rate exceeded"),
            Some("ThrottlingException")
        );
        assert_eq!(error_code("Unable to locate credentials."), None);
        assert_eq!(error_code("An error occurred () when calling"), None);
    }

    #[test]
    fn test_not_found_requires_the_error_code() {
        let denied = classify_failure(
            "k",
            "An error occurred (AccessDeniedException) when calling the GetSecretValue operation: \
             not authorized, a ResourceNotFoundException would have been returned otherwise",
        );
        assert!(!denied.is_not_found());
        assert!(matches!(denied, StoreError::PermissionDenied { .. }));

        let kms = classify_failure(
            "k",
            "An error occurred (DecryptionFailure) when calling the GetSecretValue operation: \
             KMS raised ResourceNotFoundException for the key",
        );
        assert!(!kms.is_not_found());
        assert!(matches!(kms, StoreError::Backend { .. }));

        let uncoded = classify_failure("k", "botocore: ResourceNotFoundException ResourceExistsException");
        assert!(!uncoded.is_not_found());
        assert!(!uncoded.is_already_exists());
    }

    #[test]
    fn test_classify_client_failures() {
        assert!(matches!(
            classify_failure("k", "Unable to locate credentials. You can configure credentials by running \"aws configure\"."),
            StoreError::PermissionDenied { .. }
        ));
        assert!(classify_failure("k", "Read timeout on endpoint URL: \"https://x\"").is_retryable());
    }

    #[tokio::test]
    async fn test_verify_account() {
        let executor = Arc::new(ScriptedCommandExecutor::new());
        executor.respond(
            "sts get-caller-identity",
            r#"{"UserId":"AIDA","Account":"123456789012","Arn":"arn:aws:iam::123456789012:user/ci"}"#,
        );
        let store = store(executor);

        assert!(store.verify_account("123456789012").await.is_ok());
        let err = store.verify_account("999999999999").await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }
}

//! Secret store backends for seedvault
//!
//! Every backend implements [`SecretStore`]: a read that distinguishes
//! "not found" from every other failure, and a create-only write.
//!
//! - [`MemorySecretStore`]: in-process map, used by tests and dry runs.
//! - [`FileSecretStore`]: one JSON document guarded by an advisory lock.
//! - [`AwsCliSecretStore`]: AWS Secrets Manager through the `aws` binary.
//! - [`TimeoutStore`]: wraps any of the above with a per-call deadline.

pub mod aws;
pub mod command_executor;
pub mod file;
pub mod memory;
pub mod store;
pub mod timeout;

pub use aws::{AwsCliOptions, AwsCliSecretStore};
pub use command_executor::{CommandExecutor, SystemCommandExecutor};
pub use file::FileSecretStore;
pub use memory::MemorySecretStore;
pub use store::{PutMode, SecretStore, StoreCapabilities};
pub use timeout::TimeoutStore;

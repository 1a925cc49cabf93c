//! Configuration for seedvault
//!
//! A [`ProvisionerConfig`] is assembled by [`ConfigLoader`] from a JSON file,
//! environment variables and explicit overrides, in that order of precedence,
//! and is validated before it is returned.

pub mod config;
pub mod loader;

pub use config::{ConfigFile, ProvisionerConfig, SecretDeclaration, StoreSettings};
pub use loader::{ConfigLoader, ConfigOverrides};

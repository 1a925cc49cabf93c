//! Core domain types, errors, and constants for `seedvault`.
//!
//! This crate establishes the vocabulary shared by every other crate in the
//! workspace: what a secret request looks like, how storage keys are derived,
//! and how failures are classified.
//!
//! ## Key Components
//!
//! - **`errors`**: The primary `Error` enum, the `StoreError` taxonomy used by
//!   secret store backends, and the `Result` aliases.
//! - **`types`**: Validated newtypes (`SecretName`, `Namespace`, `StorageKey`),
//!   generation policies, and the `SecretValue` wrapper that redacts and
//!   zeroizes credential material.
//! - **`constants`**: Shared static values such as the default symbol set and
//!   environment variable names.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, StoreError, StoreResult, Validate},
    types::*,
};

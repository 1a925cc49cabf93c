//! Domain types for secret provisioning
//!
//! Everything crossing a crate boundary is one of these types rather than a
//! bare `String`, so an unvalidated name can never reach a secret store.

mod newtypes;
mod policy;
mod secret;

pub use newtypes::{Namespace, SecretName, StorageKey};
pub use policy::{CharacterPolicy, SymbolSet};
pub use secret::{ResolvedSecret, SecretOrigin, SecretRequest, SecretValue};

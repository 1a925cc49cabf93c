//! Get-or-create provisioning of generated secrets
//!
//! [`SecretProvisioner::resolve`] returns the value stored for a logical
//! secret, generating and storing a new one only when the store definitely
//! holds nothing for it. Running the same provisioning twice yields the same
//! credentials.

pub mod generator;
pub mod provisioner;


pub use generator::{CredentialGenerator, OsRngGenerator};
pub use provisioner::SecretProvisioner;

//! Secret requests, values, and resolution results

use super::{CharacterPolicy, SecretName, StorageKey};
use crate::constants::{MAX_SECRET_LENGTH, RECOMMENDED_MAX_LENGTH, RECOMMENDED_MIN_LENGTH};
use crate::errors::{Result, Validate};
use serde::Serialize;
use std::fmt;
use zeroize::Zeroizing;

/// Credential material.
///
/// The payload is wiped from memory on drop and never shows up in `Debug`
/// output; callers have to ask for it explicitly with [`SecretValue::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(Zeroizing<String>);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        SecretValue(Zeroizing::new(value.into()))
    }

    /// Borrow the plaintext
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters, not bytes
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        SecretValue::new(value)
    }
}

/// A request to resolve one logical secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequest {
    pub name: SecretName,
    pub length: usize,
    pub policy: CharacterPolicy,
}

impl SecretRequest {
    /// Create a request, rejecting a zero or absurdly large length
    pub fn new(name: SecretName, length: usize, policy: CharacterPolicy) -> Result<Self> {
        let length = Validate::in_range(length, 1, MAX_SECRET_LENGTH, "length")?;
        Ok(Self {
            name,
            length,
            policy,
        })
    }

    /// Re-check a request that may have been built without [`SecretRequest::new`]
    pub fn validate(&self) -> Result<()> {
        Validate::in_range(self.length, 1, MAX_SECRET_LENGTH, "length")?;
        Ok(())
    }

    /// Whether the length is outside the range usually wanted for passwords
    pub fn length_is_unusual(&self) -> bool {
        !(RECOMMENDED_MIN_LENGTH..=RECOMMENDED_MAX_LENGTH).contains(&self.length)
    }
}

/// How a resolved value came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretOrigin {
    /// The store already held a value
    Existing,
    /// This resolution generated and stored the value
    Created,
    /// This resolution tried to create the value but another writer won
    Adopted,
}

impl fmt::Display for SecretOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretOrigin::Existing => write!(f, "existing"),
            SecretOrigin::Created => write!(f, "created"),
            SecretOrigin::Adopted => write!(f, "adopted"),
        }
    }
}

/// The outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct ResolvedSecret {
    pub storage_key: StorageKey,
    pub value: SecretValue,
    pub origin: SecretOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_secret_value_debug_is_redacted() {
        let value = SecretValue::new("hunter2");
        assert_eq!(format!("{value:?}"), "SecretValue(***)");
        assert_eq!(value.expose(), "hunter2");
    }

    #[test]
    fn test_request_rejects_zero_length() {
        let name = SecretName::new("RDSPassword").unwrap();
        assert!(SecretRequest::new(name.clone(), 0, CharacterPolicy::AlphanumericOnly).is_err());
        assert!(SecretRequest::new(
            name.clone(),
            MAX_SECRET_LENGTH + 1,
            CharacterPolicy::AlphanumericOnly
        )
        .is_err());
        assert!(SecretRequest::new(name, 20, CharacterPolicy::AlphanumericOnly).is_ok());
    }

    #[test]
    fn test_validate_catches_hand_built_requests() {
        let request = SecretRequest {
            name: SecretName::new("RDSPassword").unwrap(),
            length: 0,
            policy: CharacterPolicy::AlphanumericOnly,
        };
        assert!(matches!(
            request.validate(),
            Err(Error::InvalidRequest { ref field, .. }) if field == "length"
        ));
    }

    #[test]
    fn test_unusual_length() {
        let name = SecretName::new("pin").unwrap();
        let short = SecretRequest::new(name.clone(), 4, CharacterPolicy::AlphanumericOnly).unwrap();
        let normal = SecretRequest::new(name, 20, CharacterPolicy::AlphanumericOnly).unwrap();
        assert!(short.length_is_unusual());
        assert!(!normal.length_is_unusual());
    }

    #[test]
    fn test_char_count_counts_characters() {
        assert_eq!(SecretValue::new("ab").char_count(), 2);
        assert!(SecretValue::new("").is_empty());
    }
}

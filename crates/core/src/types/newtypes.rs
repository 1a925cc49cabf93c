//! Newtype wrappers for secret identifiers

use crate::constants::{NAME_EXTRA_CHARS, STORAGE_KEY_SEPARATOR};
use crate::errors::{Error, Result, Validate};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Deref;
use std::str::FromStr;

const MAX_IDENTIFIER_LENGTH: usize = 256;

fn validate_identifier(value: &str, field_name: &str) -> Result<()> {
    Validate::not_empty(value, field_name)?;
    Validate::in_range(value.len(), 1, MAX_IDENTIFIER_LENGTH, field_name)?;
    Validate::with_predicate(
        value,
        |v| {
            v.chars()
                .all(|c| c.is_ascii_alphanumeric() || NAME_EXTRA_CHARS.contains(c))
        },
        field_name,
        "must contain only ASCII letters, digits, and the characters /_+=.@-",
    )?;
    Ok(())
}

/// A validated logical secret name, e.g. `RDSPassword`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretName(String);

impl SecretName {
    /// Create a new SecretName with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name, "secret name")?;
        Ok(SecretName(name))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated deployment namespace, e.g. `prod`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Create a new Namespace with validation
    pub fn new(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        validate_identifier(&namespace, "namespace")?;
        Ok(Namespace(namespace))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The namespaced key a logical secret is persisted under.
///
/// Always `name + "-" + namespace`; there is no other constructor, so every
/// key reaching a store was derived the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the storage key for `name` inside `namespace`
    pub fn derive(name: &SecretName, namespace: &Namespace) -> Self {
        StorageKey(format!(
            "{}{}{}",
            name.as_str(),
            STORAGE_KEY_SEPARATOR,
            namespace.as_str()
        ))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $ty {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    };
}

macro_rules! validated_newtype_impls {
    ($ty:ident) => {
        string_newtype_impls!($ty);

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = Error;

            fn try_from(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(s: String) -> Result<Self> {
                Self::new(s)
            }
        }
    };
}

validated_newtype_impls!(SecretName);
validated_newtype_impls!(Namespace);
string_newtype_impls!(StorageKey);

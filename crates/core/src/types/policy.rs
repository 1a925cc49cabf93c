//! Character policies for generated credentials

use crate::constants::DEFAULT_SYMBOLS;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A validated, de-duplicated set of printable ASCII symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SymbolSet(String);

impl SymbolSet {
    /// Create a symbol set, dropping repeated characters.
    ///
    /// Every character must be printable ASCII punctuation; letters, digits,
    /// whitespace and non-ASCII characters are rejected.
    pub fn new(symbols: impl AsRef<str>) -> Result<Self> {
        let mut unique = String::new();
        for c in symbols.as_ref().chars() {
            if !c.is_ascii_punctuation() {
                return Err(Error::invalid_request(
                    "symbols",
                    format!("'{}' is not a printable ASCII symbol", c.escape_default()),
                ));
            }
            if !unique.contains(c) {
                unique.push(c);
            }
        }
        if unique.is_empty() {
            return Err(Error::invalid_request("symbols", "cannot be empty"));
        }
        Ok(SymbolSet(unique))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        SymbolSet(DEFAULT_SYMBOLS.to_string())
    }
}

impl TryFrom<String> for SymbolSet {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<SymbolSet> for String {
    fn from(value: SymbolSet) -> Self {
        value.0
    }
}

/// Which characters a generated credential may contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CharacterPolicy {
    /// ASCII letters and digits
    AlphanumericOnly,
    /// ASCII letters, digits, and the given symbols
    AlphanumericPlusSymbols {
        #[serde(default)]
        symbols: SymbolSet,
    },
}

impl CharacterPolicy {
    /// Letters, digits, and the default symbol set
    pub fn with_default_symbols() -> Self {
        CharacterPolicy::AlphanumericPlusSymbols {
            symbols: SymbolSet::default(),
        }
    }

    /// The full alphabet a generator draws from, without duplicates
    pub fn alphabet(&self) -> Vec<u8> {
        let mut alphabet = ALPHANUMERIC.to_vec();
        if let CharacterPolicy::AlphanumericPlusSymbols { symbols } = self {
            alphabet.extend(symbols.as_str().bytes());
        }
        alphabet
    }

    /// Whether `c` may appear in a credential generated under this policy
    pub fn allows(&self, c: char) -> bool {
        match self {
            CharacterPolicy::AlphanumericOnly => c.is_ascii_alphanumeric(),
            CharacterPolicy::AlphanumericPlusSymbols { symbols } => {
                c.is_ascii_alphanumeric() || symbols.as_str().contains(c)
            }
        }
    }
}

impl Default for CharacterPolicy {
    fn default() -> Self {
        Self::with_default_symbols()
    }
}

impl Display for CharacterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterPolicy::AlphanumericOnly => write!(f, "alphanumeric"),
            CharacterPolicy::AlphanumericPlusSymbols { symbols } => {
                write!(f, "alphanumeric+symbols({})", symbols.as_str())
            }
        }
    }
}

impl FromStr for CharacterPolicy {
    type Err = Error;

    /// Parses `alphanumeric` or `symbols`; the latter uses the default set
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alphanumeric" => Ok(CharacterPolicy::AlphanumericOnly),
            "symbols" => Ok(CharacterPolicy::with_default_symbols()),
            other => Err(Error::invalid_request(
                "policy",
                format!("unknown policy '{other}', expected 'alphanumeric' or 'symbols'"),
            )),
        }
    }
}

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for seedvault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for secret store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Core error type for seedvault operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Secret store failures other than "not found"
    #[error("secret store error: {0}")]
    Store(#[from] StoreError),

    /// The random source could not produce credential material
    #[error("failed to generate credential: {message}")]
    Generation { message: String },

    /// A secret request failed validation
    #[error("invalid {field}: {message}")]
    InvalidRequest { field: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Command execution errors
    #[error("{}", format_command_error(.command, .args, .message, .exit_code))]
    CommandExecution {
        command: String,
        args: Vec<String>,
        message: String,
        exit_code: Option<i32>,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Permission denied errors
    #[error("permission denied for {operation}: {message}")]
    PermissionDenied { operation: String, message: String },
}

/// Failure modes of a secret store backend.
///
/// `NotFound` is the only variant that may lead to a credential being created.
/// Every other variant is terminal for the resolution that observed it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No value is stored under the key
    #[error("secret '{key}' not found")]
    NotFound { key: String },

    /// A create-only write found an existing value
    #[error("secret '{key}' already exists")]
    AlreadyExists { key: String },

    /// The caller is not allowed to read or write the key
    #[error("permission denied for secret '{key}': {message}")]
    PermissionDenied { key: String, message: String },

    /// Transient service or network failure
    #[error("secret store unavailable: {message}")]
    Unavailable { message: String },

    /// A store call exceeded its deadline
    #[error("secret store {operation} for '{key}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        key: String,
        duration: Duration,
    },

    /// The store rejected the key itself
    #[error("invalid storage key '{key}': {message}")]
    InvalidKey { key: String, message: String },

    /// The stored payload is unusable (empty placeholder, wrong encoding, ...)
    #[error("stored secret '{key}' is malformed: {message}")]
    Malformed { key: String, message: String },

    /// Any other backend failure
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn format_command_error(
    command: &str,
    args: &[String],
    message: &str,
    exit_code: &Option<i32>,
) -> String {
    let args_str = args.join(" ");
    let invocation = if args_str.is_empty() {
        command.to_string()
    } else {
        format!("{command} {args_str}")
    };
    match exit_code {
        Some(code) => format!("command '{invocation}' failed with exit code {code}: {message}"),
        None => format!("command '{invocation}' failed: {message}"),
    }
}

// Conversion implementations
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a credential generation error
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Error::Generation {
            message: message.into(),
        }
    }

    /// Create a request validation error
    #[must_use]
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a command execution error
    #[must_use]
    pub fn command_execution(
        command: impl Into<String>,
        args: Vec<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Error::CommandExecution {
            command: command.into(),
            args,
            message: message.into(),
            exit_code,
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a permission denied error
    #[must_use]
    pub fn permission_denied(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PermissionDenied {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

impl StoreError {
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        StoreError::NotFound { key: key.into() }
    }

    #[must_use]
    pub fn already_exists(key: impl Into<String>) -> Self {
        StoreError::AlreadyExists { key: key.into() }
    }

    #[must_use]
    pub fn permission_denied(key: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::PermissionDenied {
            key: key.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timeout(operation: impl Into<String>, key: impl Into<String>, duration: Duration) -> Self {
        StoreError::Timeout {
            operation: operation.into(),
            key: key.into(),
            duration,
        }
    }

    #[must_use]
    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Malformed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a backend error without an underlying source
    #[must_use]
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Backend {
            backend: backend.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping an underlying source
    #[must_use]
    pub fn backend_with_source(
        backend: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StoreError::Backend {
            backend: backend.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Whether a caller may reasonably try the same call again
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. } | StoreError::Timeout { .. })
    }
}

/// Validation helpers shared by the newtype constructors
pub struct Validate;

impl Validate {
    /// Validate that a string is not empty
    pub fn not_empty(value: &str, field_name: &str) -> Result<()> {
        if value.is_empty() {
            Err(Error::invalid_request(field_name, "cannot be empty"))
        } else {
            Ok(())
        }
    }

    /// Validate that a number is within a range
    pub fn in_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<T>
    where
        T: PartialOrd + fmt::Display + Copy,
    {
        if value < min || value > max {
            Err(Error::invalid_request(
                field_name,
                format!("value {value} is not in range [{min}, {max}]"),
            ))
        } else {
            Ok(value)
        }
    }

    /// Validate using a custom predicate
    pub fn with_predicate<T, F>(value: T, predicate: F, field_name: &str, message: &str) -> Result<T>
    where
        F: FnOnce(&T) -> bool,
    {
        if predicate(&value) {
            Ok(value)
        } else {
            Err(Error::invalid_request(field_name, message))
        }
    }
}

/// Constants used throughout the seedvault codebase
// Symbols allowed in generated credentials unless a request overrides them
pub const DEFAULT_SYMBOLS: &str = "!#$%&*()-_=+[]{}<>:?";

// Separator between a logical secret name and its namespace in a storage key
pub const STORAGE_KEY_SEPARATOR: &str = "-";

// Generated credential lengths
pub const MAX_SECRET_LENGTH: usize = 4096;
pub const RECOMMENDED_MIN_LENGTH: usize = 8;
pub const RECOMMENDED_MAX_LENGTH: usize = 64;
pub const DEFAULT_SECRET_LENGTH: usize = 20;

// Characters permitted in secret names and namespaces besides ASCII alphanumerics
pub const NAME_EXTRA_CHARS: &str = "/_+=.@-";

// Configuration file
pub const DEFAULT_CONFIG_FILENAME: &str = "seedvault.json";

// Environment variable names
pub const SEEDVAULT_NAMESPACE_VAR: &str = "SEEDVAULT_NAMESPACE";
pub const SEEDVAULT_REGION_VAR: &str = "SEEDVAULT_REGION";
pub const SEEDVAULT_STORE_TIMEOUT_VAR: &str = "SEEDVAULT_STORE_TIMEOUT_MS";
pub const SEEDVAULT_LOG_VAR: &str = "SEEDVAULT_LOG";

// Store call timeout applied when nothing else is configured
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 10_000;

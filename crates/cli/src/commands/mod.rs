use clap::{Args, Subcommand, ValueEnum};
use seedvault_config::{ConfigOverrides, StoreSettings};
use std::path::PathBuf;

pub mod provision;
pub mod resolve;
pub mod status;

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file (defaults to the nearest seedvault.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Namespace appended to every storage key
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Region passed to the secret store
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Secret store backend
    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreKind>,

    /// Secrets file for the file backend
    #[arg(long, global = true, value_name = "PATH")]
    pub store_path: Option<PathBuf>,

    /// Retry transient store failures this many times
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u32,
}

impl GlobalArgs {
    pub fn overrides(&self) -> eyre::Result<ConfigOverrides> {
        let store = match (self.store, &self.store_path) {
            (None, None) => None,
            (None | Some(StoreKind::File), Some(path)) => Some(StoreSettings::File { path: path.clone() }),
            (Some(StoreKind::File), None) => {
                eyre::bail!("--store file requires --store-path")
            }
            (Some(kind), Some(_)) => {
                eyre::bail!("--store-path only applies to the file backend, not {kind:?}")
            }
            (Some(StoreKind::Memory), None) => Some(StoreSettings::Memory),
            (Some(StoreKind::Aws), None) => Some(StoreSettings::Aws { profile: None }),
        };

        Ok(ConfigOverrides {
            namespace: self.namespace.clone(),
            region: self.region.clone(),
            store,
            store_timeout: None,
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
    Aws,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line per secret
    #[default]
    Text,
    /// A JSON array
    Json,
    /// Shell `export` statements
    Env,
}

/// `status` never prints values, so it has no env rendering
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFormat {
    /// One line per secret
    #[default]
    Text,
    /// A JSON array
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Letters and digits only
    Alphanumeric,
    /// Letters, digits and symbols
    Symbols,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve one secret, creating it if it does not exist yet
    Resolve {
        /// Logical secret name
        name: String,

        /// Length of a newly generated value
        #[arg(short, long)]
        length: Option<usize>,

        /// Characters a newly generated value may use
        #[arg(short, long, value_enum)]
        policy: Option<PolicyKind>,

        /// Symbol set for the symbols policy
        #[arg(long, value_name = "SET")]
        symbols: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Print the secret value instead of a mask
        #[arg(long)]
        reveal: bool,
    },

    /// Resolve every secret declared in the configuration file
    Provision {
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Print secret values instead of a mask
        #[arg(long)]
        reveal: bool,
    },

    /// Show which declared secrets exist, without creating any
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: StatusFormat,
    },
}

impl Commands {
    pub async fn execute(self, global: &GlobalArgs) -> eyre::Result<()> {
        match self {
            Commands::Resolve {
                name,
                length,
                policy,
                symbols,
                format,
                reveal,
            } => {
                resolve::execute(
                    global,
                    resolve::ResolveArgs {
                        name,
                        length,
                        policy,
                        symbols,
                    },
                    format,
                    reveal,
                )
                .await
            }
            Commands::Provision { format, reveal } => {
                provision::execute(global, format, reveal).await
            }
            Commands::Status { format } => status::execute(global, format).await,
        }
    }
}

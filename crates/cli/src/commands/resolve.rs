use super::{GlobalArgs, OutputFormat, PolicyKind};
use crate::context::RunContext;
use crate::output::{write_outcomes, Outcome};
use seedvault_core::{
    CharacterPolicy, SecretName, SecretRequest, SymbolSet, DEFAULT_SECRET_LENGTH,
};

pub struct ResolveArgs {
    pub name: String,
    pub length: Option<usize>,
    pub policy: Option<PolicyKind>,
    pub symbols: Option<String>,
}

pub async fn execute(
    global: &GlobalArgs,
    args: ResolveArgs,
    format: OutputFormat,
    reveal: bool,
) -> eyre::Result<()> {
    let context = RunContext::build(global).await?;
    let name = SecretName::new(args.name)?;

    // Flags win over the declaration in the configuration file
    let declared = context.config.declaration(&name);
    let length = args
        .length
        .or(declared.map(|d| d.length))
        .unwrap_or(DEFAULT_SECRET_LENGTH);
    let policy = match (args.policy, args.symbols) {
        (Some(PolicyKind::Alphanumeric), Some(_)) => {
            eyre::bail!("--symbols cannot be combined with --policy alphanumeric")
        }
        (Some(PolicyKind::Alphanumeric), None) => CharacterPolicy::AlphanumericOnly,
        (_, Some(symbols)) => CharacterPolicy::AlphanumericPlusSymbols {
            symbols: SymbolSet::new(symbols)?,
        },
        (Some(PolicyKind::Symbols), None) => CharacterPolicy::with_default_symbols(),
        (None, None) => declared.map(|d| d.policy.clone()).unwrap_or_default(),
    };

    let request = SecretRequest::new(name, length, policy)?;
    let result = context.resolve(&request).await;

    let outcome = Outcome {
        name: &request.name,
        storage_key: context.provisioner.storage_key(&request.name).to_string(),
        result: &result,
    };
    write_outcomes(&[outcome], format, reveal)?;

    result?;
    Ok(())
}

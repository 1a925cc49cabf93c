use super::{GlobalArgs, OutputFormat};
use crate::context::RunContext;
use crate::output::{write_outcomes, Outcome};
use seedvault_utils::tracing::provision_span;
use tracing::Instrument;

pub async fn execute(global: &GlobalArgs, format: OutputFormat, reveal: bool) -> eyre::Result<()> {
    let context = RunContext::build(global).await?;
    let requests = context.config.requests()?;
    if requests.is_empty() {
        eyre::bail!("no secrets are declared in the configuration");
    }

    let span = provision_span(context.config.namespace.as_str(), requests.len());
    let results = context.resolve_all(&requests).instrument(span).await?;

    let outcomes: Vec<Outcome<'_>> = requests
        .iter()
        .zip(&results)
        .map(|(request, result)| Outcome {
            name: &request.name,
            storage_key: context.provisioner.storage_key(&request.name).to_string(),
            result,
        })
        .collect();
    write_outcomes(&outcomes, format, reveal)?;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        eyre::bail!("{failed} of {} secrets could not be resolved", results.len());
    }
    Ok(())
}

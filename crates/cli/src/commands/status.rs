use super::{GlobalArgs, StatusFormat};
use crate::context::RunContext;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretStatus {
    name: String,
    storage_key: String,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Report which declared secrets exist. Never creates anything and never
/// prints values.
pub async fn execute(global: &GlobalArgs, format: StatusFormat) -> eyre::Result<()> {
    let context = RunContext::build(global).await?;

    let mut statuses = Vec::with_capacity(context.config.secrets.len());
    for declaration in &context.config.secrets {
        let (state, error) = match context.provisioner.lookup(&declaration.name).await {
            Ok(Some(_)) => ("present", None),
            Ok(None) => ("missing", None),
            Err(e) => ("error", Some(e.to_string())),
        };
        statuses.push(SecretStatus {
            name: declaration.name.to_string(),
            storage_key: context.provisioner.storage_key(&declaration.name).to_string(),
            state,
            error,
        });
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        StatusFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &statuses)?;
            writeln!(out)?;
        }
        StatusFormat::Text => {
            if statuses.is_empty() {
                writeln!(out, "No secrets declared")?;
            }
            for status in &statuses {
                match &status.error {
                    Some(error) => writeln!(out, "{} ({}): error: {error}", status.name, status.storage_key)?,
                    None => writeln!(out, "{} ({}): {}", status.name, status.storage_key, status.state)?,
                }
            }
        }
    }

    let errors = statuses.iter().filter(|s| s.error.is_some()).count();
    if errors > 0 {
        eyre::bail!("{errors} secrets could not be checked");
    }
    Ok(())
}

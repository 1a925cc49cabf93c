//! Rendering of resolution results
//!
//! Values are replaced by [`MASK`] unless the caller asked for them to be
//! revealed, and the rendered text is written through [`OutputFilter`] so no
//! known value reaches stdout by another route.

use crate::commands::OutputFormat;
use seedvault_core::{ResolvedSecret, Result, SecretName, SecretOrigin, SecretValue};
use seedvault_utils::output_filter::{OutputFilter, MASK};
use serde::Serialize;
use std::io::{self, Write};

/// One line of `resolve` or `provision` output
pub struct Outcome<'a> {
    pub name: &'a SecretName,
    pub storage_key: String,
    pub result: &'a Result<ResolvedSecret>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutcome<'a> {
    name: &'a str,
    storage_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<SecretOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Write outcomes to stdout in `format`
pub fn write_outcomes(outcomes: &[Outcome<'_>], format: OutputFormat, reveal: bool) -> io::Result<()> {
    let secrets: Vec<SecretValue> = if reveal {
        Vec::new()
    } else {
        outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|resolved| resolved.value.clone())
            .collect()
    };
    let mut rendered = Vec::new();
    render(&mut rendered, outcomes, format, reveal)?;

    let stdout = io::stdout();
    let mut out = OutputFilter::new(stdout.lock(), secrets);
    out.write_all(&rendered)?;
    out.flush()
}

fn shown(value: &SecretValue, reveal: bool) -> &str {
    if reveal {
        value.expose()
    } else {
        MASK
    }
}

fn render<W: Write>(
    out: &mut W,
    outcomes: &[Outcome<'_>],
    format: OutputFormat,
    reveal: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for outcome in outcomes {
                match outcome.result {
                    Ok(resolved) => writeln!(
                        out,
                        "{} ({}) [{}]: {}",
                        outcome.name,
                        resolved.storage_key,
                        resolved.origin,
                        shown(&resolved.value, reveal)
                    )?,
                    Err(e) => writeln!(out, "{} ({}) failed: {e}", outcome.name, outcome.storage_key)?,
                }
            }
        }
        OutputFormat::Json => {
            let entries: Vec<JsonOutcome<'_>> = outcomes
                .iter()
                .map(|outcome| match outcome.result {
                    Ok(resolved) => JsonOutcome {
                        name: outcome.name.as_str(),
                        storage_key: resolved.storage_key.as_str(),
                        origin: Some(resolved.origin),
                        value: Some(shown(&resolved.value, reveal)),
                        error: None,
                    },
                    Err(e) => JsonOutcome {
                        name: outcome.name.as_str(),
                        storage_key: &outcome.storage_key,
                        origin: None,
                        value: None,
                        error: Some(e.to_string()),
                    },
                })
                .collect();
            serde_json::to_writer_pretty(&mut *out, &entries)?;
            writeln!(out)?;
        }
        OutputFormat::Env => {
            for outcome in outcomes {
                if let Ok(resolved) = outcome.result {
                    writeln!(
                        out,
                        "export {}={}",
                        env_var_name(outcome.name),
                        shell_quote(shown(&resolved.value, reveal))
                    )?;
                }
            }
        }
    }
    Ok(())
}

/// `grafanaPassword` becomes `GRAFANA_PASSWORD`, `db/admin` becomes `DB_ADMIN`
pub fn env_var_name(name: &SecretName) -> String {
    let mut out = String::with_capacity(name.as_str().len() + 4);
    let mut previous_lower = false;
    for c in name.as_str().chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && previous_lower {
                out.push('_');
            }
            previous_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c.to_ascii_uppercase());
        } else {
            if !out.ends_with('_') {
                out.push('_');
            }
            previous_lower = false;
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedvault_core::{Error, Namespace, StorageKey, StoreError};

    fn resolved(name: &SecretName, value: &str, origin: SecretOrigin) -> Result<ResolvedSecret> {
        Ok(ResolvedSecret {
            storage_key: StorageKey::derive(name, &Namespace::new("prod").unwrap()),
            value: SecretValue::new(value),
            origin,
        })
    }

    #[test]
    fn test_env_var_names() {
        let name = |s: &str| SecretName::new(s).unwrap();
        assert_eq!(env_var_name(&name("grafanaPassword")), "GRAFANA_PASSWORD");
        assert_eq!(env_var_name(&name("RDSPassword")), "RDSPASSWORD");
        assert_eq!(env_var_name(&name("db/admin-user")), "DB_ADMIN_USER");
        assert_eq!(env_var_name(&name("2fa")), "_2FA");
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
        assert_eq!(shell_quote("$x"), "'$x'");
    }

    #[test]
    fn test_text_and_env_rendering() {
        let rds = SecretName::new("RDSPassword").unwrap();
        let grafana = SecretName::new("grafanaPassword").unwrap();
        let ok = resolved(&rds, "p@ss", SecretOrigin::Created);
        let failed: Result<ResolvedSecret> =
            Err(Error::Store(StoreError::permission_denied("grafanaPassword-prod", "denied")));
        let outcomes = [
            Outcome {
                name: &rds,
                storage_key: "RDSPassword-prod".to_string(),
                result: &ok,
            },
            Outcome {
                name: &grafana,
                storage_key: "grafanaPassword-prod".to_string(),
                result: &failed,
            },
        ];

        let mut text = Vec::new();
        render(&mut text, &outcomes, OutputFormat::Text, true).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("RDSPassword (RDSPassword-prod) [created]: p@ss"));
        assert!(text.contains("grafanaPassword (grafanaPassword-prod) failed"));

        let mut masked = Vec::new();
        render(&mut masked, &outcomes, OutputFormat::Text, false).unwrap();
        let masked = String::from_utf8(masked).unwrap();
        assert!(masked.contains("[created]: ********"));
        assert!(!masked.contains("p@ss"));

        let mut env = Vec::new();
        render(&mut env, &outcomes, OutputFormat::Env, true).unwrap();
        assert_eq!(String::from_utf8(env).unwrap(), "export RDSPASSWORD='p@ss'\n");
    }

    #[test]
    fn test_json_rendering_is_masked() {
        let rds = SecretName::new("RDSPassword").unwrap();
        let ok = resolved(&rds, "hunter2hunter2", SecretOrigin::Existing);
        let outcomes = [Outcome {
            name: &rds,
            storage_key: "RDSPassword-prod".to_string(),
            result: &ok,
        }];

        let mut buf = Vec::new();
        render(&mut buf, &outcomes, OutputFormat::Json, false).unwrap();
        let rendered = String::from_utf8(buf).unwrap();

        assert!(!rendered.contains("hunter2hunter2"));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0]["storageKey"], "RDSPassword-prod");
        assert_eq!(parsed[0]["origin"], "existing");
        assert_eq!(parsed[0]["value"], "********");
    }
}

use seedvault_core::SEEDVAULT_LOG_VAR;
use ::tracing::{span, Level, Span};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing system
///
/// The filter comes from `SEEDVAULT_LOG`, then `RUST_LOG`, then `default_level`.
/// Output goes to stderr so that stdout stays clean for exported secrets.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = match EnvFilter::try_from_env(SEEDVAULT_LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
    {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one provisioning run
pub fn provision_span(namespace: &str, total_secrets: usize) -> Span {
    span!(Level::INFO, "provision", namespace = %namespace, total_secrets = %total_secrets)
}

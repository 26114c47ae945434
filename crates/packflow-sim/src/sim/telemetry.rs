use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Defaults to `info`; `RUST_LOG` overrides per module. Thread names are
/// included because the audit trail of a run only makes sense when each
/// event names the worker that produced it.
pub fn init_telemetry() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `level` is any `EnvFilter` directive (`"info"`, `"api=debug,info"`, ...).
///
/// With `prefer_level`, `level` wins and `RUST_LOG` is only the fallback when
/// `level` does not parse. Without it, `RUST_LOG` wins and `level` is the
/// fallback.
pub fn init(level: &str, prefer_level: bool) -> anyhow::Result<()> {
    let filter = build_filter(level, prefer_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {e}"))?;

    Ok(())
}

fn build_filter(level: &str, prefer_level: bool) -> anyhow::Result<EnvFilter> {
    if prefer_level {
        match EnvFilter::try_new(level) {
            Ok(filter) => Ok(filter),
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                anyhow!("invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}")
            }),
        }
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))
    }
}

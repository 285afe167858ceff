//! Log output.
//!
//! Everything in the crate emits `tracing` events; this installs the
//! subscriber that prints them. Call once, early in `main`.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ServerConfig};

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` directives come from `config.log_filter`. If they do not parse,
/// the filter falls back to `info` and says so. If a global subscriber is
/// already installed, that one stays and a warning goes to it.
pub fn init(config: &ServerConfig) {
    let (filter, rejected) = match EnvFilter::try_new(&config.log_filter) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = installed {
        tracing::warn!("keeping the existing log subscriber: {e}");
    }

    if let Some(e) = rejected {
        tracing::warn!(filter = %config.log_filter, "ignoring invalid log filter: {e}");
    }
}

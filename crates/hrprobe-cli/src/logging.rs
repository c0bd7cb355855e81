//! `tracing` subscriber setup

use crate::commands::LogFormat;
use crate::config::Verbosity;
use crate::error::{CliError, CliResult};
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Filter from `RUST_LOG` when set, otherwise from the verbosity level
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()))
}

/// Install the global subscriber; logs go to stderr
pub fn init(verbosity: Verbosity, format: LogFormat) -> CliResult<()> {
    let registry = tracing_subscriber::registry().with(env_filter(verbosity));
    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| CliError::config(format!("cannot install log subscriber: {e}")))
}

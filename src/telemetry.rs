//! Process-wide `tracing` setup.

use std::io::IsTerminal;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum TracingInitError {
    #[error("Tracing subscriber already initialised")]
    AlreadyInitialised,

    #[error("Failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Installs a formatted subscriber filtered by `RUST_LOG` (default `info`).
///
/// Training progress is emitted under the `marl_ctde::training` target.
pub fn init_tracing() -> Result<(), TracingInitError> {
    INITIALISED
        .set(())
        .map_err(|_| TracingInitError::AlreadyInitialised)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingInitError::Install(e.to_string()))
}

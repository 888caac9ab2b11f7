//! Process-wide `tracing` subscriber setup.
//!
//! Diagnostics go to stderr so they never mix with command output on stdout.
//! `RUST_LOG`, when set, wins over the level passed in.
//!
//! Initialization happens at most once per process. Asking again with the
//! same level is a no-op, asking with a different one is an error.

use crate::error::{Result, SprintError};
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static LOGGING_STATE: OnceCell<&'static str> = OnceCell::new();

pub fn init_logging(level: &str) -> Result<()> {
    let normalized = normalize_level(level)?;

    let active = LOGGING_STATE.get_or_try_init(|| -> Result<&'static str> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("sprint={normalized}")));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|err| SprintError::Logging(format!("failed to install subscriber: {err}")))?;
        tracing::debug!("logging initialized at {normalized}");
        Ok(normalized)
    })?;

    if *active != normalized {
        return Err(SprintError::Logging(format!(
            "already initialized with level `{active}`; refusing to switch to `{normalized}`"
        )));
    }
    Ok(())
}

/// Level logging was initialized with, if any.
pub fn logging_level() -> Option<&'static str> {
    LOGGING_STATE.get().copied()
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(SprintError::Logging(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        ))),
    }
}

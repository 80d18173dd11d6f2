//! Tracing subscriber setup.
//!
//! Completion runs inside a shell's completion hook, so stderr noise is
//! visible to the user. The default level is `warn`; `COMPSPEC_DEBUG` or
//! `--debug` raise it to `debug`, and `COMPSPEC_LOG_FILE` moves the output
//! into a file.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Settings;
use crate::error::{Error, Result};

/// Environment variable holding a filter directive, e.g. `compspec=trace`.
pub const LOG_ENV: &str = "COMPSPEC_LOG";

/// The filter to install: `COMPSPEC_LOG`, then `RUST_LOG`, then a default
/// derived from `settings.debug`.
#[must_use]
pub fn env_filter(settings: &Settings) -> EnvFilter {
    let default = if settings.debug { "debug" } else { "warn" };
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. A second call leaves the first
/// subscriber in place.
///
/// # Errors
///
/// Returns [`Error::Io`] if the log file can't be opened.
pub fn init(settings: &Settings) -> Result<()> {
    let filter = env_filter(settings);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
        }
        None => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

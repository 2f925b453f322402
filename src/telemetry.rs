//! `tracing` subscriber installation.

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter,
    filter::ParseError,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Errors returned while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter directive is malformed.
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        /// Directive as supplied.
        directive: String,
        /// Parser failure.
        source: ParseError,
    },
    /// A global subscriber is already installed.
    #[error(transparent)]
    Init(#[from] TryInitError),
}

/// Installs a formatting subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; `default_directive` applies when it is unset
/// or invalid. Standard output is left to task results.
///
/// # Errors
///
/// Returns [`TelemetryError`] when `default_directive` does not parse or a
/// subscriber is already installed.
pub fn init(default_directive: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|source| TelemetryError::Filter {
            directive: default_directive.to_owned(),
            source,
        })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}


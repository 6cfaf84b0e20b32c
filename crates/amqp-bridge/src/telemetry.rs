//! Diagnostics for a single bridge invocation.
//!
//! The supervisor acts on the exit status alone, so everything emitted here
//! is informational. Events go to stderr, which supervisors capture next to
//! their own log; stdout stays free for help and version text. A bridge
//! process handles one message, so the subscriber is installed once and
//! never torn down.

use std::io::{self, IsTerminal};

use amqp_bridge_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Errors encountered while configuring diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter {
        /// Filter expression as configured.
        filter: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber on first use.
///
/// Later calls leave the installed subscriber untouched and succeed.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter does not parse or another
/// subscriber was already installed by someone else.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| {
            let subscriber = build_subscriber(config)?;
            tracing::subscriber::set_global_default(subscriber)
                .map_err(TelemetryError::Subscriber)
        })
        .map(|_| ())
}

fn build_subscriber(config: &Config) -> Result<BoxedSubscriber, TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            reason: error.to_string(),
        })?;
    let format = config.log_format();

    let subscriber: BoxedSubscriber = match format {
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(io::stderr)
                .with_ansi(false)
                .finish(),
        ),
        LogFormat::Compact => Box::new(
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(io::stderr)
                .with_ansi(colour_output(format))
                .finish(),
        ),
    };
    Ok(subscriber)
}

// Escape codes would end up verbatim in captured supervisor logs.
fn colour_output(format: LogFormat) -> bool {
    !format.is_structured() && io::stderr().is_terminal()
}

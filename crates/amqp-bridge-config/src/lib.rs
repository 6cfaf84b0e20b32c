//! Shared configuration for the AMQP command-line bridge.
//!
//! Values are layered by `ortho_config`: built-in defaults, configuration
//! files, `AMQP_BRIDGE_*` environment variables, and finally command-line
//! flags. The bridge only ever receives configuration flags ahead of the
//! encoded message, so the loader is fed a pre-filtered argument list.

mod defaults;
mod logging;
mod probe;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
    default_probe_outcome,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use probe::{ProbeOutcome, ProbeOutcomeParseError};

/// Resolved bridge configuration.
///
/// Every field carries a loader default. The supervisor normally passes no
/// configuration flags at all, and the loader must still produce a complete
/// configuration from the remaining layers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "AMQP_BRIDGE")]
pub struct Config {
    /// `tracing` filter expression applied to bridge diagnostics.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format used for diagnostics written to stderr.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Outcome answered by the bundled probe handler.
    #[ortho_config(default = default_probe_outcome())]
    pub probe_outcome: ProbeOutcome,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            probe_outcome: default_probe_outcome(),
        }
    }
}

impl Config {
    /// Loads configuration from the given argument list.
    ///
    /// The first element is treated as the program name, mirroring
    /// `std::env::args_os`.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Filter expression for diagnostics.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Diagnostic output format.
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Outcome reported by the probe handler.
    pub const fn probe_outcome(&self) -> ProbeOutcome {
        self.probe_outcome
    }
}

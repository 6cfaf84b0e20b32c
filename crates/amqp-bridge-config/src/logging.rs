//! Diagnostic output formats.
//!
//! Supervisors capture the bridge's stderr into their own log, one process
//! per message. JSON lines survive that capture intact and can be shipped
//! as-is; the compact format is meant for someone running the bridge by hand.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Format of the diagnostics written to stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for supervisor log capture.
    #[default]
    Json,
    /// Single-line text, coloured when stderr is a terminal.
    #[serde(alias = "text")]
    #[strum(to_string = "compact", serialize = "text")]
    Compact,
}

impl LogFormat {
    /// Whether events are emitted as machine-readable records.
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

use crate::logging::LogFormat;
use crate::probe::ProbeOutcome;

/// Default log filter expression used by the bridge.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the bridge.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the bridge.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default answer given by the probe handler.
pub fn default_probe_outcome() -> ProbeOutcome {
    ProbeOutcome::Acknowledge
}

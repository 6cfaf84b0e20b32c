use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Outcome reported by the bundled probe handler.
///
/// The probe lets operators rehearse supervisor wiring: pointing a consumer
/// at the bridge with `--probe-outcome requeue` should make the supervisor
/// requeue every message it hands over.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProbeOutcome {
    /// Acknowledge every message.
    #[default]
    #[serde(alias = "ack")]
    #[strum(to_string = "acknowledge", serialize = "ack")]
    Acknowledge,
    /// Reject every message without requeueing it.
    Reject,
    /// Reject every message and ask for redelivery.
    #[serde(alias = "requeue")]
    #[strum(to_string = "reject_and_requeue", serialize = "requeue")]
    RejectAndRequeue,
}

/// Errors encountered while parsing a [`ProbeOutcome`] from text.
pub type ProbeOutcomeParseError = strum::ParseError;

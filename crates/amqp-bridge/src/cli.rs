//! CLI argument definitions for the bridge.
//!
//! The supervisor passes exactly one token: the encoded message. Configuration
//! flags are stripped off before this parser runs.

use clap::Parser;

/// Command-line interface for the AMQP command-line bridge.
#[derive(Parser, Debug)]
#[command(
    name = "amqp-bridge",
    version,
    about = "Processes one broker message and reports its disposition as an exit status",
    after_help = "Exit status: 0 acknowledge, 3 reject, 4 reject and requeue."
)]
pub(crate) struct Cli {
    /// Base64-encoded JSON envelope handed over by the supervisor.
    #[arg(value_name = "MESSAGE")]
    pub(crate) message: String,
}

//! Probe entrypoint for the AMQP command-line bridge.
//!
//! Answers every message with the configured `probe_outcome` so operators can
//! check how their supervisor treats each exit status. Real deployments embed
//! the library and supply their own handler to [`amqp_bridge::run`].

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    amqp_bridge::run_probe(std::env::args_os(), &mut stdout, &mut stderr)
}

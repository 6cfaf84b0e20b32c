//! Exit-code bridge between a queue-consuming supervisor and a message
//! handler.
//!
//! A supervisor reads messages from a broker and spawns one process per
//! message, passing the message as a single base64-encoded JSON argument.
//! The process decodes it, hands it to a [`MessageHandler`], and reports the
//! result through its exit status alone:
//!
//! | Exit status | Supervisor action |
//! |---|---|
//! | `0` | acknowledge |
//! | `3` | reject, do not requeue |
//! | `4` | reject and requeue |
//!
//! Anything that goes wrong, from an undecodable argument to a panicking
//! handler, exits with `3`. Only a handler that explicitly asks for a
//! requeue produces `4`.
//!
//! Embed the bridge by passing your handler to [`run`]:
//!
//! ```no_run
//! use std::process::ExitCode;
//!
//! use amqp_bridge::{Envelope, Outcome, handler_fn};
//!
//! fn main() -> ExitCode {
//!     let handler = handler_fn(|envelope: &Envelope| {
//!         match envelope.body_str() {
//!             Some(_) => Ok(Outcome::Acknowledge),
//!             None => Ok(Outcome::Reject),
//!         }
//!     });
//!     amqp_bridge::run(
//!         std::env::args_os(),
//!         handler,
//!         &mut std::io::stdout(),
//!         &mut std::io::stderr(),
//!     )
//! }
//! ```
//!
//! The bridge does not enforce timeouts. If the supervisor kills the process
//! before it exits, the message's fate is up to the supervisor.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod config;
pub mod dispatch;
pub mod envelope;
mod errors;
pub mod handler;
pub mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, prepare_cli_arguments, split_config_arguments};
use errors::AppError;

#[doc(inline)]
pub use amqp_bridge_config::{Config, LogFormat, ProbeOutcome};
#[doc(inline)]
pub use dispatch::{DispatchError, Dispatcher, Disposition};
#[doc(inline)]
pub use envelope::{DecodeError, DeliveryInfo, Envelope, Properties};
#[doc(inline)]
pub use handler::{HandlerError, HandlerFn, MessageHandler, Outcome, ProbeHandler, handler_fn};

/// `tracing` target used for dispatch diagnostics.
///
/// Built from the crate path rather than the package name so that filters
/// such as `amqp_bridge=debug` match it.
pub(crate) const DISPATCH_TARGET: &str = concat!(module_path!(), "::dispatch");

/// Bundles the IO streams provided to the bridge runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct BridgeRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: IoStreams<'a, W, E>,
    loader: &'a L,
    install_telemetry: bool,
}

impl<'a, W, E, L> BridgeRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self {
            io,
            loader,
            install_telemetry: true,
        }
    }

    #[cfg(test)]
    fn without_telemetry(mut self) -> Self {
        self.install_telemetry = false;
        self
    }

    fn run<I, F, H>(&mut self, args: I, build_handler: F) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        F: FnOnce(&Config) -> H,
        H: MessageHandler,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        let cli_arguments = prepare_cli_arguments(&args, &split);

        let result = Cli::try_parse_from(cli_arguments)
            .map_err(AppError::CliUsage)
            .and_then(|cli| {
                self.loader
                    .load(&split.config_arguments)
                    .map(|config| (cli, config))
            });

        let (cli, config) = match result {
            Ok(parsed) => parsed,
            Err(error) if error.is_informational() => {
                let _ = write!(self.io.stdout, "{error}");
                let _ = self.io.stdout.flush();
                return ExitCode::SUCCESS;
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                return Disposition::Reject.into();
            }
        };

        if self.install_telemetry {
            if let Err(error) = telemetry::initialise(&config) {
                let _ = writeln!(self.io.stderr, "warning: {error}");
            }
        }

        Dispatcher::new(build_handler(&config))
            .dispatch(&cli.message)
            .into()
    }
}

/// Runs the bridge for one message with a ready-made handler.
///
/// `args` follows `std::env::args_os`: the program name, optional leading
/// configuration flags, then the encoded message. Help and version output go
/// to `stdout`; usage and configuration errors go to `stderr`.
#[must_use]
pub fn run<I, H, W, E>(args: I, handler: H, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    H: MessageHandler,
    W: Write,
    E: Write,
{
    run_with(args, move |_| handler, stdout, stderr)
}

/// Runs the bridge for one message, building the handler from the loaded
/// configuration.
#[must_use]
pub fn run_with<I, F, H, W, E>(
    args: I,
    build_handler: F,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    F: FnOnce(&Config) -> H,
    H: MessageHandler,
    W: Write,
    E: Write,
{
    let io = IoStreams::new(stdout, stderr);
    BridgeRunner::new(io, &OrthoConfigLoader).run(args, build_handler)
}

/// Runs the bundled probe handler, answering the configured outcome.
#[must_use]
pub fn run_probe<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(
        args,
        |config: &Config| ProbeHandler::new(config.probe_outcome()),
        stdout,
        stderr,
    )
}

/// Runs the bridge with a custom configuration loader and no telemetry.
#[cfg(test)]
pub(crate) fn run_with_loader<I, F, H, W, E, L>(
    args: I,
    build_handler: F,
    io: IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    F: FnOnce(&Config) -> H,
    H: MessageHandler,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    BridgeRunner::new(io, loader)
        .without_telemetry()
        .run(args, build_handler)
}

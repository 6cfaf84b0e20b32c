//! The per-message decision procedure.
//!
//! [`Dispatcher::dispatch`] is the only place where failures are observed.
//! It decodes the supervisor's argument, invokes the handler, and folds every
//! result into a [`Disposition`]. Decoding errors, handler errors, handler
//! panics and unrecognised outcomes all reject the message without
//! requeueing it, so a poisoned message can never cycle through the queue.
//! A requeue is only ever the result of a handler explicitly asking for one.
//!
//! When the supervisor kills the process before it exits (for example on a
//! timeout) no disposition is produced at all. What happens to the message
//! then is decided by the supervisor's own policy.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::DISPATCH_TARGET;
use crate::envelope::{DecodeError, Envelope};
use crate::handler::{HandlerError, MessageHandler, Outcome};

/// Broker action requested from the supervisor, encoded as an exit status.
///
/// The numeric values are fixed by the supervisor protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Disposition {
    /// Acknowledge the message.
    Acknowledge = 0,
    /// Reject the message and drop it.
    Reject = 3,
    /// Reject the message and requeue it for redelivery.
    RejectAndRequeue = 4,
}

impl Disposition {
    /// Exit status reported to the supervisor.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Maps a handler outcome onto the supervisor protocol.
    pub const fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Acknowledge => Self::Acknowledge,
            Outcome::RejectAndRequeue => Self::RejectAndRequeue,
            Outcome::Reject | Outcome::Unrecognised(_) => Self::Reject,
        }
    }
}

impl From<Disposition> for ExitCode {
    fn from(disposition: Disposition) -> Self {
        Self::from(disposition.code())
    }
}

/// Reasons a message could not be brought to a recognised outcome.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The argument did not decode to an envelope.
    #[error("failed to decode message: {0}")]
    Decode(#[from] DecodeError),
    /// The handler returned an error.
    #[error("message handler failed: {source}")]
    Handler {
        /// Error reported by the handler.
        #[source]
        source: HandlerError,
    },
    /// The handler panicked.
    #[error("message handler panicked: {message}")]
    HandlerPanicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Runs a single message through a handler.
#[derive(Debug)]
pub struct Dispatcher<H> {
    handler: H,
}

impl<H: MessageHandler> Dispatcher<H> {
    /// Creates a dispatcher delegating to `handler`.
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }

    /// Decodes `encoded`, processes it, and decides the message's fate.
    ///
    /// This never fails and never panics past its boundary; every error is
    /// logged and collapsed into [`Disposition::Reject`].
    pub fn dispatch(&self, encoded: &str) -> Disposition {
        match self.try_dispatch(encoded) {
            Ok(outcome) => {
                let disposition = Disposition::from_outcome(&outcome);
                if let Outcome::Unrecognised(value) = &outcome {
                    warn!(
                        target: DISPATCH_TARGET,
                        value = value.as_str(),
                        "handler returned an unrecognised outcome; rejecting"
                    );
                } else {
                    info!(
                        target: DISPATCH_TARGET,
                        %outcome,
                        exit_code = disposition.code(),
                        "message dispatched"
                    );
                }
                disposition
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "rejecting message");
                Disposition::Reject
            }
        }
    }

    /// Decodes and processes a message, surfacing the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when decoding fails or the handler errors or
    /// panics. The handler is not invoked when decoding fails.
    pub fn try_dispatch(&self, encoded: &str) -> Result<Outcome, DispatchError> {
        let envelope = Envelope::decode(encoded)?;
        debug!(
            target: DISPATCH_TARGET,
            body_bytes = envelope.body().len(),
            properties = envelope.properties().len(),
            delivery_tag = envelope.delivery_info().and_then(|info| info.delivery_tag()),
            "decoded message envelope"
        );
        self.invoke(&envelope)
    }

    fn invoke(&self, envelope: &Envelope) -> Result<Outcome, DispatchError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.handler.process(envelope))) {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(source)) => Err(DispatchError::Handler { source }),
            Err(payload) => Err(DispatchError::HandlerPanicked {
                message: panic_message(payload.as_ref()),
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}

//! The message-processing seam.
//!
//! A [`MessageHandler`] receives each decoded [`Envelope`] and reports what
//! the broker should do with it. The bridge never looks inside the message;
//! it only translates the reported [`Outcome`] into an exit status.

use std::fmt;

use amqp_bridge_config::ProbeOutcome;
use tracing::info;

use crate::envelope::Envelope;

/// Failure raised by a handler while processing a message.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler wants done with the message it processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The message was processed and can be removed from the queue.
    Acknowledge,
    /// The message must be dropped without redelivery.
    Reject,
    /// The message must be returned to the queue for another attempt.
    RejectAndRequeue,
    /// Any answer outside the recognised set.
    ///
    /// Handlers bridging loosely typed results (for example a status string
    /// from a child process) report such answers here instead of guessing.
    Unrecognised(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledge => f.write_str("acknowledge"),
            Self::Reject => f.write_str("reject"),
            Self::RejectAndRequeue => f.write_str("reject_and_requeue"),
            Self::Unrecognised(value) => write!(f, "unrecognised({value})"),
        }
    }
}

impl From<ProbeOutcome> for Outcome {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Acknowledge => Self::Acknowledge,
            ProbeOutcome::Reject => Self::Reject,
            ProbeOutcome::RejectAndRequeue => Self::RejectAndRequeue,
        }
    }
}

/// Business processing for one broker message.
#[cfg_attr(test, mockall::automock)]
pub trait MessageHandler {
    /// Processes the envelope and reports its disposition.
    ///
    /// # Errors
    ///
    /// Implementations may fail for any reason; the bridge rejects the
    /// message without requeueing it.
    fn process(&self, envelope: &Envelope) -> Result<Outcome, HandlerError>;
}

impl<H: MessageHandler + ?Sized> MessageHandler for &H {
    fn process(&self, envelope: &Envelope) -> Result<Outcome, HandlerError> {
        (**self).process(envelope)
    }
}

impl<H: MessageHandler + ?Sized> MessageHandler for Box<H> {
    fn process(&self, envelope: &Envelope) -> Result<Outcome, HandlerError> {
        (**self).process(envelope)
    }
}

/// Handler backed by a plain function or closure.
///
/// Created with [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps a function so it can be used as a [`MessageHandler`].
///
/// ```
/// use amqp_bridge::{Envelope, Outcome, handler_fn};
///
/// let handler = handler_fn(|envelope: &Envelope| {
///     if envelope.body().is_empty() {
///         Ok(Outcome::Reject)
///     } else {
///         Ok(Outcome::Acknowledge)
///     }
/// });
/// # let _ = handler;
/// ```
pub const fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Envelope) -> Result<Outcome, HandlerError>,
{
    HandlerFn { f }
}

impl<F> MessageHandler for HandlerFn<F>
where
    F: Fn(&Envelope) -> Result<Outcome, HandlerError>,
{
    fn process(&self, envelope: &Envelope) -> Result<Outcome, HandlerError> {
        (self.f)(envelope)
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Handler that logs each message and answers a fixed outcome.
///
/// Used by the `amqp-bridge` binary so operators can check how a supervisor
/// reacts to each exit status before wiring in real processing.
#[derive(Debug, Clone, Copy)]
pub struct ProbeHandler {
    outcome: ProbeOutcome,
}

impl ProbeHandler {
    /// Creates a probe answering `outcome` for every message.
    pub const fn new(outcome: ProbeOutcome) -> Self {
        Self { outcome }
    }
}

impl MessageHandler for ProbeHandler {
    fn process(&self, envelope: &Envelope) -> Result<Outcome, HandlerError> {
        let delivery = envelope.delivery_info();
        info!(
            target: crate::DISPATCH_TARGET,
            body_bytes = envelope.body().len(),
            content_type = envelope.content_type(),
            correlation_id = envelope.correlation_id(),
            delivery_tag = delivery.and_then(|info| info.delivery_tag()),
            redelivered = delivery.and_then(|info| info.redelivered()),
            outcome = %self.outcome,
            "probe received message"
        );
        Ok(self.outcome.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::envelope::Properties;

    #[rstest]
    #[case(ProbeOutcome::Acknowledge, Outcome::Acknowledge)]
    #[case(ProbeOutcome::Reject, Outcome::Reject)]
    #[case(ProbeOutcome::RejectAndRequeue, Outcome::RejectAndRequeue)]
    fn probe_answers_configured_outcome(
        #[case] configured: ProbeOutcome,
        #[case] expected: Outcome,
    ) {
        let handler = ProbeHandler::new(configured);
        let envelope = Envelope::new("foo", Properties::new());
        let outcome = handler.process(&envelope).expect("probe never fails");
        assert_eq!(outcome, expected);
    }

    #[test]
    fn function_handlers_see_the_envelope() {
        let handler = handler_fn(|envelope: &Envelope| {
            Ok(Outcome::Unrecognised(
                envelope.body_str().unwrap_or_default().to_owned(),
            ))
        });
        let envelope = Envelope::new("bar", Properties::new());
        let outcome = handler.process(&envelope).expect("handler succeeds");
        assert_eq!(outcome, Outcome::Unrecognised(String::from("bar")));
    }

    #[test]
    fn boxed_handlers_delegate() {
        let handler: Box<dyn MessageHandler> =
            Box::new(handler_fn(|_: &Envelope| Err("boom".into())));
        let envelope = Envelope::new("foo", Properties::new());
        let error = handler.process(&envelope).expect_err("handler fails");
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn unrecognised_outcomes_display_their_value() {
        let outcome = Outcome::Unrecognised(String::from("bar"));
        assert_eq!(outcome.to_string(), "unrecognised(bar)");
    }
}

//! Test support utilities for bridge behavioural coverage.
//!
//! Supplies a scripted handler that records what it was given, static and
//! failing configuration loaders, and a world type that drives the runner
//! with in-memory IO so step definitions stay focused on their assertions.

use std::cell::RefCell;
use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, ensure};
use rstest::fixture;

use crate::errors::AppError;
use crate::{
    Config, ConfigLoader, Envelope, HandlerError, IoStreams, MessageHandler, Outcome,
    run_with_loader,
};

pub(crate) const SAMPLE_MESSAGE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/golden/sample_message.b64"
));

pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// Loader that always fails with a genuine `ortho_config` error.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        let error = Config::load_from_iter(["amqp-bridge", "--log-format", "yaml"])
            .expect_err("unknown log format must not load");
        Err(AppError::LoadConfiguration(error))
    }
}

/// Scripted reply given by a [`RecordingHandler`].
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Answer(Outcome),
    Fail(String),
    Panic,
}

/// Handler that records every envelope it receives.
pub(crate) struct RecordingHandler {
    reply: Reply,
    seen: RefCell<Vec<Envelope>>,
}

impl RecordingHandler {
    pub(crate) fn new(reply: Reply) -> Self {
        Self {
            reply,
            seen: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn seen(&self) -> Vec<Envelope> {
        self.seen.borrow().clone()
    }
}

impl MessageHandler for RecordingHandler {
    fn process(&self, envelope: &Envelope) -> Result<Outcome, HandlerError> {
        self.seen.borrow_mut().push(envelope.clone());
        match &self.reply {
            Reply::Answer(outcome) => Ok(outcome.clone()),
            Reply::Fail(reason) => Err(reason.clone().into()),
            Reply::Panic => panic!("scripted handler panic"),
        }
    }
}

/// Maps a scenario label onto a handler outcome.
pub(crate) fn parse_outcome(label: &str) -> Outcome {
    match label.trim().trim_matches('"') {
        "acknowledge" => Outcome::Acknowledge,
        "reject" => Outcome::Reject,
        "reject_and_requeue" => Outcome::RejectAndRequeue,
        other => Outcome::Unrecognised(other.to_owned()),
    }
}

pub(crate) struct TestWorld {
    pub config: Config,
    pub handler: RecordingHandler,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self {
            config: Config::default(),
            handler: RecordingHandler::new(Reply::Answer(Outcome::Acknowledge)),
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        }
    }
}

impl TestWorld {
    pub fn script(&mut self, reply: Reply) {
        self.handler = RecordingHandler::new(reply);
    }

    pub fn run(&mut self, tokens: &[&str]) {
        self.stdout.clear();
        self.stderr.clear();
        let args = build_args(tokens);
        let loader = StaticConfigLoader::new(self.config.clone());
        let io = IoStreams::new(&mut self.stdout, &mut self.stderr);
        let handler = &self.handler;
        let exit = run_with_loader(args, |_: &Config| handler, io, &loader);
        self.exit_code = Some(exit);
    }

    pub fn stderr_text(&self) -> Result<String> {
        String::from_utf8(self.stderr.clone()).context("stderr utf8")
    }

    pub fn assert_exit_code(&self, expected: u8) -> Result<()> {
        let exit = self
            .exit_code
            .ok_or_else(|| anyhow!("exit code not recorded"))?;
        ensure!(
            exit == ExitCode::from(expected),
            "expected exit code {expected}, got {exit:?}"
        );
        Ok(())
    }

    pub fn assert_handler_calls(&self, expected: usize) -> Result<()> {
        let calls = self.handler.seen().len();
        ensure!(
            calls == expected,
            "expected {expected} handler calls, got {calls}"
        );
        Ok(())
    }

    pub fn assert_handler_body(&self, expected: &str) -> Result<()> {
        let seen = self.handler.seen();
        let envelope = seen
            .first()
            .ok_or_else(|| anyhow!("handler was never called"))?;
        ensure!(
            envelope.body() == expected.as_bytes(),
            "handler saw body {:?}, expected {expected:?}",
            envelope.body_str()
        );
        Ok(())
    }
}

pub(crate) fn build_args(tokens: &[&str]) -> Vec<OsString> {
    std::iter::once("amqp-bridge")
        .chain(tokens.iter().copied())
        .map(OsString::from)
        .collect()
}

#[fixture]
pub(crate) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

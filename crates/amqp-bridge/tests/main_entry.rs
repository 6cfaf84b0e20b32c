//! Integration tests for the `amqp-bridge` probe binary.
//!
//! Verifies that the process exit status is the one the supervisor expects
//! for each probe outcome and for malformed input.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

const SAMPLE_MESSAGE: &str = include_str!("golden/sample_message.b64");

#[test]
fn acknowledges_by_default() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command.arg(SAMPLE_MESSAGE);
    command.assert().code(0);
}

#[test]
fn requeue_probe_exits_with_four() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command.args(["--probe-outcome", "requeue", SAMPLE_MESSAGE]);
    command.assert().code(4);
}

#[test]
fn reject_probe_exits_with_three() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command.args(["--probe-outcome=reject", SAMPLE_MESSAGE]);
    command.assert().code(3);
}

#[test]
fn undecodable_message_exits_with_three() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command.args(["--probe-outcome", "requeue", "not-base64!"]);
    command
        .assert()
        .code(3)
        .stderr(contains("rejecting message"));
}

#[test]
fn missing_message_exits_with_three() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command.assert().code(3).stderr(contains("MESSAGE"));
}

#[test]
fn crate_filter_enables_dispatch_diagnostics() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command.args(["--log-filter", "off,amqp_bridge=debug", SAMPLE_MESSAGE]);
    command
        .assert()
        .code(0)
        .stderr(contains("decoded message envelope"))
        .stderr(contains("amqp_bridge::dispatch"));
}

#[test]
fn environment_configuration_applies_without_flags() {
    let mut command = cargo_bin_cmd!("amqp-bridge");
    command
        .env("AMQP_BRIDGE_PROBE_OUTCOME", "requeue")
        .arg(SAMPLE_MESSAGE);
    command.assert().code(4);
}

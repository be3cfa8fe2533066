//! End-to-end tests of the `piocli` binary.
//!
//! None of these need hardware: they either stop before the device is
//! touched or point `--device` at a serial port that doesn't exist.

use assert_cmd::Command;
use predicates::prelude::*;

const MISSING_DEVICE: &str = "/nonexistent/ttyPIO0";

const DESCRIPTIONS: [&str; 6] = [
    "specify the operation read|write|readall|mode|pulse",
    "specify the port/pin combination as X.Y, e.g. --pin=2.0",
    "show help options",
    "specify mode as in|float|tri|out|up|pullup|down|pulldown",
    "specify output value as 0|1 for operations write|pulse",
    "specify pulse duration in microseconds, e.g. --duration=100",
];

fn piocli() -> Command {
    let mut cmd = Command::cargo_bin("piocli").unwrap();
    cmd.env("PIOCLI_DEVICE", MISSING_DEVICE);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    String::from_utf8(cmd.output().unwrap().stdout).unwrap()
}

#[test]
fn help_exits_zero_with_every_description() {
    for flag in &["--help", "--help=", "--help=yes"] {
        let out = stdout_of(piocli().arg(flag));
        piocli().arg(flag).assert().success();
        assert!(out.starts_with("piocli usage:\n"));
        for description in &DESCRIPTIONS {
            assert_eq!(out.matches(description).count(), 1, "{} with {}", description, flag);
        }
    }
}

#[test]
fn help_wins_over_actions() {
    piocli()
        .args(&["--action=write", "--pin=0.0", "--value=1", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to open").not());
}

#[test]
fn no_action_prints_usage() {
    piocli()
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("piocli usage:\n"));
}

#[test]
fn unknown_action_prints_usage() {
    piocli()
        .arg("--action=toggle")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("show help options"));
}

#[test]
fn invalid_pin_prints_usage() {
    for action in &["read", "write", "mode", "pulse"] {
        piocli()
            .arg(format!("--action={}", action))
            .args(&["--pin=two", "--mode=out"])
            .assert()
            .code(1)
            .stdout(predicate::str::starts_with("piocli usage:\n"));
    }
}

#[test]
fn empty_mode_prints_usage() {
    piocli()
        .args(&["--action=mode", "--pin=0.1"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("piocli usage:\n"));
}

#[test]
fn unrecognized_mode_prints_usage() {
    piocli()
        .args(&["--action=mode", "--pin=0.1", "--mode=opendrain"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with(
            "opendrain mode is not recognized\npiocli usage:\n",
        ));
}

#[test]
fn missing_device_is_not_fatal() {
    piocli()
        .args(&["--action=read", "--pin=0.1"])
        .assert()
        .success()
        .stdout("Failed to open /dev/pio0\n");

    piocli()
        .args(&["--action=pulse", "--pin=2.0", "--value=1", "--duration=100"])
        .assert()
        .success()
        .stdout("Failed to open /dev/pio2\n");
}

#[test]
fn device_flag_overrides_environment() {
    piocli()
        .env("PIOCLI_DEVICE", "/dev/null/not-a-tty")
        .args(&["--action=write", "--pin=3.2", "--device", MISSING_DEVICE])
        .assert()
        .success()
        .stdout("Failed to open /dev/pio3\n");
}

#[test]
fn read_all_without_hardware_prints_header() {
    piocli().arg("--action=readall").assert().success().stdout(concat!(
        "       28   24   20   16   12    8    4    0\n",
        "     ---- ---- ---- ---- ---- ---- ---- ----\n",
    ));
}

#[test]
fn version() {
    piocli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("piocli "));
}

#[test]
fn help_wins_over_malformed_arguments() {
    let cases: [&[&str]; 3] = [
        &["--help", "--mode"],
        &["--help", "--colour=x"],
        &["--colour=x", "--help=yes"],
    ];
    for args in &cases {
        piocli()
            .args(*args)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("piocli usage:\n"));
    }
}

#[test]
fn bare_mode_prints_usage() {
    piocli()
        .args(&["--action=mode", "--pin=0.1", "--mode"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("piocli usage:\n"));
}

#[test]
fn negative_value_is_accepted() {
    piocli()
        .args(&["--action=pulse", "--pin=0.1", "--value", "-1"])
        .assert()
        .success()
        .stdout("Failed to open /dev/pio0\n");
}

#[test]
fn unknown_flag_prints_usage() {
    piocli()
        .arg("--colour=blue")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("piocli usage:\n"))
        .stderr(predicate::str::contains("--colour"));
}

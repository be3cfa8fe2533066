//! The five pin commands, and the dispatcher that picks one of them.
//!
//! Every command runs a single sequence of `Hal` operations through scoped
//! handles and reports what happened on `out`. Hardware that fails to open
//! is reported but isn't fatal; bad input falls back to printing usage.

use crate::cli::{Action, ModeArg, Options};
use log::{debug, warn};
use pio::{Hal, Pin, PinId, Port};
use std::convert::TryFrom;
use std::fmt::Debug;
use std::io::{self, Write};
use std::process::ExitCode;

/// The highest port index `readall` will try, even if more ports exist.
pub const MAX_PORT: u8 = 10;

const BITS_HEADER: &str = "       28   24   20   16   12    8    4    0";
const BITS_RULE: &str = "     ---- ---- ---- ---- ---- ---- ---- ----";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran, whether or not the hardware cooperated.
    Done,
    /// The input didn't describe a command and usage was printed.
    Usage,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Usage => ExitCode::FAILURE,
        }
    }
}

/// `run` carries out the action selected in `opts`.
pub fn run<H: Hal, W: Write>(opts: &Options, hal: &mut H, out: &mut W) -> io::Result<Outcome> {
    debug!("running {:?} on pin {}", opts.action, opts.pin);
    match opts.action {
        Action::ReadAll => read_all(hal, out),
        Action::Read => read(opts, hal, out),
        Action::Write => write(opts, hal, out),
        Action::Mode => mode(opts, hal, out),
        Action::Pulse => pulse(opts, hal, out),
        Action::Usage => usage(opts, out),
    }
}

pub fn usage<W: Write>(opts: &Options, out: &mut W) -> io::Result<Outcome> {
    write!(out, "{}", opts.usage)?;
    Ok(Outcome::Usage)
}

fn read_all<H: Hal, W: Write>(hal: &mut H, out: &mut W) -> io::Result<Outcome> {
    writeln!(out, "{}", BITS_HEADER)?;
    writeln!(out, "{}", BITS_RULE)?;

    for index in 0..=MAX_PORT {
        let mut port = match Port::open(hal, index) {
            Ok(port) => port,
            Err(err) => {
                debug!("stopping at port {}: {}", index, err);
                break;
            }
        };
        let bits = match port.value() {
            Ok(bits) => bits,
            Err(err) => return access_failed(out, index, err),
        };
        writeln!(out, "P{} | {}", index, format_bits(bits))?;
    }
    Ok(Outcome::Done)
}

/// `format_bits` renders bit 31 first, in groups of four, each group
/// followed by a space.
fn format_bits(bits: u32) -> String {
    let mut s = String::with_capacity(40);
    for bit in (0..32).rev() {
        s.push(if bits & (1 << bit) != 0 { '1' } else { '0' });
        if bit % 4 == 0 {
            s.push(' ');
        }
    }
    s
}

fn read<H: Hal, W: Write>(opts: &Options, hal: &mut H, out: &mut W) -> io::Result<Outcome> {
    let id = opts.pin;
    if !id.is_valid() {
        return usage(opts, out);
    }
    let mut pin = match open(hal, id, out)? {
        Some(pin) => pin,
        None => return Ok(Outcome::Done),
    };
    match pin.value() {
        Ok(high) => writeln!(out, "{}:{} == {}", opts.name, id, high as u8)?,
        Err(err) => return access_failed(out, id.port, err),
    }
    Ok(Outcome::Done)
}

fn write<H: Hal, W: Write>(opts: &Options, hal: &mut H, out: &mut W) -> io::Result<Outcome> {
    let id = opts.pin;
    if !id.is_valid() {
        return usage(opts, out);
    }
    let mut pin = match open(hal, id, out)? {
        Some(pin) => pin,
        None => return Ok(Outcome::Done),
    };
    let high = opts.value != 0;
    if let Err(err) = pin.write(high) {
        return access_failed(out, id.port, err);
    }
    writeln!(out, "{}:{} -> {}", opts.name, id, high as u8)?;
    Ok(Outcome::Done)
}

fn mode<H: Hal, W: Write>(opts: &Options, hal: &mut H, out: &mut W) -> io::Result<Outcome> {
    let id = opts.pin;
    if !id.is_valid() {
        return usage(opts, out);
    }
    let mode = match &opts.mode {
        ModeArg::Known(mode) => *mode,
        ModeArg::Missing => return usage(opts, out),
        ModeArg::Unrecognized(name) => {
            writeln!(out, "{} mode is not recognized", name)?;
            return usage(opts, out);
        }
    };
    let mut pin = match open(hal, id, out)? {
        Some(pin) => pin,
        None => return Ok(Outcome::Done),
    };
    if let Err(err) = pin.set_attributes(mode.attributes()) {
        return access_failed(out, id.port, err);
    }
    writeln!(out, "{}:{} -> {}", opts.name, id, mode.name())?;
    Ok(Outcome::Done)
}

fn pulse<H: Hal, W: Write>(opts: &Options, hal: &mut H, out: &mut W) -> io::Result<Outcome> {
    let id = opts.pin;
    if !id.is_valid() {
        return usage(opts, out);
    }
    let mut pin = match open(hal, id, out)? {
        Some(pin) => pin,
        None => return Ok(Outcome::Done),
    };
    let high = opts.value != 0;
    writeln!(
        out,
        "{}:{} -> {} ({}usec) -> {}",
        opts.name, id, high as u8, opts.duration, !high as u8
    )?;
    out.flush()?;

    let us = u32::try_from(opts.duration).unwrap_or(0);
    if let Err(err) = pin.pulse(high, us) {
        return access_failed(out, id.port, err);
    }
    Ok(Outcome::Done)
}

/// `open` opens a pin, reporting a failure on `out` and returning `None`
/// in that case.
fn open<'a, H: Hal, W: Write>(
    hal: &'a mut H,
    id: PinId,
    out: &mut W,
) -> io::Result<Option<Pin<'a, H>>> {
    match Pin::open(hal, id) {
        Ok(pin) => Ok(Some(pin)),
        Err(err) => {
            warn!("opening pin {} failed: {}", id, err);
            writeln!(out, "Failed to open /dev/pio{}", id.port)?;
            Ok(None)
        }
    }
}

fn access_failed<W: Write, E: Debug>(
    out: &mut W,
    port: u8,
    err: pio::Error<E>,
) -> io::Result<Outcome> {
    warn!("operation on port {} failed: {}", port, err);
    writeln!(out, "Failed to access /dev/pio{}", port)?;
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use pio::sim::{Event, SimPio};
    use pio::{Attributes, SENTINEL_PORT};

    fn options(args: &[&str]) -> Options {
        let cli = Cli::try_parse_from(std::iter::once("piocli").chain(args.iter().copied()))
            .unwrap();
        Options::new(&cli)
    }

    fn run_with(hal: &mut SimPio, args: &[&str]) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = run(&options(args), hal, &mut out).unwrap();
        assert_eq!(hal.open_handles(), 0, "handle leaked by {:?}", args);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn read_all_without_ports() {
        let mut hal = SimPio::new(0);
        let (outcome, out) = run_with(&mut hal, &["--action=readall"]);
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(out, format!("{}\n{}\n", BITS_HEADER, BITS_RULE));
    }

    #[test]
    fn read_all_prints_each_port() {
        let mut hal = SimPio::new(2);
        hal.set_port_bits(0, 0x8000_0001);
        hal.set_port_bits(1, 0x0000_00f0);
        let (_, out) = run_with(&mut hal, &["--action=readall"]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            &[
                BITS_HEADER,
                BITS_RULE,
                "P0 | 1000 0000 0000 0000 0000 0000 0000 0001 ",
                "P1 | 0000 0000 0000 0000 0000 0000 1111 0000 ",
            ]
        );
    }

    #[test]
    fn read_all_stops_after_port_ten() {
        let mut hal = SimPio::new(16);
        let (_, out) = run_with(&mut hal, &["--action=readall"]);
        assert_eq!(out.lines().count(), 2 + 11);
        assert!(out.lines().last().unwrap().starts_with("P10 | "));
        assert!(!hal.events().contains(&Event::OpenPort(11)));
    }

    #[test]
    fn read_all_with_hardware_missing() {
        let mut hal = SimPio::new(4);
        hal.fail_opens(true);
        let (outcome, out) = run_with(&mut hal, &["--action=readall"]);
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(out.lines().count(), 2);
        assert_eq!(hal.opens(), 1);
    }

    #[test]
    fn header_lines_up_with_bits() {
        let row = format!("P0 | {}", format_bits(1 << 28));
        let label = BITS_HEADER.find("28").unwrap() + 1;
        assert_eq!(&row[label..label + 1], "1");
    }

    #[test]
    fn read_pin() {
        let mut hal = SimPio::new(3);
        hal.set_port_bits(2, 1 << 4);
        let (outcome, out) = run_with(&mut hal, &["--action=read", "--pin=2.4"]);
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(out, "piocli:2.4 == 1\n");

        let (_, out) = run_with(&mut hal, &["--action=read", "--pin=2.5"]);
        assert_eq!(out, "piocli:2.5 == 0\n");
    }

    #[test]
    fn open_failure_is_not_fatal() {
        let mut hal = SimPio::new(1);
        for action in &["read", "write", "mode", "pulse"] {
            let action = format!("--action={}", action);
            let (outcome, out) =
                run_with(&mut hal, &[action.as_str(), "--pin=3.1", "--mode=out", "--value=1"]);
            assert_eq!(outcome, Outcome::Done);
            assert_eq!(out, "Failed to open /dev/pio3\n");
        }
    }

    #[test]
    fn write_clears_on_zero() {
        let mut hal = SimPio::new(1);
        hal.set_port_bits(0, 0xffff_ffff);
        let (_, out) = run_with(&mut hal, &["--action=write", "--pin=0.3", "--value=0"]);
        assert_eq!(out, "piocli:0.3 -> 0\n");
        assert_eq!(hal.port_bits(0), !(1 << 3));
    }

    #[test]
    fn write_normalizes_nonzero() {
        for value in &["1", "7", "-2"] {
            let mut hal = SimPio::new(1);
            let arg = format!("--value={}", value);
            let (_, out) = run_with(&mut hal, &["--action=write", "--pin=0.3", arg.as_str()]);
            assert_eq!(out, "piocli:0.3 -> 1\n");
            assert_eq!(hal.port_bits(0), 1 << 3);
        }
    }

    #[test]
    fn write_without_value_clears() {
        let mut hal = SimPio::new(1);
        hal.set_port_bits(0, 1);
        let (_, out) = run_with(&mut hal, &["--action=write", "--pin=0.0", "--value=high"]);
        assert_eq!(out, "piocli:0.0 -> 0\n");
        assert_eq!(hal.port_bits(0), 0);
    }

    #[test]
    fn mode_applies_attributes() {
        let cases = [
            ("in", Attributes::INPUT_FLOAT, "in"),
            ("float", Attributes::INPUT_FLOAT, "in"),
            ("tri", Attributes::INPUT_FLOAT, "in"),
            ("out", Attributes::OUTPUT, "out"),
            ("up", Attributes::INPUT_PULL_UP, "pullup"),
            ("pullup", Attributes::INPUT_PULL_UP, "pullup"),
            ("down", Attributes::INPUT_PULL_DOWN, "pulldown"),
            ("pulldown", Attributes::INPUT_PULL_DOWN, "pulldown"),
        ];
        for (arg, attrs, reported) in &cases {
            let mut hal = SimPio::new(2);
            let id = PinId::new(1, 9);
            let mode = format!("--mode={}", arg);
            let (outcome, out) = run_with(&mut hal, &["--action=mode", "--pin=1.9", mode.as_str()]);
            assert_eq!(outcome, Outcome::Done);
            assert_eq!(out, format!("piocli:1.9 -> {}\n", reported));
            assert!(hal.events().contains(&Event::Attributes(id, *attrs)));
        }
    }

    #[test]
    fn unrecognized_mode_touches_nothing() {
        let mut hal = SimPio::new(2);
        let (outcome, out) = run_with(&mut hal, &["--action=mode", "--pin=1.9", "--mode=sideways"]);
        assert_eq!(outcome, Outcome::Usage);
        assert!(out.starts_with("sideways mode is not recognized\npiocli usage:\n"));
        assert_eq!(hal.events().len(), 0);
    }

    #[test]
    fn missing_mode_prints_usage() {
        let mut hal = SimPio::new(2);
        let (outcome, out) = run_with(&mut hal, &["--action=mode", "--pin=1.9"]);
        assert_eq!(outcome, Outcome::Usage);
        assert!(out.starts_with("piocli usage:\n"));
        assert_eq!(hal.events().len(), 0);
    }

    #[test]
    fn pulse_high_then_low() {
        let mut hal = SimPio::new(3);
        let id = PinId::new(2, 0);
        let (outcome, out) = run_with(
            &mut hal,
            &["--action=pulse", "--pin=2.0", "--value=1", "--duration=100"],
        );
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(out, "piocli:2.0 -> 1 (100usec) -> 0\n");
        assert_eq!(
            hal.events(),
            &[
                Event::OpenPin(id),
                Event::Write(id, true),
                Event::Wait(100),
                Event::Write(id, false),
                Event::ClosePin(id),
            ]
        );
    }

    #[test]
    fn pulse_low_then_high() {
        let mut hal = SimPio::new(3);
        let id = PinId::new(2, 0);
        let (_, out) = run_with(&mut hal, &["--action=pulse", "--pin=2.0", "--duration=5"]);
        assert_eq!(out, "piocli:2.0 -> 0 (5usec) -> 1\n");
        assert_eq!(hal.events()[1], Event::Write(id, false));
        assert_eq!(hal.events()[3], Event::Write(id, true));
    }

    #[test]
    fn negative_duration_does_not_wait() {
        let mut hal = SimPio::new(1);
        let (_, out) = run_with(
            &mut hal,
            &["--action=pulse", "--pin=0.0", "--value=1", "--duration=-20"],
        );
        assert_eq!(out, "piocli:0.0 -> 1 (-20usec) -> 0\n");
        assert!(hal.events().contains(&Event::Wait(0)));
    }

    #[test]
    fn invalid_pin_never_opens() {
        for action in &["read", "write", "mode", "pulse"] {
            for pin in &["--pin=", "--pin=x.y", "--pin=2", "--pin=255.0"] {
                let mut hal = SimPio::new(4);
                let action = format!("--action={}", action);
                let (outcome, out) = run_with(&mut hal, &[action.as_str(), *pin, "--mode=out"]);
                assert_eq!(outcome, Outcome::Usage);
                assert!(out.starts_with("piocli usage:\n"));
                assert_eq!(hal.opens(), 0);
            }
        }
        assert_eq!(PinId::parse("255.0").port, SENTINEL_PORT);
    }

    #[test]
    fn unknown_action_prints_usage() {
        let mut hal = SimPio::new(1);
        let cases: [&[&str]; 2] = [&[], &["--action=toggle"]];
        for args in &cases {
            let (outcome, out) = run_with(&mut hal, args);
            assert_eq!(outcome, Outcome::Usage);
            assert_eq!(out, crate::cli::usage());
        }
        assert_eq!(hal.events().len(), 0);
    }
}

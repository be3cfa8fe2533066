//! Command line options, and their decoding into the `Options` the commands
//! work from.

use clap::{CommandFactory, Parser};
use pio::{Mode, PinId};
use std::ffi::{OsStr, OsString};

const HELP_TEMPLATE: &str = "{name} usage:\n{options}\n";

/// Read, write, configure and pulse GPIO pins
#[derive(Parser, Debug)]
#[command(name = "piocli", version, disable_help_flag = true, help_template = HELP_TEMPLATE)]
pub struct Cli {
    /// specify the operation read|write|readall|mode|pulse
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub action: Option<String>,

    /// specify the port/pin combination as X.Y, e.g. --pin=2.0
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub pin: Option<String>,

    /// show help options
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub help: Option<String>,

    /// specify mode as in|float|tri|out|up|pullup|down|pulldown
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub mode: Option<String>,

    /// specify output value as 0|1 for operations write|pulse
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "",
        allow_negative_numbers = true
    )]
    pub value: Option<String>,

    /// specify pulse duration in microseconds, e.g. --duration=100
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "",
        allow_negative_numbers = true
    )]
    pub duration: Option<String>,

    /// serial port of the Bus Pirate providing the pins
    #[arg(long, env = "PIOCLI_DEVICE", default_value = "/dev/ttyUSB0")]
    pub device: String,

    /// log every hardware operation to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn wants_help(&self) -> bool {
        self.help.is_some()
    }
}

/// `Request` is what the command line asks for once parsed.
#[derive(Debug)]
pub enum Request {
    Help,
    Run(Cli),
}

/// `parse_from` parses a full command line, program name first.
///
/// A `--help` flag anywhere on the line wins, even when the rest of the line
/// doesn't parse. Any other parse failure is returned as the clap error.
pub fn parse_from<I, T>(args: I) -> Result<Request, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match Cli::try_parse_from(&args) {
        Ok(cli) if cli.wants_help() => Ok(Request::Help),
        Ok(cli) => Ok(Request::Run(cli)),
        Err(_) if args.iter().skip(1).any(|arg| is_help_flag(arg)) => Ok(Request::Help),
        Err(err) => Err(err),
    }
}

fn is_help_flag(arg: &OsStr) -> bool {
    match arg.to_str() {
        Some(arg) => arg == "--help" || arg.starts_with("--help="),
        None => false,
    }
}

// Options that weren't given read as empty strings.
fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// `usage` renders the program name followed by every option description.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadAll,
    Read,
    Write,
    Mode,
    Pulse,
    /// Anything else, including no action at all.
    Usage,
}

impl Action {
    pub fn parse(s: &str) -> Self {
        match s {
            "readall" => Action::ReadAll,
            "read" => Action::Read,
            "write" => Action::Write,
            "mode" => Action::Mode,
            "pulse" => Action::Pulse,
            _ => Action::Usage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeArg {
    Missing,
    Known(Mode),
    Unrecognized(String),
}

impl ModeArg {
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return ModeArg::Missing;
        }
        match Mode::parse(s) {
            Some(mode) => ModeArg::Known(mode),
            None => ModeArg::Unrecognized(s.to_string()),
        }
    }
}

/// `Options` is everything a command needs, decoded once per invocation.
#[derive(Debug, Clone)]
pub struct Options {
    pub name: String,
    pub action: Action,
    pub pin: PinId,
    pub mode: ModeArg,
    pub value: i32,
    pub duration: i32,
    pub usage: String,
}

impl Options {
    pub fn new(cli: &Cli) -> Self {
        Self {
            name: Cli::command().get_name().to_string(),
            action: Action::parse(text(&cli.action)),
            pin: PinId::parse(text(&cli.pin)),
            mode: ModeArg::parse(text(&cli.mode)),
            value: parse_integer(text(&cli.value)),
            duration: parse_integer(text(&cli.duration)),
            usage: usage(),
        }
    }
}

/// `parse_integer` reads an optionally signed run of leading decimal digits,
/// ignoring leading whitespace and whatever follows the digits. Input with
/// no digits reads as 0, and out-of-range values saturate.
pub fn parse_integer(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut n: i64 = 0;
    for b in digits.bytes().take_while(|b| b.is_ascii_digit()) {
        n = (n * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if negative {
        n = -n;
    }
    n.max(i64::from(i32::MIN)).min(i64::from(i32::MAX)) as i32
}

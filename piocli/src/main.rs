//! `piocli` reads, writes, configures and pulses GPIO pins.
//!
//! ```bash
//! # Show the level of every pin in every port
//! piocli --action=readall
//!
//! # Drive pin 0.4 high (it stays high after piocli exits), then make pin 0.1
//! # a pulled-up input
//! piocli --action=write --pin=0.4 --value=1
//! piocli --action=mode --pin=0.1 --mode=pullup
//!
//! # Pulse pin 0.3 high for 100 microseconds
//! piocli --action=pulse --pin=0.3 --value=1 --duration=100
//! ```
//!
//! The pins are those of a Bus Pirate in bit-bang mode, on the serial port
//! given by `--device` or `PIOCLI_DEVICE`.
//!
//! The exit status is 0 when help was shown or an action ran, and 1 when the
//! usage text was printed because the command line was incomplete or wrong.

mod cli;
mod commands;
mod device;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use std::io::{self, Write};
use std::process::ExitCode;

use cli::{Cli, Options, Request};
use commands::Outcome;
use device::Device;

fn main() -> ExitCode {
    let cli = match cli::parse_from(std::env::args_os()) {
        Ok(Request::Run(cli)) => cli,
        Ok(Request::Help) => return finish(show_usage(Outcome::Done)),
        Err(err) => {
            let _ = err.print();
            if err.kind() == ErrorKind::DisplayVersion {
                return ExitCode::SUCCESS;
            }
            return finish(show_usage(Outcome::Usage));
        }
    };

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    finish(try_main(&cli))
}

fn finish(result: Result<Outcome>) -> ExitCode {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn show_usage(outcome: Outcome) -> Result<Outcome> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", cli::usage()).context("writing usage")?;
    out.flush().context("writing usage")?;
    Ok(outcome)
}

fn try_main(cli: &Cli) -> Result<Outcome> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let opts = Options::new(cli);
    let mut device = Device::new(cli.device.as_str());
    let outcome = commands::run(&opts, &mut device, &mut out).context("writing to stdout")?;
    out.flush().context("writing to stdout")?;
    Ok(outcome)
}

//! Module `bitbang` contains the API for "binary bit-bang" mode.
//!
//! This mode cannot be entered directly. Instead, create a `BusPirate` object
//! (from the root module of this crate) and call `to_bitbang` on it:
//!
//! ```ignore
//! let bp = BusPirate::new(tx, rx);
//! let bb = bp.to_bitbang()?;
//! ```
//!
//! The result of `to_bitbang` is an instance of `BitBang`.
//!
//! In this mode the host controls five pins directly. They are addressed here
//! by bit position, which is also the order the Bus Pirate uses in its
//! command bytes:
//!
//! | bit | pin  |
//! |-----|------|
//! | 0   | CS   |
//! | 1   | MISO |
//! | 2   | CLK  |
//! | 3   | MOSI |
//! | 4   | AUX  |

use crate::low;
use crate::BusPirate;
use crate::Error;
use embedded_hal::serial;

/// The number of pins under bit-bang control.
pub const PIN_COUNT: u8 = 5;

pub const CS: u8 = 0;
pub const MISO: u8 = 1;
pub const CLK: u8 = 2;
pub const MOSI: u8 = 3;
pub const AUX: u8 = 4;

const PIN_MASK: u8 = 0b00011111;

const CMD_CONFIGURE_PINS: u8 = 0b01000000;
const CMD_SET_PINS: u8 = 0b10000000;

/// `Outputs` is everything a "set pins" command carries: the on-board power
/// supply and pull-up switches, and the level driven on each output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outputs {
    pub power_supply: bool,
    pub pull_ups: bool,
    pub pins: u8,
}

impl Outputs {
    pub(crate) fn command_byte(&self) -> u8 {
        let mut cmd = CMD_SET_PINS;
        cmd = cmd | (if self.power_supply { 1 } else { 0 } << 6);
        cmd = cmd | (if self.pull_ups { 1 } else { 0 } << 5);
        cmd = cmd | (self.pins & PIN_MASK);
        cmd
    }
}

/// `BitBang` represents a Bus Pirate device in "binary bit-bang" mode.
///
/// The Bus Pirate only reports pin levels, never its configuration, so
/// `BitBang` remembers the directions and outputs it last sent. Entering the
/// mode resets every pin to a high-impedance input with the power supply and
/// pull-ups off, which is where that record starts.
///
/// A Bus Pirate resumed from an earlier session keeps its pins as they were
/// left until the first command, and every command carries all five pins, so
/// that first command applies this record to the pins it doesn't name.
pub struct BitBang<TX: serial::Write<u8>, RX: serial::Read<u8>> {
    ch: low::Channel<TX, RX>,
    inputs: u8,
    outputs: Outputs,
}

impl<TX, RX, TXErr, RXErr> BitBang<TX, RX>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
{
    pub(crate) fn new(ch: low::Channel<TX, RX>) -> Self {
        Self {
            ch: ch,
            inputs: PIN_MASK,
            outputs: Outputs::default(),
        }
    }

    /// `close` resets the Bus Pirate back into normal terminal mode, exiting
    /// binary bitbang mode.
    pub fn close(self) -> Result<BusPirate<TX, RX>, Error<TXErr, RXErr>> {
        crate::close_handshake(self.ch)
    }

    /// `inputs` is the direction mask last configured: a set bit is an input.
    pub fn inputs(&self) -> u8 {
        self.inputs
    }

    pub fn outputs(&self) -> Outputs {
        self.outputs
    }

    /// `configure_pins` sets each pin whose bit is set in `inputs` as an
    /// input and every other pin as an output, returning the pin levels the
    /// Bus Pirate reports afterwards.
    pub fn configure_pins(&mut self, inputs: u8) -> Result<u8, Error<TXErr, RXErr>> {
        if inputs & !PIN_MASK != 0 {
            return Err(Error::Request);
        }
        let levels = self.ch.command(CMD_CONFIGURE_PINS | inputs)?;
        self.inputs = inputs;
        Ok(levels & PIN_MASK)
    }

    /// `set_pins` applies `outputs`, returning the pin levels the Bus Pirate
    /// reports afterwards.
    ///
    /// Levels for pins configured as inputs are ignored by the device.
    pub fn set_pins(&mut self, outputs: Outputs) -> Result<u8, Error<TXErr, RXErr>> {
        if outputs.pins & !PIN_MASK != 0 {
            return Err(Error::Request);
        }
        let levels = self.ch.command(outputs.command_byte())?;
        self.outputs = outputs;
        Ok(levels & PIN_MASK)
    }

    /// `read_pins` returns the current level of all five pins, with pin `n`
    /// in bit `n`.
    ///
    /// The Bus Pirate has no dedicated read command, so this repeats the last
    /// direction configuration, which changes nothing but is answered with
    /// the pin levels.
    pub fn read_pins(&mut self) -> Result<u8, Error<TXErr, RXErr>> {
        let inputs = self.inputs;
        self.configure_pins(inputs)
    }
}

//! Module `gpio` presents the bit-bang pins as a `pio::Hal`.
//!
//! The Bus Pirate appears as a single port group, port 0, with the five
//! bit-bang pins numbered as in module `bitbang` (0 is CS, 4 is AUX). Every
//! other port or pin fails to open.
//!
//! Some of the Bus Pirate's hardware doesn't map one-to-one onto per-pin
//! attributes:
//!
//! - The pull-up resistors are switched on and off for all pins at once, so
//!   configuring any pin as a pulled-up input enables them for every pin,
//!   and configuring any pin as a floating input disables them again.
//! - There are no pull-down resistors; asking for one is an
//!   `Error::Unsupported`.
//! - Writing a level to a pin that is currently an input first makes it an
//!   output, since the Bus Pirate ignores levels set on inputs.

use crate::bitbang::{self, BitBang};
use crate::Error;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::serial;
use pio::{Attributes, Direction, Hal, PinId, Pull};

/// The index of the only port group.
pub const PORT: u8 = 0;

/// `BusPirateHal` implements `pio::Hal` in terms of a Bus Pirate in bit-bang
/// mode, using `D` for the blocking waits a pulse needs.
pub struct BusPirateHal<TX: serial::Write<u8>, RX: serial::Read<u8>, D> {
    bb: BitBang<TX, RX>,
    delay: D,
}

impl<TX, RX, D, TXErr, RXErr> BusPirateHal<TX, RX, D>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
    D: DelayUs<u32>,
{
    pub fn new(bb: BitBang<TX, RX>, delay: D) -> Self {
        Self { bb: bb, delay: delay }
    }

    /// `release` returns the wrapped `BitBang` and delay objects.
    pub fn release(self) -> (BitBang<TX, RX>, D) {
        (self.bb, self.delay)
    }

    fn check_pin(pin: PinId) -> Result<u8, Error<TXErr, RXErr>> {
        if pin.port != PORT {
            return Err(Error::NoSuchPort(pin.port));
        }
        if pin.pin >= bitbang::PIN_COUNT {
            return Err(Error::NoSuchPin(pin.pin));
        }
        Ok(1 << pin.pin)
    }

    fn set_direction(&mut self, bit: u8, direction: Direction) -> Result<(), Error<TXErr, RXErr>> {
        let inputs = match direction {
            Direction::Input => self.bb.inputs() | bit,
            Direction::Output => self.bb.inputs() & !bit,
        };
        if inputs != self.bb.inputs() {
            self.bb.configure_pins(inputs)?;
        }
        Ok(())
    }
}

impl<TX, RX, D, TXErr, RXErr> Hal for BusPirateHal<TX, RX, D>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
    TXErr: core::fmt::Debug,
    RXErr: core::fmt::Debug,
    D: DelayUs<u32>,
{
    type Error = Error<TXErr, RXErr>;

    fn open_pin(&mut self, pin: PinId) -> Result<(), Self::Error> {
        Self::check_pin(pin).map(|_| ())
    }

    // Bit-bang pins carry no per-handle state, so closing is a no-op.
    fn close_pin(&mut self, _pin: PinId) {}

    fn open_port(&mut self, port: u8) -> Result<(), Self::Error> {
        if port == PORT {
            Ok(())
        } else {
            Err(Error::NoSuchPort(port))
        }
    }

    fn close_port(&mut self, _port: u8) {}

    fn pin_value(&mut self, pin: PinId) -> Result<bool, Self::Error> {
        let bit = Self::check_pin(pin)?;
        Ok(self.bb.read_pins()? & bit != 0)
    }

    fn port_value(&mut self, port: u8) -> Result<u32, Self::Error> {
        self.open_port(port)?;
        Ok(self.bb.read_pins()? as u32)
    }

    fn write_pin(&mut self, pin: PinId, high: bool) -> Result<(), Self::Error> {
        let bit = Self::check_pin(pin)?;
        let mut outputs = self.bb.outputs();
        if high {
            outputs.pins |= bit;
        } else {
            outputs.pins &= !bit;
        }
        // Set the level before switching direction, so the pin doesn't
        // glitch to its old level on becoming an output.
        self.bb.set_pins(outputs)?;
        self.set_direction(bit, Direction::Output)
    }

    fn set_attributes(&mut self, pin: PinId, attrs: Attributes) -> Result<(), Self::Error> {
        let bit = Self::check_pin(pin)?;
        if attrs.direction == Direction::Input {
            let pull_ups = match attrs.pull {
                Pull::Float => false,
                Pull::Up => true,
                Pull::Down => return Err(Error::Unsupported),
            };
            let mut outputs = self.bb.outputs();
            if outputs.pull_ups != pull_ups {
                outputs.pull_ups = pull_ups;
                self.bb.set_pins(outputs)?;
            }
        }
        self.set_direction(bit, attrs.direction)
    }

    fn wait_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

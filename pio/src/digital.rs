//! `embedded-hal` implementations for open pins, so that device drivers
//! written against the `embedded-hal` traits can drive a pin opened through
//! this crate.

use crate::handle::Pin;
use crate::Error;
use crate::Hal;
use embedded_hal::digital::v2;

impl<'a, H: Hal> v2::OutputPin for Pin<'a, H> {
    type Error = Error<H::Error>;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.clear()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set()
    }
}

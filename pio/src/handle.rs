//! Module `handle` contains scoped handles for pins and port groups.
//!
//! A handle borrows the `Hal` for as long as it is open and closes the
//! underlying hardware handle when dropped, so early returns and `?` can't
//! leak it.

use crate::Attributes;
use crate::Error;
use crate::Hal;
use crate::PinId;

/// `Pin` is an open handle to a single pin.
pub struct Pin<'a, H: Hal> {
    hal: &'a mut H,
    id: PinId,
}

impl<'a, H: Hal> Pin<'a, H> {
    /// `open` acquires the pin identified by `id`.
    ///
    /// The sentinel identifier is refused with `Error::InvalidPin` before the
    /// `Hal` is called at all.
    pub fn open(hal: &'a mut H, id: PinId) -> Result<Self, Error<H::Error>> {
        if !id.is_valid() {
            return Err(Error::InvalidPin);
        }
        hal.open_pin(id).map_err(Error::hal)?;
        Ok(Self { hal: hal, id: id })
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn value(&mut self) -> Result<bool, Error<H::Error>> {
        self.hal.pin_value(self.id).map_err(Error::hal)
    }

    pub fn write(&mut self, high: bool) -> Result<(), Error<H::Error>> {
        self.hal.write_pin(self.id, high).map_err(Error::hal)
    }

    pub fn set(&mut self) -> Result<(), Error<H::Error>> {
        self.write(true)
    }

    pub fn clear(&mut self) -> Result<(), Error<H::Error>> {
        self.write(false)
    }

    pub fn set_attributes(&mut self, attrs: Attributes) -> Result<(), Error<H::Error>> {
        self.hal.set_attributes(self.id, attrs).map_err(Error::hal)
    }

    /// `pulse` drives the pin to `high`, holds it there for `us`
    /// microseconds and then drives it to the opposite level.
    ///
    /// The wait blocks and can't be cancelled.
    pub fn pulse(&mut self, high: bool, us: u32) -> Result<(), Error<H::Error>> {
        self.write(high)?;
        self.hal.wait_us(us);
        self.write(!high)
    }
}

impl<'a, H: Hal> Drop for Pin<'a, H> {
    fn drop(&mut self) {
        self.hal.close_pin(self.id);
    }
}

/// `Port` is an open handle to a whole port group.
pub struct Port<'a, H: Hal> {
    hal: &'a mut H,
    port: u8,
}

impl<'a, H: Hal> Port<'a, H> {
    pub fn open(hal: &'a mut H, port: u8) -> Result<Self, Error<H::Error>> {
        hal.open_port(port).map_err(Error::hal)?;
        Ok(Self {
            hal: hal,
            port: port,
        })
    }

    pub fn index(&self) -> u8 {
        self.port
    }

    /// `value` reads the state of all pins in the group, with pin `n` in
    /// bit `n`.
    pub fn value(&mut self) -> Result<u32, Error<H::Error>> {
        self.hal.port_value(self.port).map_err(Error::hal)
    }
}

impl<'a, H: Hal> Drop for Port<'a, H> {
    fn drop(&mut self) {
        self.hal.close_port(self.port);
    }
}

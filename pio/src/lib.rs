//! Parallel I/O pin access over a pluggable hardware layer
//!
//! This library describes the small set of primitives a GPIO utility needs
//! from whatever hardware sits underneath it: opening and closing individual
//! pins or whole port groups, reading and driving pin levels, changing pin
//! attributes and waiting for a number of microseconds. Those primitives are
//! collected in the `Hal` trait, which a backend implements for its
//! particular hardware.
//!
//! Callers do not normally use `Hal` directly. Instead they open a scoped
//! handle, which closes the underlying hardware handle again when it is
//! dropped, on every path out of the calling code:
//!
//! ```ignore
//! let id = PinId::parse("2.0");
//! let mut pin = Pin::open(&mut hal, id)?;
//! pin.set()?;
//! ```
//!
//! Pins are addressed by `PinId`, which is parsed from the conventional
//! `"<port>.<pin>"` notation. A string that doesn't follow that notation
//! produces the invalid sentinel identifier rather than an error, and handles
//! refuse to open the sentinel.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod attributes;
mod digital;
pub mod handle;
pub mod sim;

use core::fmt;

pub use attributes::{Attributes, Direction, Mode, Pull};
pub use handle::{Pin, Port};

/// The port number used by `PinId::INVALID`.
pub const SENTINEL_PORT: u8 = 255;

/// `PinId` identifies a single pin as a port group index and a pin number
/// within that group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId {
    pub port: u8,
    pub pin: u8,
}

impl PinId {
    /// `INVALID` is the sentinel identifier produced for strings that don't
    /// name a pin.
    pub const INVALID: PinId = PinId {
        port: SENTINEL_PORT,
        pin: 0,
    };

    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port: port, pin: pin }
    }

    /// `parse` reads a `"<port>.<pin>"` string, where both parts are decimal
    /// integers.
    ///
    /// Anything else, including numbers too large for a `u8` and the
    /// sentinel port number itself, yields `PinId::INVALID`. The pin number
    /// is not checked against any hardware limit; that's left to the `Hal`.
    pub fn parse(s: &str) -> Self {
        let mut parts = s.splitn(2, '.');
        let port = parts.next().and_then(decimal_u8);
        let pin = parts.next().and_then(decimal_u8);
        match (port, pin) {
            (Some(port), Some(pin)) if port != SENTINEL_PORT => Self::new(port, pin),
            _ => Self::INVALID,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.port != SENTINEL_PORT
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.port, self.pin)
    }
}

fn decimal_u8(s: &str) -> Option<u8> {
    // u8::from_str alone would also accept a leading '+'.
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `Hal` is the set of primitive operations a hardware backend provides.
///
/// Every `open_*` call that succeeds must eventually be balanced by the
/// matching `close_*` call. The scoped handles in module `handle` take care
/// of that, so most code should use those rather than calling these methods
/// directly.
pub trait Hal {
    type Error: fmt::Debug;

    fn open_pin(&mut self, pin: PinId) -> Result<(), Self::Error>;
    fn close_pin(&mut self, pin: PinId);

    fn open_port(&mut self, port: u8) -> Result<(), Self::Error>;
    fn close_port(&mut self, port: u8);

    fn pin_value(&mut self, pin: PinId) -> Result<bool, Self::Error>;
    fn port_value(&mut self, port: u8) -> Result<u32, Self::Error>;

    /// `write_pin` sets the pin when `high` is true and clears it otherwise.
    fn write_pin(&mut self, pin: PinId, high: bool) -> Result<(), Self::Error>;

    fn set_attributes(&mut self, pin: PinId, attrs: Attributes) -> Result<(), Self::Error>;

    /// `wait_us` blocks the caller for at least `us` microseconds.
    fn wait_us(&mut self, us: u32);
}

/// `Error` represents failures of the scoped handle operations.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// `InvalidPin` indicates that the caller tried to open the sentinel
    /// pin identifier. The hardware was not touched.
    InvalidPin,

    /// `Hal` indicates that the backend reported a failure.
    ///
    /// The data is the error returned by the backend.
    Hal(E),
}

impl<E> Error<E> {
    fn hal(got: E) -> Self {
        Error::Hal(got)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPin => f.write_str("invalid pin"),
            Error::Hal(e) => write!(f, "hardware error: {:?}", e),
        }
    }
}

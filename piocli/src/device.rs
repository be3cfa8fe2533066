//! The hardware behind the commands: a Bus Pirate on a serial port.
//!
//! The serial port is only opened when the first pin or port is, so commands
//! that never reach the hardware work without a Bus Pirate attached, and a
//! missing device shows up as an ordinary open failure.
//!
//! The Bus Pirate is left in bit-bang mode when `piocli` exits, so levels and
//! modes it set stay applied, and the next run picks the device up from
//! there without a reset.

use buspirate::gpio::BusPirateHal;
use buspirate::BusPirate;
use embedded_hal::blocking::delay::DelayUs;
use log::debug;
use pio::{Attributes, Hal, PinId};
use serial_embedded_hal::{BaudRate, CharSize, FlowControl, Parity, PortSettings, Serial, StopBits};
use serial_embedded_hal::{Rx, Tx};
use std::time::{Duration, Instant};
use thiserror::Error;

const SETTINGS: PortSettings = PortSettings {
    baud_rate: BaudRate::Baud115200,
    char_size: CharSize::Bits8,
    parity: Parity::ParityNone,
    stop_bits: StopBits::Stop1,
    flow_control: FlowControl::FlowNone,
};

type Link = BusPirateHal<Tx, Rx, SpinDelay>;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("cannot open serial port {path}: {reason}")]
    Connect { path: String, reason: String },

    #[error("Bus Pirate error: {0}")]
    Link(String),
}

fn link_error<E: std::fmt::Debug>(err: E) -> DeviceError {
    DeviceError::Link(format!("{:?}", err))
}

/// `SpinDelay` busy-waits, which holds microsecond delays far more closely
/// than sleeping would.
pub struct SpinDelay;

impl DelayUs<u32> for SpinDelay {
    fn delay_us(&mut self, us: u32) {
        let deadline = Instant::now() + Duration::from_micros(u64::from(us));
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// `Device` is a `pio::Hal` backed by the Bus Pirate on serial port `path`.
pub struct Device {
    path: String,
    link: Option<Link>,
}

impl Device {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            link: None,
        }
    }

    fn link(&mut self) -> Result<&mut Link, DeviceError> {
        let link = match self.link.take() {
            Some(link) => link,
            None => connect(&self.path)?,
        };
        Ok(self.link.get_or_insert(link))
    }
}

fn connect(path: &str) -> Result<Link, DeviceError> {
    debug!("connecting to Bus Pirate on {}", path);
    let port = Serial::new(path, &SETTINGS).map_err(|e| DeviceError::Connect {
        path: path.to_string(),
        reason: format!("{:?}", e),
    })?;
    let (tx, rx) = port.split();
    let bb = BusPirate::new(tx, rx).to_bitbang().map_err(link_error)?;
    debug!("Bus Pirate on {} is in bit-bang mode", path);
    Ok(BusPirateHal::new(bb, SpinDelay))
}

impl Hal for Device {
    type Error = DeviceError;

    fn open_pin(&mut self, pin: PinId) -> Result<(), DeviceError> {
        self.link()?.open_pin(pin).map_err(link_error)
    }

    fn close_pin(&mut self, pin: PinId) {
        if let Some(link) = self.link.as_mut() {
            link.close_pin(pin);
        }
    }

    fn open_port(&mut self, port: u8) -> Result<(), DeviceError> {
        self.link()?.open_port(port).map_err(link_error)
    }

    fn close_port(&mut self, port: u8) {
        if let Some(link) = self.link.as_mut() {
            link.close_port(port);
        }
    }

    fn pin_value(&mut self, pin: PinId) -> Result<bool, DeviceError> {
        self.link()?.pin_value(pin).map_err(link_error)
    }

    fn port_value(&mut self, port: u8) -> Result<u32, DeviceError> {
        self.link()?.port_value(port).map_err(link_error)
    }

    fn write_pin(&mut self, pin: PinId, high: bool) -> Result<(), DeviceError> {
        self.link()?.write_pin(pin, high).map_err(link_error)
    }

    fn set_attributes(&mut self, pin: PinId, attrs: Attributes) -> Result<(), DeviceError> {
        self.link()?.set_attributes(pin, attrs).map_err(link_error)
    }

    fn wait_us(&mut self, us: u32) {
        match self.link.as_mut() {
            Some(link) => link.wait_us(us),
            None => SpinDelay.delay_us(us),
        }
    }
}

//! Module `sim` contains an in-memory `Hal`, for exercising pin code without
//! any hardware attached.
//!
//! `SimPio` behaves like a microcontroller with a configurable number of
//! 32-pin port groups. It remembers pin levels and attributes, counts the
//! handles that are currently open and keeps a short log of the operations
//! performed, so tests can check exactly what a piece of code did.

use crate::Attributes;
use crate::Hal;
use crate::PinId;

pub const MAX_PORTS: usize = 16;
pub const PINS_PER_PORT: u8 = 32;

/// The number of events `SimPio` records. Later events are dropped.
pub const EVENT_CAPACITY: usize = 32;

/// `Event` is one recorded `Hal` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    OpenPin(PinId),
    ClosePin(PinId),
    OpenPort(u8),
    ClosePort(u8),
    Write(PinId, bool),
    Attributes(PinId, Attributes),
    Wait(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// `NoSuchPort` indicates a port index beyond those the simulator was
    /// created with.
    NoSuchPort(u8),

    /// `NoSuchPin` indicates a pin number beyond `PINS_PER_PORT`.
    NoSuchPin(PinId),

    /// `Unavailable` is returned by every open once `fail_opens` is set.
    Unavailable,
}

pub struct SimPio {
    ports: usize,
    values: [u32; MAX_PORTS],
    attrs: [[Attributes; PINS_PER_PORT as usize]; MAX_PORTS],
    open_handles: i32,
    fail_opens: bool,
    events: [Event; EVENT_CAPACITY],
    event_count: usize,
}

impl SimPio {
    /// `new` creates a simulator with port groups `0..ports`, all pins low
    /// and configured as floating inputs. `ports` is capped at `MAX_PORTS`.
    pub fn new(ports: usize) -> Self {
        Self {
            ports: if ports > MAX_PORTS { MAX_PORTS } else { ports },
            values: [0; MAX_PORTS],
            attrs: [[Attributes::INPUT_FLOAT; PINS_PER_PORT as usize]; MAX_PORTS],
            open_handles: 0,
            fail_opens: false,
            events: [Event::Wait(0); EVENT_CAPACITY],
            event_count: 0,
        }
    }

    /// `fail_opens` makes every subsequent open fail with
    /// `SimError::Unavailable`, as if the device were missing.
    pub fn fail_opens(&mut self, fail: bool) {
        self.fail_opens = fail;
    }

    pub fn set_port_bits(&mut self, port: u8, bits: u32) {
        self.values[port as usize] = bits;
    }

    pub fn port_bits(&self, port: u8) -> u32 {
        self.values[port as usize]
    }

    pub fn attributes(&self, pin: PinId) -> Attributes {
        self.attrs[pin.port as usize][pin.pin as usize]
    }

    /// `open_handles` is the number of opens not yet balanced by a close.
    pub fn open_handles(&self) -> i32 {
        self.open_handles
    }

    pub fn events(&self) -> &[Event] {
        &self.events[..self.event_count]
    }

    /// `opens` counts the pin and port opens that were attempted, whether or
    /// not they succeeded.
    pub fn opens(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::OpenPin(_) | Event::OpenPort(_)))
            .count()
    }

    fn record(&mut self, event: Event) {
        if self.event_count < EVENT_CAPACITY {
            self.events[self.event_count] = event;
            self.event_count += 1;
        }
    }

    fn check_port(&self, port: u8) -> Result<(), SimError> {
        if (port as usize) < self.ports {
            Ok(())
        } else {
            Err(SimError::NoSuchPort(port))
        }
    }

    fn check_pin(&self, pin: PinId) -> Result<(), SimError> {
        self.check_port(pin.port)?;
        if pin.pin < PINS_PER_PORT {
            Ok(())
        } else {
            Err(SimError::NoSuchPin(pin))
        }
    }
}

impl Hal for SimPio {
    type Error = SimError;

    fn open_pin(&mut self, pin: PinId) -> Result<(), SimError> {
        self.record(Event::OpenPin(pin));
        if self.fail_opens {
            return Err(SimError::Unavailable);
        }
        self.check_pin(pin)?;
        self.open_handles += 1;
        Ok(())
    }

    fn close_pin(&mut self, pin: PinId) {
        self.record(Event::ClosePin(pin));
        self.open_handles -= 1;
    }

    fn open_port(&mut self, port: u8) -> Result<(), SimError> {
        self.record(Event::OpenPort(port));
        if self.fail_opens {
            return Err(SimError::Unavailable);
        }
        self.check_port(port)?;
        self.open_handles += 1;
        Ok(())
    }

    fn close_port(&mut self, port: u8) {
        self.record(Event::ClosePort(port));
        self.open_handles -= 1;
    }

    fn pin_value(&mut self, pin: PinId) -> Result<bool, SimError> {
        self.check_pin(pin)?;
        Ok(self.values[pin.port as usize] & (1 << pin.pin) != 0)
    }

    fn port_value(&mut self, port: u8) -> Result<u32, SimError> {
        self.check_port(port)?;
        Ok(self.values[port as usize])
    }

    fn write_pin(&mut self, pin: PinId, high: bool) -> Result<(), SimError> {
        self.check_pin(pin)?;
        self.record(Event::Write(pin, high));
        let bit = 1 << pin.pin;
        let value = &mut self.values[pin.port as usize];
        if high {
            *value |= bit;
        } else {
            *value &= !bit;
        }
        Ok(())
    }

    fn set_attributes(&mut self, pin: PinId, attrs: Attributes) -> Result<(), SimError> {
        self.check_pin(pin)?;
        self.record(Event::Attributes(pin, attrs));
        self.attrs[pin.port as usize][pin.pin as usize] = attrs;
        Ok(())
    }

    fn wait_us(&mut self, us: u32) {
        self.record(Event::Wait(us));
    }
}

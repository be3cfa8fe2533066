//! A scripted stand-in for a Bus Pirate on the other end of a serial line,
//! implementing just enough of the terminal and bit-bang behaviour for the
//! tests in this crate.

use core::convert::Infallible;
use embedded_hal::serial;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

const BANNER: &[u8] = b"RESET\r\n\r\nBus Pirate v3.b\r\nHiZ>";

#[derive(Default)]
struct State {
    binary: bool,
    nuls: u8,
    mute: bool,
    inputs: u8,
    outputs: u8,
    external: u8,
    sent: Vec<u8>,
    rx: VecDeque<u8>,
}

impl State {
    fn levels(&self) -> u8 {
        (self.external & self.inputs) | (self.outputs & !self.inputs & 0b00011111)
    }

    fn receive(&mut self, b: u8) {
        self.sent.push(b);
        if self.mute {
            return;
        }
        if !self.binary {
            // Terminal mode only gives way after twenty nuls in a row.
            if b != 0x00 {
                self.nuls = 0;
            }
            match b {
                0x00 => {
                    self.nuls += 1;
                    if self.nuls == 20 {
                        self.nuls = 0;
                        self.binary = true;
                        self.inputs = 0b00011111;
                        self.outputs = 0;
                        self.rx.extend(b"BBIO1");
                    }
                }
                b'#' => self.rx.extend(BANNER),
                _ => (),
            }
            return;
        }
        match b {
            0x00 => self.rx.extend(b"BBIO1"),
            0x0F => self.binary = false,
            b if b & 0b11100000 == 0b01000000 => {
                self.inputs = b & 0b00011111;
                let levels = self.levels();
                self.rx.push_back(levels);
            }
            b if b & 0b10000000 != 0 => {
                self.outputs = b & 0b01111111;
                let levels = self.levels();
                self.rx.push_back(levels | (b & 0b01100000));
            }
            _ => (),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakePirate {
    state: Rc<RefCell<State>>,
}

pub struct FakeTx(Rc<RefCell<State>>);
pub struct FakeRx(Rc<RefCell<State>>);

impl FakePirate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn split(&self) -> (FakeTx, FakeRx) {
        (FakeTx(self.state.clone()), FakeRx(self.state.clone()))
    }

    /// A muted device swallows everything and never answers.
    pub fn set_mute(&self, mute: bool) {
        self.state.borrow_mut().mute = mute;
    }

    /// `drive_inputs` sets the levels seen on pins configured as inputs.
    pub fn drive_inputs(&self, levels: u8) {
        self.state.borrow_mut().external = levels;
    }

    pub fn in_binary_mode(&self) -> bool {
        self.state.borrow().binary
    }

    pub fn pending_rx(&self) -> usize {
        self.state.borrow().rx.len()
    }

    pub fn sent(&self) -> Vec<u8> {
        self.state.borrow().sent.clone()
    }

    /// `levels` is what the pins read right now, as a "configure" reply would
    /// report them.
    pub fn levels(&self) -> u8 {
        self.state.borrow().levels()
    }

    /// The most recent "set pins" byte, power and pull-up bits included.
    pub fn outputs(&self) -> u8 {
        self.state.borrow().outputs
    }
}

impl serial::Write<u8> for FakeTx {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        self.0.borrow_mut().receive(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}

impl serial::Read<u8> for FakeRx {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Infallible> {
        self.0
            .borrow_mut()
            .rx
            .pop_front()
            .ok_or(nb::Error::WouldBlock)
    }
}

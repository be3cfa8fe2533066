//! Bus Pirate bit-bang client library
//!
//! This library drives the [Bus Pirate](http://dangerousprototypes.com/docs/Bus_Pirate)
//! "binary bit-bang" mode, in which the host directly controls five of the
//! Bus Pirate's I/O pins, and exposes those pins as a `pio::Hal` so that they
//! can be read, written, configured and pulsed like the pins of a
//! microcontroller port. The implemented protocol is that of the Bus Pirate
//! v3.6.
//!
//! At initialization, the bus pirate is usually in its normal terminal mode,
//! and so the first step implemented by this library is to switch into
//! binary mode. A Bus Pirate still in bit-bang mode from an earlier session
//! is picked up as it is, keeping whatever its pins were left doing.
//!
//! The entry point is `BusPirate::new`, which takes (and consumes) a serial
//! writer and a serial reader as defined by
//! [`embedded_hal::serial`](https://docs.rs/embedded-hal/0.2.3/embedded_hal/serial/).
//! If you are running on a general computing platform then you can use
//! [`serial_embedded_hal`](https://docs.rs/serial-embedded-hal/0.1.2/serial_embedded_hal/struct.Serial.html)
//! to connect with a serial port provided by your operating system:
//!
//! ```ignore
//! let port = Serial::new("/dev/ttyUSB0", &settings)?;
//! let (tx, rx) = port.split();
//! let bb = BusPirate::new(tx, rx).to_bitbang()?;
//! ```
//!
//! The resulting `bitbang::BitBang` object can be used on its own, or wrapped
//! in a `gpio::BusPirateHal` together with a delay provider:
//!
//! ```ignore
//! let mut hal = BusPirateHal::new(bb, delay);
//! let mut pin = pio::Pin::open(&mut hal, PinId::new(0, 4))?;
//! pin.pulse(true, 100)?;
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod bitbang;
pub mod gpio;
mod low;
#[cfg(test)]
mod testing;

use embedded_hal::serial;

const PROTO_VERSION_MSG: [u8; 5] = *b"BBIO1";

const CMD_RESET_BINARY: u8 = 0b00000000;
const CMD_RESET_TERMINAL: u8 = 0b00001111;

/// `BusPirate` represents a Bus Pirate device in its normal terminal mode, not
/// yet initialized into any binary mode.
///
/// The primary method on `BusPirate` is `to_bitbang`, which transitions the
/// device into "binary bit-bang" mode.
///
/// ```ignore
/// let bb = bp.to_bitbang()?;
/// ```
#[derive(Debug, Clone)]
pub struct BusPirate<TX: serial::Write<u8>, RX: serial::Read<u8>> {
    ch: low::Channel<TX, RX>,
}

impl<TX, RX, TXErr, RXErr> BusPirate<TX, RX>
where
    TX: serial::Write<u8, Error = TXErr>,
    RX: serial::Read<u8, Error = RXErr>,
{
    /// `BusPirate::new` associates some serial channels with a new `BusPirate`
    /// object.
    ///
    /// The transmit and receive objects are consumed. If the caller needs to
    /// access them again, it must call `release` to discard the `BusPirate`
    /// object and recover the original objects.
    pub fn new(tx: TX, rx: RX) -> Self {
        Self {
            ch: low::Channel::new(tx, rx),
        }
    }

    /// `to_bitbang` directs the Bus Pirate to move into "binary bit-bang" mode.
    ///
    /// A Bus Pirate already in bit-bang mode, such as one left there by an
    /// earlier session, answers the first nul with the version string and is
    /// used as it is, without a reset. Otherwise the Bus Pirate requires
    /// several steps to properly switch from terminal mode into binary
    /// bitbang mode, so this method can potentially be slow due to sending
    /// and receiving several characters.
    ///
    /// `to_bitbang` consumes the `BusPirate` object and returns a `BitBang`
    /// object in its place. To recover the `BusPirate` object, call `close`
    /// on the `BitBang` object to reset the Bus Pirate back into terminal mode.
    pub fn to_bitbang(mut self) -> Result<bitbang::BitBang<TX, RX>, Error<TXErr, RXErr>> {
        self.ch.eat_rx_buffer()?;
        self.ch.write(CMD_RESET_BINARY)?;
        self.ch.flush()?;
        if read_version(&mut self.ch)? {
            self.ch.eat_rx_buffer()?;
            return Ok(bitbang::BitBang::new(self.ch));
        }

        // The Bus Pirate could be in any other mode when we find it, so
        // we follow the advice given in the protocol documentation:
        // - Send newline 10 times to escape from any menu/prompts in progress
        // - Send '#' to reset
        // - Send nul (0x00) up to 20 times to enter binary protocol mode

        for _ in 0..10 {
            self.ch.write(b'\n')?;
        }
        self.ch.write(b'#')?;
        self.ch.write(b'\n')?;
        self.ch.flush()?;

        // Whatever the reset printed (version banner, "HiZ>" prompt) is
        // still waiting in the receive buffer.
        self.ch.eat_rx_buffer()?;

        binary_reset_handshake(self.ch)
    }

    /// `release` returns the serial transmit and receive objects wrapped by
    /// the `BusPirate` object.
    ///
    /// This consumes the `BusPirate` object.
    pub fn release(self) -> (TX, RX) {
        (self.ch.tx, self.ch.rx)
    }
}

/// `Error` represents communication errors.
#[derive(Debug, PartialEq)]
pub enum Error<TXErr, RXErr> {
    /// `Protocol` indicates that the library receieved an invalid or unexpected
    /// response from the Bus Pirate in response to a request.
    Protocol,

    /// `Request` indicates that the caller provided invalid arguments that
    /// could not be checked at compile time.
    Request,

    /// `NoSuchPort` indicates a port group other than the single one the
    /// Bus Pirate exposes.
    NoSuchPort(u8),

    /// `NoSuchPin` indicates a pin number beyond the five bit-bang pins.
    NoSuchPin(u8),

    /// `Unsupported` indicates a pin configuration the Bus Pirate hardware
    /// can't provide, such as pull-down resistors.
    Unsupported,

    /// `Write` indicates that the underlying serial write object returned an
    /// error.
    ///
    /// The data is the error returned by the underlying serial implementation.
    Write(TXErr),

    /// `Read` indicates that the underlying serial read object returned an
    /// error.
    ///
    /// The data is the error returned by the underlying serial implementation.
    Read(RXErr),
}

impl<TXErr, RXErr> Error<TXErr, RXErr> {
    fn tx(got: TXErr) -> Self {
        Error::Write(got)
    }

    fn rx(got: RXErr) -> Self {
        Error::Read(got)
    }
}

fn binary_reset_handshake<TX: serial::Write<u8>, RX: serial::Read<u8>>(
    mut ch: low::Channel<TX, RX>,
) -> Result<bitbang::BitBang<TX, RX>, Error<TX::Error, RX::Error>> {
    let mut ok = false;
    for _ in 0..20 {
        ch.flush()?;
        ch.write(CMD_RESET_BINARY)?;
        if read_version(&mut ch)? {
            ok = true;
            break;
        }
    }

    if !ok {
        return Err(Error::Protocol);
    }

    // Each extra nul we sent may have earned another "BBIO1".
    ch.eat_rx_buffer()?;

    Ok(bitbang::BitBang::new(ch))
}

// Reads until the version message has arrived or nothing more is waiting.
fn read_version<TX: serial::Write<u8>, RX: serial::Read<u8>>(
    ch: &mut low::Channel<TX, RX>,
) -> Result<bool, Error<TX::Error, RX::Error>> {
    let mut correct = 0;
    loop {
        match ch.rx.read() {
            Ok(c) => {
                if c != PROTO_VERSION_MSG[correct] {
                    correct = 0;
                }
                if c == PROTO_VERSION_MSG[correct] {
                    correct += 1;
                    if correct == PROTO_VERSION_MSG.len() {
                        return Ok(true);
                    }
                }
            }
            Err(e) => match e {
                nb::Error::WouldBlock => return Ok(false),
                nb::Error::Other(e) => return Err(Error::rx(e)),
            },
        }
    }
}

fn close_handshake<TX: serial::Write<u8>, RX: serial::Read<u8>>(
    mut ch: low::Channel<TX, RX>,
) -> Result<BusPirate<TX, RX>, Error<TX::Error, RX::Error>> {
    ch.write(CMD_RESET_TERMINAL)?;
    ch.flush()?;
    Ok(BusPirate { ch: ch })
}

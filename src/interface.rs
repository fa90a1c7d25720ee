//! Hardware interface abstraction
//!
//! This module provides the [`PanelInterface`] trait and the [`Interface`]
//! struct for reaching the panel's control lines through a shift-register
//! chain on SPI plus two discrete GPIO pins.
//!
//! ## Hardware Requirements
//!
//! The panel is controller-less; all of its gate- and source-driver inputs
//! hang off a 16-bit shift-register chain shifted over SPI (MOSI + SCK, with
//! the SPI CS line wired to the register's storage clock so every transfer
//! latches the outputs). Two timing-critical lines bypass the chain and sit
//! on dedicated pins:
//! - **CL**: horizontal (source) clock
//! - **OE**: source-driver output enable
//!
//! A frame on the wire is `[control byte, data byte]`, control byte first,
//! matching a chain wired control-register-last.

use core::fmt::Debug;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

/// Trait for the hardware seam below the driver
///
/// This trait abstracts over the physical transport, allowing the
/// [`Driver`](crate::driver::Driver) to work with any SPI + GPIO combination
/// that satisfies embedded-hal traits, and letting tests substitute a
/// recording implementation.
pub trait PanelInterface {
    /// Error type for interface operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Shift one 16-bit frame into the register chain and latch it
    ///
    /// `control` is the shift-register-resident half of the control word;
    /// `data` is the source-driver data byte (four 2-bit drive values).
    ///
    /// # Errors
    ///
    /// Returns an error if the SPI transfer fails.
    fn write_frame(&mut self, control: u8, data: u8) -> Result<(), Self::Error>;

    /// Drive the two discrete lines
    ///
    /// # Arguments
    ///
    /// * `cl` - horizontal clock level
    /// * `oe` - output-enable level
    ///
    /// # Errors
    ///
    /// Returns an error if a GPIO write fails.
    fn write_discrete(&mut self, cl: bool, oe: bool) -> Result<(), Self::Error>;
}

/// Errors that can occur at the interface level
///
/// Generic over SPI and GPIO error types.
#[derive(Debug)]
pub enum InterfaceError<SpiErr, PinErr> {
    /// SPI communication error
    Spi(SpiErr),
    /// GPIO pin error
    Pin(PinErr),
}

impl<SpiErr: Debug, PinErr: Debug> core::fmt::Display for InterfaceError<SpiErr, PinErr> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "Pin error: {e:?}"),
        }
    }
}

impl<SpiErr: Debug, PinErr: Debug> core::error::Error for InterfaceError<SpiErr, PinErr> {}

/// Hardware interface implementation over embedded-hal v1.0
///
/// ## Type Parameters
///
/// * `SPI` - SPI device implementing [`SpiDevice`], clocking the register chain
/// * `CL` - horizontal clock pin implementing [`OutputPin`]
/// * `OE` - output-enable pin implementing [`OutputPin`]
pub struct Interface<SPI, CL, OE> {
    /// SPI device shifting the register chain
    spi: SPI,
    /// Horizontal clock pin
    cl: CL,
    /// Source-driver output-enable pin
    oe: OE,
}

impl<SPI, CL, OE> Interface<SPI, CL, OE>
where
    SPI: SpiDevice,
    CL: OutputPin,
    OE: OutputPin,
{
    /// Create a new Interface
    ///
    /// # Arguments
    ///
    /// * `spi` - SPI device (must implement [`SpiDevice`])
    /// * `cl` - horizontal clock pin (output)
    /// * `oe` - output-enable pin (output)
    pub fn new(spi: SPI, cl: CL, oe: OE) -> Self {
        Self { spi, cl, oe }
    }

    /// Release the underlying SPI device and pins
    pub fn release(self) -> (SPI, CL, OE) {
        (self.spi, self.cl, self.oe)
    }
}

impl<SPI, CL, OE, PinErr> PanelInterface for Interface<SPI, CL, OE>
where
    SPI: SpiDevice,
    SPI::Error: Debug,
    CL: OutputPin<Error = PinErr>,
    OE: OutputPin<Error = PinErr>,
    PinErr: Debug,
{
    type Error = InterfaceError<SPI::Error, PinErr>;

    fn write_frame(&mut self, control: u8, data: u8) -> Result<(), Self::Error> {
        self.spi
            .write(&[control, data])
            .map_err(InterfaceError::Spi)
    }

    fn write_discrete(&mut self, cl: bool, oe: bool) -> Result<(), Self::Error> {
        self.cl.set_state(cl.into()).map_err(InterfaceError::Pin)?;
        self.oe.set_state(oe.into()).map_err(InterfaceError::Pin)?;
        Ok(())
    }
}

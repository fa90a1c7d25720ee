//! Signal-level driver for shift-register-wired electrophoretic panels
//!
//! Drives a bare 800x600 e-paper panel whose control lines hang off a
//! serial-in parallel-out shift register, with the pixel clock and output
//! enable on dedicated GPIOs. There is no display controller on the other
//! end: this crate generates the waveforms itself, stage by stage, row by
//! row.
//!
//! ## Features
//!
//! - `no_std` compatible
//! - `embedded-hal` v1.0 support
//! - Grayscale (4-bit) and binary (1-bit) pixel transitions
//! - DC-balanced, amplitude-proportional update waveforms, plus a
//!   fixed-table binary mode
//! - Rectangular region updates from caller-supplied row data
//! - Full-panel refresh passes for ghost removal
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::OutputPin;
//! use embedded_hal::spi::{Operation, SpiDevice};
//! use eink_sr::{BitDepth, Builder, Driver, Interface, UpdatePolicy};
//!
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiDevice for MockSpi {
//! #     fn transaction(
//! #         &mut self,
//! #         _operations: &mut [Operation<'_, u8>],
//! #     ) -> Result<(), Self::Error> {
//! #         Ok(())
//! #     }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let spi = MockSpi;
//! # let cl = MockPin;
//! # let oe = MockPin;
//! # let mut delay = MockDelay;
//! let interface = Interface::new(spi, cl, oe);
//! let config = Builder::new()
//!     .bit_depth(BitDepth::Four)
//!     .policy(UpdatePolicy::AmplitudeProportional)
//!     .build();
//!
//! let mut panel = Driver::new(interface, config);
//! let _ = panel.setup();
//! let _ = panel.power_on(&mut delay);
//! ```

#![no_std]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

/// Driver configuration types and builder
pub mod config;
/// Control-line word state and minimal-write flushing
mod control;
/// Update orchestration and the public driver API
pub mod driver;
/// Error types for the driver
pub mod error;
/// Hardware interface abstraction
pub mod interface;
/// Control-line bit assignments
pub mod line;
/// Pixel packing and row addressing
pub mod pixel;
/// Power rail sequencing
pub mod power;
/// Horizontal and vertical scan primitives
mod scan;
/// Waveform stage generation
pub mod waveform;

pub use config::{Builder, Config, HEIGHT, WIDTH};
pub use driver::{Driver, Region, RowFetch, RowSource};
pub use error::Error;
pub use interface::{Interface, InterfaceError, PanelInterface};
pub use pixel::{BitDepth, MAX_ROW_BYTES};
pub use power::PowerState;
pub use waveform::{DriveClass, PIXELS_PER_IO_BYTE, StageTiming, UpdatePolicy};

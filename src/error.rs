//! Error types for the driver
//!
//! Two kinds of failure surface from the driver:
//!
//! - [`Error::Interface`] — the hardware seam failed (SPI or GPIO); this is
//!   fatal to the operation in flight.
//! - Everything else is a misuse caught before the panel is touched:
//!   a region outside the panel bounds, or a scan attempted while the
//!   voltage rails are not up.
//!
//! A row source asking to stop is **not** an error; it is the `Ok(false)`
//! return of [`Driver::update`](crate::driver::Driver::update).

use crate::interface::PanelInterface;
use crate::power::PowerState;

/// Errors that can occur when driving the panel
///
/// Generic over the interface type to preserve the specific hardware error
/// type, so callers can match on the underlying SPI/GPIO failure.
#[derive(Debug)]
pub enum Error<I: PanelInterface> {
    /// Interface error (SPI/GPIO)
    ///
    /// Wraps the underlying hardware error from the [`PanelInterface`]
    /// implementation.
    Interface(I::Error),
    /// Region outside panel bounds or empty
    ///
    /// A region must satisfy `0 <= x0 < x1 <= WIDTH` and
    /// `0 <= y0 < y1 <= HEIGHT` (upper bounds exclusive).
    InvalidRegion {
        /// Left column (inclusive)
        x0: u16,
        /// Top row (inclusive)
        y0: u16,
        /// Right column (exclusive)
        x1: u16,
        /// Bottom row (exclusive)
        y1: u16,
    },
    /// Scan attempted while the panel is not powered
    ///
    /// `update`, `full_update` and `refresh` require the power sequencer to
    /// have reached [`PowerState::Active`].
    NotPowered {
        /// Power state at the time of the call
        state: PowerState,
    },
}

impl<I: PanelInterface> core::fmt::Display for Error<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(_) => write!(f, "Interface error"),
            Self::InvalidRegion { x0, y0, x1, y1 } => {
                write!(f, "Invalid region: ({x0},{y0})-({x1},{y1})")
            }
            Self::NotPowered { state } => {
                write!(f, "Panel not powered for scanning (state: {state:?})")
            }
        }
    }
}

impl<I: PanelInterface + core::fmt::Debug> core::error::Error for Error<I> {}

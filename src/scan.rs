//! Scan/drive engine
//!
//! Horizontal scans shift one row of 2-bit drive values into the source
//! drivers and latch them; vertical scans advance the gate shift register
//! one row at a time, applying the stage's write window at each step. The
//! write window is the only timing-critical piece: its assert/deassert
//! phases are measured in hundreds of nanoseconds and run inside a
//! `critical_section` scope so preemption cannot stretch them. Everything
//! else tolerates microsecond-to-millisecond jitter and stays preemptible.

use embedded_hal::delay::DelayNs;

use crate::config::WIDTH;
use crate::driver::Driver;
use crate::error::Error;
use crate::interface::PanelInterface;
use crate::line;
use crate::pixel::get_row_pixel;
use crate::waveform::{DriveClass, StageTiming, PIXELS_PER_IO_BYTE};

/// Write window used for rows outside the active region.
pub(crate) const BLANK_WRITE: StageTiming = StageTiming {
    assert_ns: 5000,
    deassert_ns: 5000,
};

/// Gate rows the panel exposes beyond its nominal height.
///
/// A few extra rows are visible past row 599 on the bench, so uniform
/// refreshes overscan by this many row steps.
pub(crate) const EXTRA_SCAN_ROWS: u16 = 10;

impl<I: PanelInterface> Driver<I> {
    fn assert_lines(&mut self, lines: u16) -> Result<(), Error<I>> {
        self.bus.assert_lines(lines).map_err(Error::Interface)
    }

    fn release_lines(&mut self, lines: u16) -> Result<(), Error<I>> {
        self.bus.release_lines(lines).map_err(Error::Interface)
    }

    /// Pulse the horizontal clock `n` times.
    fn hclk(&mut self, n: usize) -> Result<(), Error<I>> {
        for _ in 0..n {
            self.assert_lines(line::CL)?;
            self.release_lines(line::CL)?;
        }
        Ok(())
    }

    /// Begin a horizontal scan: enable the source outputs and assert the
    /// (active-low) start pulse.
    fn hscan_start(&mut self) -> Result<(), Error<I>> {
        self.assert_lines(line::OE)?;
        self.release_lines(line::SPH)
    }

    /// Clock one data byte into the row.
    ///
    /// The byte is only reshifted when it differs from the previous one;
    /// the clock pulse happens either way.
    fn data_write(&mut self, byte: u8) -> Result<(), Error<I>> {
        self.bus.load_data(byte).map_err(Error::Interface)?;
        self.hclk(1)
    }

    /// Finish a horizontal scan: release the start pulse and latch the row
    /// with the mandated dwell clocks around the latch pulse.
    fn hscan_stop(&mut self) -> Result<(), Error<I>> {
        self.assert_lines(line::SPH)?;
        self.hclk(2)?;

        self.assert_lines(line::LE)?;
        self.hclk(2)?;
        self.release_lines(line::LE)?;
        self.hclk(2)
    }

    /// Shift and latch a row of one uniform drive class.
    pub(crate) fn solid_row(&mut self, class: DriveClass) -> Result<(), Error<I>> {
        self.data_write(class.quad())?;
        self.hscan_start()?;
        self.hclk(WIDTH as usize / PIXELS_PER_IO_BYTE)?;
        self.hscan_stop()
    }

    /// Shift and latch one row of per-pixel drive values for `stage`.
    ///
    /// Pixels inside `[x0, x1)` are computed from the update policy; every
    /// column outside the region is forced to neutral drive, since the row
    /// is one indivisible bus transaction and stale source data would
    /// otherwise be applied to pixels the caller never asked to touch.
    pub(crate) fn row_stage(
        &mut self,
        stage: usize,
        x0: u16,
        x1: u16,
        old_row: &[u8],
        new_row: &[u8],
    ) -> Result<(), Error<I>> {
        let policy = self.config.policy;
        let depth = self.config.bit_depth;
        let (x0, x1) = (x0 as usize, x1 as usize);

        self.hscan_start()?;

        for x in (0..WIDTH as usize).step_by(PIXELS_PER_IO_BYTE) {
            let mut byte = 0u8;
            for i in 0..PIXELS_PER_IO_BYTE {
                let xi = x + i;
                let class = if x0 <= xi && xi < x1 {
                    let old = get_row_pixel(old_row, xi - x0, depth);
                    let new = get_row_pixel(new_row, xi - x0, depth);
                    policy.value(stage, old, new, depth)
                } else {
                    DriveClass::Neutral
                };
                byte = (byte << 2) | class.bits();
            }
            self.data_write(byte)?;
        }

        self.hscan_stop()
    }

    /// Pulse the vertical clock `n` times at its coarse idle rate.
    fn vclk<D: DelayNs>(&mut self, n: usize, delay: &mut D) -> Result<(), Error<I>> {
        for _ in 0..n {
            self.release_lines(line::CKV)?;
            delay.delay_us(30);
            self.assert_lines(line::CKV)?;
            delay.delay_us(30);
        }
        Ok(())
    }

    /// Apply the write window to the current row and advance the gate scan.
    ///
    /// The assert/deassert window runs with interrupts masked; the panel's
    /// analog response is sensitive to tens of nanoseconds of timing error,
    /// and this window is the only place where that matters. The scope is
    /// released on every exit path, including an interface error.
    pub(crate) fn row_write<D: DelayNs>(
        &mut self,
        timing: StageTiming,
        delay: &mut D,
    ) -> Result<(), Error<I>> {
        critical_section::with(|_| {
            self.assert_lines(line::OE | line::CKV)?;
            delay.delay_ns(timing.assert_ns);
            self.release_lines(line::CKV)?;
            delay.delay_ns(timing.deassert_ns);
            self.release_lines(line::OE)
        })?;

        self.hclk(2)
    }

    /// Begin a vertical scan pass over the whole panel.
    pub(crate) fn frame_start<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I>> {
        self.assert_lines(line::GMODE)?;
        delay.delay_us(1000);

        self.assert_lines(line::SPV)?;
        self.vclk(2, delay)?;
        self.release_lines(line::SPV)?;
        self.vclk(2, delay)?;
        self.assert_lines(line::SPV)?;
        self.vclk(2, delay)
    }

    /// Finish a vertical scan pass and park the gate driver.
    pub(crate) fn frame_stop<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I>> {
        // Flush the last latched row with a neutral write before winding
        // the gate driver down.
        self.solid_row(DriveClass::Neutral)?;
        self.row_write(BLANK_WRITE, delay)?;

        delay.delay_us(1);
        self.release_lines(line::CKV | line::OE)?;
        delay.delay_us(3000);
        self.assert_lines(line::CKV)?;
        delay.delay_us(430);
        self.release_lines(line::CKV)?;
        delay.delay_us(1);
        self.release_lines(line::GMODE)?;
        delay.delay_us(1);
        Ok(())
    }
}

//! Update orchestration and the public driver API
//!
//! [`Driver`] owns the control-line state and the power state, and exposes
//! the operations a host application needs: power sequencing, region and
//! full-panel updates, and uniform refreshes. Pixel data is pulled through a
//! caller-supplied [`RowSource`]; the driver never stores a framebuffer.

use embedded_hal::delay::DelayNs;
use log::{debug, trace};

use crate::config::{Config, HEIGHT, WIDTH};
use crate::control::ControlBus;
use crate::error::Error;
use crate::interface::PanelInterface;
use crate::line;
use crate::pixel::MAX_ROW_BYTES;
use crate::power::PowerState;
use crate::scan::{BLANK_WRITE, EXTRA_SCAN_ROWS};
use crate::waveform::{self, DriveClass};

/// Rectangular update region, upper bounds exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    /// Left column (inclusive)
    pub x0: u16,
    /// Top row (inclusive)
    pub y0: u16,
    /// Right column (exclusive)
    pub x1: u16,
    /// Bottom row (exclusive)
    pub y1: u16,
}

impl Region {
    /// The whole panel.
    pub const FULL: Self = Self {
        x0: 0,
        y0: 0,
        x1: WIDTH,
        y1: HEIGHT,
    };

    /// Create a new region. Bounds are validated when the region is used.
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Region width in pixels.
    pub const fn width(&self) -> u16 {
        self.x1 - self.x0
    }

    /// Region height in pixels.
    pub const fn height(&self) -> u16 {
        self.y1 - self.y0
    }

    const fn in_bounds(&self) -> bool {
        self.x0 < self.x1 && self.x1 <= WIDTH && self.y0 < self.y1 && self.y1 <= HEIGHT
    }
}

/// Result of one row fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowFetch {
    /// The old/new row buffers were filled.
    Fetched,
    /// Stop the update; remaining rows of the in-flight stage are driven
    /// blank and the update reports incomplete.
    Stop,
}

/// Supplier of row pixel data during an update
///
/// The driver calls [`fetch`](Self::fetch) once per row, strictly in
/// ascending `y` order within `[y0, y1)`, and never re-fetches or reorders.
/// The sequence is finite and not restartable: after [`RowFetch::Stop`] the
/// source is not consulted again for this update.
///
/// `old_row` must receive the pixels currently on the panel and `new_row`
/// the desired pixels, both packed at the configured [`BitDepth`]
/// (most-significant unit first) and indexed from the region's left edge
/// `x0`. The drive waveform is a function of the transition,
/// not just the destination, which is why both rows are required.
///
/// [`BitDepth`]: crate::pixel::BitDepth
pub trait RowSource {
    /// Fill the row buffers for row `y`, or signal a stop.
    fn fetch(
        &mut self,
        y: u16,
        x0: u16,
        x1: u16,
        old_row: &mut [u8],
        new_row: &mut [u8],
    ) -> RowFetch;
}

impl<F> RowSource for F
where
    F: FnMut(u16, u16, u16, &mut [u8], &mut [u8]) -> RowFetch,
{
    fn fetch(
        &mut self,
        y: u16,
        x0: u16,
        x1: u16,
        old_row: &mut [u8],
        new_row: &mut [u8],
    ) -> RowFetch {
        self(y, x0, x1, old_row, new_row)
    }
}

/// Core driver for a shift-register-wired e-paper panel
///
/// Owns the control-line state exclusively; no other code touches the
/// hardware while a `Driver` exists. All operations run on the calling
/// thread.
pub struct Driver<I>
where
    I: PanelInterface,
{
    /// Control-line state and its hardware interface
    pub(crate) bus: ControlBus<I>,
    /// Driver configuration
    pub(crate) config: Config,
    /// Power sequencer state
    pub(crate) power: PowerState,
}

impl<I> Driver<I>
where
    I: PanelInterface,
{
    /// Create a new Driver instance
    ///
    /// The hardware is not touched until [`setup`](Self::setup) is called.
    pub fn new(interface: I, config: Config) -> Self {
        Self {
            bus: ControlBus::new(interface),
            config,
            power: PowerState::Off,
        }
    }

    /// Claim the hardware and drive every line to its safe idle state
    ///
    /// Leaves the DC/DC converter disabled and all scan lines low.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interface`] if the bus cannot be written; no panel
    /// state has been established in that case.
    pub fn setup(&mut self) -> Result<(), Error<I>> {
        self.bus.write_word(line::SMPS).map_err(Error::Interface)
    }

    /// Access the underlying configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn interface_ref(&self) -> &I {
        self.bus.interface()
    }

    /// Update a rectangular region of the panel
    ///
    /// Runs the configured update waveform stage by stage. Every stage scans
    /// all panel rows: rows outside the region get a blank (neutral)
    /// horizontal scan, because the gate shift register needs one pulse per
    /// row to keep its position, and within active rows every column outside
    /// `[x0, x1)` is driven neutral.
    ///
    /// Returns `Ok(true)` if every stage completed, `Ok(false)` if the row
    /// source stopped the update early. On a stop the in-flight stage still
    /// blanks its remaining rows so the vertical scan finishes cleanly; no
    /// further stages run.
    ///
    /// # Errors
    ///
    /// [`Error::NotPowered`] unless [`power_on`](Self::power_on) has
    /// completed, [`Error::InvalidRegion`] for an empty or out-of-bounds
    /// region, [`Error::Interface`] on hardware failure.
    pub fn update<S, D>(
        &mut self,
        source: &mut S,
        region: Region,
        delay: &mut D,
    ) -> Result<bool, Error<I>>
    where
        S: RowSource,
        D: DelayNs,
    {
        self.require_active()?;
        if !region.in_bounds() {
            return Err(Error::InvalidRegion {
                x0: region.x0,
                y0: region.y0,
                x1: region.x1,
                y1: region.y1,
            });
        }

        let policy = self.config.policy;
        let depth = self.config.bit_depth;
        let mut old_row = [0u8; MAX_ROW_BYTES];
        let mut new_row = [0u8; MAX_ROW_BYTES];

        debug!(
            "update region ({},{})-({},{}) with {:?}",
            region.x0, region.y0, region.x1, region.y1, policy
        );

        let mut stopped = false;
        let mut stage = 0;
        while !stopped {
            let timing = policy.timings(stage, depth);
            if timing.is_end() {
                break;
            }
            trace!("update stage {stage}");

            self.frame_start(delay)?;

            let mut y = 0;
            if y < region.y0 {
                self.solid_row(DriveClass::Neutral)?;
                while y < region.y0 {
                    self.row_write(BLANK_WRITE, delay)?;
                    y += 1;
                }
            }

            while y < region.y1 {
                match source.fetch(y, region.x0, region.x1, &mut old_row, &mut new_row) {
                    RowFetch::Fetched => {}
                    RowFetch::Stop => {
                        stopped = true;
                        break;
                    }
                }
                self.row_stage(stage, region.x0, region.x1, &old_row, &new_row)?;
                self.row_write(timing, delay)?;
                y += 1;
            }

            if y < HEIGHT {
                self.solid_row(DriveClass::Neutral)?;
                while y < HEIGHT {
                    self.row_write(BLANK_WRITE, delay)?;
                    y += 1;
                }
            }

            self.frame_stop(delay)?;
            stage += 1;
        }

        Ok(!stopped)
    }

    /// Update the entire panel
    ///
    /// Equivalent to [`update`](Self::update) over [`Region::FULL`].
    pub fn full_update<S, D>(&mut self, source: &mut S, delay: &mut D) -> Result<bool, Error<I>>
    where
        S: RowSource,
        D: DelayNs,
    {
        self.update(source, Region::FULL, delay)
    }

    /// Drive the whole panel uniformly to one endpoint color
    ///
    /// `target` is a pixel code at the configured depth; only the endpoint
    /// colors (all-white or all-black) are meaningful. Used for deep-clean
    /// and ghost-removal passes. The number of waveform cycles and the
    /// inter-stage settle time come from the [`Config`].
    ///
    /// # Errors
    ///
    /// [`Error::NotPowered`] unless powered on, [`Error::Interface`] on
    /// hardware failure.
    pub fn refresh<D: DelayNs>(&mut self, target: u8, delay: &mut D) -> Result<(), Error<I>> {
        self.require_active()?;

        let depth = self.config.bit_depth;
        let cycles = self.config.refresh_cycles;
        debug!("refresh to pixel {target} ({cycles} cycle(s))");

        let mut stage = 0;
        loop {
            let timing = waveform::refresh_timings(stage, cycles);
            if timing.is_end() {
                break;
            }
            trace!("refresh stage {stage}");

            self.frame_start(delay)?;

            // One latched row serves the whole pass; the gate scan walks it
            // down the panel, overscanning the rows visible past the edge.
            self.solid_row(waveform::refresh_value(stage, target, depth))?;
            for _ in 0..HEIGHT + EXTRA_SCAN_ROWS {
                self.row_write(timing, delay)?;
            }

            self.frame_stop(delay)?;
            delay.delay_us(self.config.refresh_settle_us);
            stage += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Builder;
    use crate::pixel::{set_row_pixel, BitDepth};
    use crate::waveform::UpdatePolicy;
    use alloc::vec::Vec;

    const CKV: u8 = line::CKV as u8;
    const GMODE: u8 = line::GMODE as u8;

    /// Records every hardware write.
    #[derive(Debug, Default)]
    struct RecordingInterface {
        frames: Vec<(u8, u8)>,
        discretes: Vec<(bool, bool)>,
    }

    impl PanelInterface for RecordingInterface {
        type Error = core::convert::Infallible;

        fn write_frame(&mut self, control: u8, data: u8) -> Result<(), Self::Error> {
            self.frames.push((control, data));
            Ok(())
        }

        fn write_discrete(&mut self, cl: bool, oe: bool) -> Result<(), Self::Error> {
            self.discretes.push((cl, oe));
            Ok(())
        }
    }

    /// Fails every write once `remaining` hits zero.
    #[derive(Debug)]
    struct FailingInterface {
        remaining: usize,
    }

    impl PanelInterface for FailingInterface {
        type Error = &'static str;

        fn write_frame(&mut self, _control: u8, _data: u8) -> Result<(), Self::Error> {
            if self.remaining == 0 {
                return Err("bus fault");
            }
            self.remaining -= 1;
            Ok(())
        }

        fn write_discrete(&mut self, _cl: bool, _oe: bool) -> Result<(), Self::Error> {
            if self.remaining == 0 {
                return Err("bus fault");
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    struct MockDelay;
    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn binary_driver() -> Driver<RecordingInterface> {
        let config = Builder::new()
            .bit_depth(BitDepth::One)
            .policy(UpdatePolicy::FixedTable)
            .build();
        let mut driver = Driver::new(RecordingInterface::default(), config);
        driver.setup().unwrap();
        driver.power_on(&mut MockDelay).unwrap();
        driver
    }

    /// A row source producing a byte-aligned diagonal pattern.
    fn pattern_source() -> impl FnMut(u16, u16, u16, &mut [u8], &mut [u8]) -> RowFetch {
        |y, x0, x1, old_row, new_row| {
            for x in 0..usize::from(x1 - x0) {
                set_row_pixel(old_row, x, 0, BitDepth::One);
                let v = u8::from((x + usize::from(y)) % 16 < 8);
                set_row_pixel(new_row, x, v, BitDepth::One);
            }
            RowFetch::Fetched
        }
    }

    fn ckv_rising_edges(frames: &[(u8, u8)]) -> usize {
        let mut edges = 0;
        let mut prev = 0u8;
        for &(word, _) in frames {
            if prev & CKV == 0 && word & CKV != 0 {
                edges += 1;
            }
            prev = word;
        }
        edges
    }

    fn gmode_rising_edges(frames: &[(u8, u8)]) -> usize {
        let mut edges = 0;
        let mut prev = 0u8;
        for &(word, _) in frames {
            if prev & GMODE == 0 && word & GMODE != 0 {
                edges += 1;
            }
            prev = word;
        }
        edges
    }

    #[test]
    fn full_region_update_equals_full_update() {
        let mut by_region = binary_driver();
        let mut by_full = binary_driver();
        let mut delay = MockDelay;

        let completed = by_region
            .update(&mut pattern_source(), Region::FULL, &mut delay)
            .unwrap();
        assert!(completed);
        let completed = by_full
            .full_update(&mut pattern_source(), &mut delay)
            .unwrap();
        assert!(completed);

        assert_eq!(
            by_region.interface_ref().frames,
            by_full.interface_ref().frames
        );
        assert_eq!(
            by_region.interface_ref().discretes,
            by_full.interface_ref().discretes
        );
    }

    #[test]
    fn stopped_update_still_walks_every_row_of_the_stage() {
        let mut driver = binary_driver();
        let mut delay = MockDelay;
        let start = driver.interface_ref().frames.len();

        let mut fetched_ys = Vec::new();
        let mut source = |y: u16, _x0: u16, _x1: u16, _old: &mut [u8], _new: &mut [u8]| {
            fetched_ys.push(y);
            if y >= 10 { RowFetch::Stop } else { RowFetch::Fetched }
        };

        let completed = driver
            .update(&mut source, Region::FULL, &mut delay)
            .unwrap();
        assert!(!completed);

        // Rows 0..10 were fetched, the 11th fetch stopped the update.
        assert_eq!(fetched_ys, (0..=10).collect::<Vec<u16>>());

        let frames = &driver.interface_ref().frames[start..];
        // Only the in-flight stage ran: one gate-mode window.
        assert_eq!(gmode_rising_edges(frames), 1);
        // The vertical scan still stepped every row: 6 start-pulse clocks
        // (the first row's write window opens on the last of them), 599
        // further row steps, the wind-down row and its closing pulse.
        assert_eq!(ckv_rising_edges(frames), 6 + 599 + 2);
    }

    #[test]
    fn completed_stage_has_the_same_vertical_step_count() {
        let mut driver = binary_driver();
        let mut delay = MockDelay;
        let start = driver.interface_ref().frames.len();

        driver
            .update(&mut pattern_source(), Region::new(0, 0, 8, 1), &mut delay)
            .unwrap();

        let frames = &driver.interface_ref().frames[start..];
        let stages = gmode_rising_edges(frames);
        assert_eq!(stages, 4); // fixed-table stage count
        assert_eq!(ckv_rising_edges(frames), stages * (6 + 599 + 2));
    }

    #[test]
    fn rows_are_fetched_in_ascending_order_per_stage() {
        let mut driver = binary_driver();
        let mut delay = MockDelay;

        let mut fetched_ys = Vec::new();
        let mut source = |y: u16, _x0: u16, _x1: u16, old: &mut [u8], _new: &mut [u8]| {
            fetched_ys.push(y);
            old[0] = 0;
            RowFetch::Fetched
        };

        driver
            .update(&mut source, Region::new(0, 100, 8, 110), &mut delay)
            .unwrap();

        let per_stage: Vec<u16> = (100..110).collect();
        let expected: Vec<u16> = (0..4).flat_map(|_| per_stage.clone()).collect();
        assert_eq!(fetched_ys, expected);
    }

    #[test]
    fn update_rejects_out_of_bounds_regions() {
        let mut driver = binary_driver();
        let mut delay = MockDelay;
        let mut source = pattern_source();

        for region in [
            Region::new(0, 0, WIDTH + 1, HEIGHT),
            Region::new(0, 0, WIDTH, HEIGHT + 1),
            Region::new(8, 0, 8, HEIGHT),
            Region::new(16, 0, 8, 10),
        ] {
            let result = driver.update(&mut source, region, &mut delay);
            assert!(matches!(result, Err(Error::InvalidRegion { .. })), "{region:?}");
        }
    }

    #[test]
    fn update_requires_active_power() {
        let config = Builder::new()
            .bit_depth(BitDepth::One)
            .policy(UpdatePolicy::FixedTable)
            .build();
        let mut driver = Driver::new(RecordingInterface::default(), config);
        driver.setup().unwrap();
        let mut delay = MockDelay;

        let result = driver.update(&mut pattern_source(), Region::FULL, &mut delay);
        assert!(matches!(
            result,
            Err(Error::NotPowered {
                state: PowerState::Off
            })
        ));
        let result = driver.refresh(0, &mut delay);
        assert!(matches!(
            result,
            Err(Error::NotPowered {
                state: PowerState::Off
            })
        ));

        driver.power_on(&mut delay).unwrap();
        driver.power_off(&mut delay).unwrap();
        let result = driver.update(&mut pattern_source(), Region::FULL, &mut delay);
        assert!(matches!(
            result,
            Err(Error::NotPowered {
                state: PowerState::Off
            })
        ));
    }

    #[test]
    fn failed_power_on_leaves_scanning_refused() {
        let config = Builder::new().bit_depth(BitDepth::One).build();
        // Enough writes for setup plus the first power-on step.
        let mut driver = Driver::new(FailingInterface { remaining: 3 }, config);
        driver.setup().unwrap();
        let mut delay = MockDelay;

        assert!(matches!(
            driver.power_on(&mut delay),
            Err(Error::Interface(_))
        ));
        assert_eq!(driver.power_state(), PowerState::RampingUp);

        let mut source = pattern_source();
        let result = driver.update(&mut source, Region::FULL, &mut delay);
        assert!(matches!(
            result,
            Err(Error::NotPowered {
                state: PowerState::RampingUp
            })
        ));
    }

    #[test]
    fn scans_succeed_only_in_active_state_over_random_orderings() {
        let config = Builder::new()
            .bit_depth(BitDepth::One)
            .policy(UpdatePolicy::FixedTable)
            .refresh_cycles(1)
            .build();
        let mut driver = Driver::new(RecordingInterface::default(), config);
        driver.setup().unwrap();
        let mut delay = MockDelay;

        let mut rng: u32 = 0x1234_5678;
        for _ in 0..24 {
            rng = rng.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let active = driver.power_state() == PowerState::Active;
            match rng >> 29 {
                0 | 1 => driver.power_on(&mut delay).unwrap(),
                2 | 3 => driver.power_off(&mut delay).unwrap(),
                4 | 5 => {
                    let mut source = pattern_source();
                    let result = driver.update(&mut source, Region::new(0, 0, 8, 1), &mut delay);
                    assert_eq!(result.is_ok(), active);
                }
                _ => {
                    let result = driver.refresh(0, &mut delay);
                    assert_eq!(result.is_ok(), active);
                }
            }
        }
    }

    #[test]
    fn refresh_runs_three_stages_per_cycle() {
        let mut driver = binary_driver();
        let mut delay = MockDelay;
        let start = driver.interface_ref().frames.len();

        driver.refresh(0, &mut delay).unwrap();

        let frames = &driver.interface_ref().frames[start..];
        assert_eq!(gmode_rising_edges(frames), 3);
        // Per stage: 6 start-pulse clocks (the first row window opens on
        // the last of them), the remaining height-plus-overscan row steps,
        // the wind-down row and its closing pulse.
        let per_stage = 6 + usize::from(HEIGHT + EXTRA_SCAN_ROWS) - 1 + 2;
        assert_eq!(ckv_rising_edges(frames), 3 * per_stage);
    }

    #[test]
    fn refresh_shifts_the_target_drive_byte() {
        let mut driver = binary_driver();
        let mut delay = MockDelay;
        let start = driver.interface_ref().frames.len();

        driver.refresh(0, &mut delay).unwrap();

        let data: Vec<u8> = driver.interface_ref().frames[start..]
            .iter()
            .map(|f| f.1)
            .collect();
        // Clearing to white shifts White quads in the outer stages and
        // Black quads in the shaking middle stage.
        assert!(data.contains(&DriveClass::White.quad()));
        assert!(data.contains(&DriveClass::Black.quad()));
    }

    #[test]
    fn extra_refresh_cycles_extend_the_stage_sequence() {
        let config = Builder::new()
            .bit_depth(BitDepth::One)
            .policy(UpdatePolicy::FixedTable)
            .refresh_cycles(2)
            .build();
        let mut driver = Driver::new(RecordingInterface::default(), config);
        driver.setup().unwrap();
        let mut delay = MockDelay;
        driver.power_on(&mut delay).unwrap();
        let start = driver.interface_ref().frames.len();

        driver.refresh(1, &mut delay).unwrap();

        let frames = &driver.interface_ref().frames[start..];
        assert_eq!(gmode_rising_edges(frames), 6);
    }
}

//! Power sequencing
//!
//! The panel's rails must come up and down in a strict order with minimum
//! settle times between steps; violating the sequence risks damaging the
//! panel, so every wait here is a hard requirement and no code path skips
//! one. Scanning is only legal in [`PowerState::Active`].

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::driver::Driver;
use crate::error::Error;
use crate::interface::PanelInterface;
use crate::line;

/// Coarse power state of the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PowerState {
    /// All rails down, DC/DC converter disabled.
    #[default]
    Off,
    /// Rails coming up; reached only transiently, or left behind by a
    /// failed power-on.
    RampingUp,
    /// Rails up, start pulses idle; scanning is permitted.
    Active,
    /// Rails coming down.
    RampingDown,
}

impl<I: PanelInterface> Driver<I> {
    /// Bring the voltage rails up and arm the start pulses
    ///
    /// Sequence: clear the whole control word (clearing SMPS enables the
    /// DC/DC converter, its enable is active low), settle, enable the
    /// negative rail, settle, enable the positive rail, settle, then raise
    /// both start-pulse lines to their inactive-high idle state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interface`] if a hardware write fails; the driver is
    /// then left in [`PowerState::RampingUp`] and refuses to scan.
    pub fn power_on<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I>> {
        self.power = PowerState::RampingUp;

        self.bus.write_word(0).map_err(Error::Interface)?;
        delay.delay_us(100);

        self.bus.assert_lines(line::VNEG).map_err(Error::Interface)?;
        delay.delay_us(1000);

        self.bus.assert_lines(line::VPOS).map_err(Error::Interface)?;
        delay.delay_us(10);

        self.bus
            .assert_lines(line::SPV | line::SPH)
            .map_err(Error::Interface)?;

        self.power = PowerState::Active;
        debug!("panel power on");
        Ok(())
    }

    /// Bring the voltage rails down and disable the DC/DC converter
    ///
    /// Sequence: drop every control line except the converter and rail
    /// enables, settle, drop the positive rail, settle, drop the negative
    /// rail, settle, then set SMPS high to disable the converter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Interface`] if a hardware write fails; the driver is
    /// then left in [`PowerState::RampingDown`] and refuses to scan.
    pub fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<I>> {
        self.power = PowerState::RampingDown;

        let keep = self.bus.word() & (line::SMPS | line::VPOS | line::VNEG);
        self.bus.write_word(keep).map_err(Error::Interface)?;
        delay.delay_ms(10);

        self.bus.release_lines(line::VPOS).map_err(Error::Interface)?;
        delay.delay_ms(10);

        self.bus.release_lines(line::VNEG).map_err(Error::Interface)?;
        delay.delay_ms(100);

        self.bus.assert_lines(line::SMPS).map_err(Error::Interface)?;

        self.power = PowerState::Off;
        debug!("panel power off");
        Ok(())
    }

    /// Current power state.
    pub fn power_state(&self) -> PowerState {
        self.power
    }

    pub(crate) fn require_active(&self) -> Result<(), Error<I>> {
        if self.power == PowerState::Active {
            Ok(())
        } else {
            Err(Error::NotPowered { state: self.power })
        }
    }
}

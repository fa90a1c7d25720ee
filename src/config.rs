//! Driver configuration types and builder

use crate::pixel::BitDepth;
use crate::waveform::UpdatePolicy;

/// Panel width in pixels. Fixed by the panel wiring at build time.
pub const WIDTH: u16 = 800;

/// Panel height in pixels. Fixed by the panel wiring at build time.
pub const HEIGHT: u16 = 600;

/// Driver configuration
///
/// Selects the pixel encoding and waveform behavior. Use [`Builder`] to
/// construct one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Row-buffer pixel depth.
    pub bit_depth: BitDepth,
    /// Update waveform policy.
    pub policy: UpdatePolicy,
    /// Refresh cycle repeat count; more cycles clear more forcefully.
    pub refresh_cycles: u8,
    /// Settle time between refresh stages, in microseconds.
    pub refresh_settle_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Builder::new().build()
    }
}

/// Builder for constructing a driver configuration
///
/// # Example
///
/// ```
/// use eink_sr::{BitDepth, Builder, UpdatePolicy};
///
/// let config = Builder::new()
///     .bit_depth(BitDepth::One)
///     .policy(UpdatePolicy::FixedTable)
///     .build();
/// assert_eq!(config.bit_depth, BitDepth::One);
/// ```
#[must_use]
pub struct Builder {
    bit_depth: BitDepth,
    policy: UpdatePolicy,
    refresh_cycles: u8,
    refresh_settle_us: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            // Default: grayscale depth with the general policy
            bit_depth: BitDepth::Four,
            policy: UpdatePolicy::AmplitudeProportional,
            refresh_cycles: 1,
            // Rest between refresh stages while the panel settles
            refresh_settle_us: 250_000,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row-buffer pixel depth
    pub fn bit_depth(mut self, depth: BitDepth) -> Self {
        self.bit_depth = depth;
        self
    }

    /// Set the update waveform policy
    pub fn policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the refresh cycle repeat count
    ///
    /// Each cycle is one three-stage uniform clear; repeating it removes
    /// stubborn ghosting at the cost of a longer refresh.
    pub fn refresh_cycles(mut self, cycles: u8) -> Self {
        self.refresh_cycles = cycles;
        self
    }

    /// Set the settle time between refresh stages in microseconds
    pub fn refresh_settle_us(mut self, us: u32) -> Self {
        self.refresh_settle_us = us;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        Config {
            bit_depth: self.bit_depth,
            policy: self.policy,
            refresh_cycles: self.refresh_cycles,
            refresh_settle_us: self.refresh_settle_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_the_general_policy() {
        let config = Config::default();
        assert_eq!(config.bit_depth, BitDepth::Four);
        assert_eq!(config.policy, UpdatePolicy::AmplitudeProportional);
        assert_eq!(config.refresh_cycles, 1);
    }

    #[test]
    fn builder_overrides_stick() {
        let config = Builder::new()
            .bit_depth(BitDepth::One)
            .policy(UpdatePolicy::FixedTable)
            .refresh_cycles(2)
            .refresh_settle_us(1000)
            .build();
        assert_eq!(config.bit_depth, BitDepth::One);
        assert_eq!(config.policy, UpdatePolicy::FixedTable);
        assert_eq!(config.refresh_cycles, 2);
        assert_eq!(config.refresh_settle_us, 1000);
    }
}

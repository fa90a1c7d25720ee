//! Waveform engine
//!
//! E-paper pixels are moved by multi-stage voltage waveforms: every update
//! runs a fixed sequence of drive stages, and at each stage every pixel is
//! driven with one of four [`DriveClass`] values for the stage's clock-phase
//! durations. The tables here are precomputed policies; nothing is measured
//! or adapted at runtime.
//!
//! Two update policy families exist behind [`UpdatePolicy`], the single
//! dispatch point of the driver:
//!
//! - [`UpdatePolicy::FixedTable`] — a short constant table keyed by the
//!   coarse transition class, for binary panels.
//! - [`UpdatePolicy::AmplitudeProportional`] — the general grayscale
//!   algorithm. The number of active stages grows with the magnitude of the
//!   requested intensity change, while the total stage count and per-stage
//!   timing stay constant so every pixel of the panel rides the same
//!   lock-step stage loop. The pulse pattern is DC-balanced: each transition
//!   spends equal extra time on each polarity apart from the single net
//!   write it must perform.
//!
//! A stage sequence has no stored length; it ends at the first stage whose
//! assert duration is reported as zero, and stays ended for every later
//! stage.

use crate::pixel::{self, BitDepth};

/// Pixels packed into one source-driver data byte (2 bits each).
pub const PIXELS_PER_IO_BYTE: usize = 4;

/// Voltage class placed on one pixel during one stage.
///
/// This is the physical signal on the source line, distinct from the logical
/// pixel value it is steering toward. The discriminants are the 2-bit codes
/// shifted to the source drivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DriveClass {
    /// No drive; the pixel keeps its state.
    Neutral = 0,
    /// Drive toward the black endpoint (+15 V).
    Black = 1,
    /// Drive toward the white endpoint (-15 V).
    White = 2,
    /// High impedance; used by some table variants.
    Float = 3,
}

impl DriveClass {
    /// The 2-bit source-driver code.
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// The same code replicated into all four pixel slots of a data byte.
    pub(crate) const fn quad(self) -> u8 {
        let b = self.bits();
        b | (b << 2) | (b << 4) | (b << 6)
    }

    /// The opposite polarity. Neutral and Float map to themselves.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
            other => other,
        }
    }
}

/// Clock-phase durations of one drive stage, in nanoseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageTiming {
    /// CKV/OE assert window.
    pub assert_ns: u32,
    /// CKV deassert window before the row advances.
    pub deassert_ns: u32,
}

impl StageTiming {
    /// The end-of-sequence marker: a zero assert duration.
    pub const END: Self = Self {
        assert_ns: 0,
        deassert_ns: 0,
    };

    /// Whether this timing marks the end of the stage sequence.
    pub const fn is_end(self) -> bool {
        self.assert_ns == 0
    }
}

/// One row of the fixed transition table.
///
/// Values are indexed by coarse transition class:
/// white→white, white→black, black→white, black→black.
struct TableStage {
    timing: StageTiming,
    values: [DriveClass; 4],
}

const fn ftiming(assert_ns: u32, deassert_ns: u32) -> StageTiming {
    StageTiming {
        assert_ns,
        deassert_ns,
    }
}

/// Fixed small-table update waveform.
///
/// Stage durations and drive values are clock-period multiples carried over
/// from the panel bring-up measurements.
const FIXED_UPDATE_TABLE: [TableStage; 4] = {
    use DriveClass::{Black, Float, White};
    [
        //                              W->W    W->B    B->W    B->B
        TableStage { timing: ftiming(1200, 2400), values: [Black, Float, Float, White] },
        TableStage { timing: ftiming(2400, 2400), values: [Black, Black, White, White] },
        TableStage { timing: ftiming(3600, 2400), values: [White, White, Black, Black] },
        TableStage { timing: ftiming(1200, 2400), values: [Float, Black, White, Float] },
    ]
};

/// Constant per-stage timing of the amplitude-proportional policy.
///
/// Every stage shares one timing so the whole panel can be scanned in
/// lock-step while per-pixel drive values vary.
const AMPLITUDE_STAGE_TIMING: StageTiming = ftiming(500, 1000);

/// Update waveform policy.
///
/// Both variants satisfy the same contract: [`timings`](Self::timings) for
/// the per-stage clock phases (zero assert duration terminates the
/// sequence), [`value`](Self::value) for the per-pixel drive class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Constant four-stage table keyed by coarse transition class.
    ///
    /// No per-pixel magnitude computation; trades grayscale fidelity for
    /// simplicity. Intended for 1-bit panels.
    FixedTable,
    /// Magnitude-proportional, DC-balanced pulse allocation.
    #[default]
    AmplitudeProportional,
}

impl UpdatePolicy {
    /// Total stage count of the policy at the given depth.
    ///
    /// For the amplitude policy this is the worst-case pulse budget:
    /// one lead-in plus `max_level - 1` back pulses plus `max_level - 1`
    /// forward pulses, floored at two stages so the lead-in of an unchanged
    /// pixel always has room for its compensating back pulse.
    pub const fn stage_count(self, depth: BitDepth) -> usize {
        match self {
            Self::FixedTable => FIXED_UPDATE_TABLE.len(),
            Self::AmplitudeProportional => {
                let full = 2 * depth.max_level() as usize - 1;
                if full < 2 { 2 } else { full }
            }
        }
    }

    /// Clock-phase durations for `stage`.
    ///
    /// Returns [`StageTiming::END`] for every stage at or past the end of
    /// the sequence.
    pub fn timings(self, stage: usize, depth: BitDepth) -> StageTiming {
        if stage >= self.stage_count(depth) {
            return StageTiming::END;
        }
        match self {
            Self::FixedTable => FIXED_UPDATE_TABLE[stage].timing,
            Self::AmplitudeProportional => AMPLITUDE_STAGE_TIMING,
        }
    }

    /// Drive class for one pixel transition at `stage`.
    pub fn value(self, stage: usize, old: u8, new: u8, depth: BitDepth) -> DriveClass {
        if stage >= self.stage_count(depth) {
            return DriveClass::Neutral;
        }
        match self {
            Self::FixedTable => {
                let class = transition_class(old, new, depth);
                FIXED_UPDATE_TABLE[stage].values[class]
            }
            Self::AmplitudeProportional => amplitude_value(stage, old, new, depth),
        }
    }
}

/// Coarse transition class index: W→W, W→B, B→W, B→B.
fn transition_class(old: u8, new: u8, depth: BitDepth) -> usize {
    let old_black = pixel::toward_black(old, depth);
    let new_black = pixel::toward_black(new, depth);
    (usize::from(old_black) << 1) | usize::from(new_black)
}

/// Amplitude-proportional pulse allocation.
///
/// With `n = |new - old|`, the active stages are: one forward pulse at stage
/// 0, `n - 1` back pulses, then `n - 1` forward pulses; everything after is
/// neutral. The back pulses overshoot toward the opposite polarity to reset
/// the pixel and cancel the forward exposure, leaving a net drive of exactly
/// one pulse in the forward direction.
///
/// An unchanged pixel still gets the stage-0 lead-in, aimed at its own
/// nearer endpoint, followed by one compensating back pulse, so the panel's
/// common minimum actuation is preserved at zero net exposure.
fn amplitude_value(stage: usize, old: u8, new: u8, depth: BitDepth) -> DriveClass {
    let diff = i16::from(new) - i16::from(old);

    if diff == 0 {
        let forward = if pixel::toward_black(new, depth) {
            DriveClass::Black
        } else {
            DriveClass::White
        };
        return match stage {
            0 => forward,
            1 => forward.opposite(),
            _ => DriveClass::Neutral,
        };
    }

    let forward = if diff > 0 {
        DriveClass::Black
    } else {
        DriveClass::White
    };
    let n = diff.unsigned_abs() as usize;

    if stage == 0 {
        forward
    } else if stage < n {
        forward.opposite()
    } else if stage < 2 * n - 1 {
        forward
    } else {
        DriveClass::Neutral
    }
}

/// Stages per refresh cycle.
const REFRESH_STAGES_PER_CYCLE: usize = 3;

/// Refresh waveform clock phases per in-cycle stage, in nanoseconds.
const REFRESH_ASSERT_NS: [u32; REFRESH_STAGES_PER_CYCLE] = [4800, 28_800, 24_000];
const REFRESH_DEASSERT_NS: u32 = 4800;

/// Clock-phase durations for refresh `stage`.
///
/// The three-stage cycle repeats `cycles` times; extra cycles give a more
/// forceful uniform clear. Past the last cycle this returns
/// [`StageTiming::END`].
pub fn refresh_timings(stage: usize, cycles: u8) -> StageTiming {
    if stage >= REFRESH_STAGES_PER_CYCLE * cycles as usize {
        return StageTiming::END;
    }
    StageTiming {
        assert_ns: REFRESH_ASSERT_NS[stage % REFRESH_STAGES_PER_CYCLE],
        deassert_ns: REFRESH_DEASSERT_NS,
    }
}

/// Drive class for refresh `stage` clearing the panel to `target`.
///
/// The middle stage of each cycle drives the opposite polarity to shake
/// pixels loose; the outer stages drive toward the target, so the sequence
/// always ends aimed at the target endpoint. Only the endpoint colors are
/// meaningful targets.
pub fn refresh_value(stage: usize, target: u8, depth: BitDepth) -> DriveClass {
    let toward = if pixel::toward_black(target, depth) {
        DriveClass::Black
    } else {
        DriveClass::White
    };
    if stage % REFRESH_STAGES_PER_CYCLE == 1 {
        toward.opposite()
    } else {
        toward
    }
}

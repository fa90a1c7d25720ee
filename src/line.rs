//! Control-line bit definitions
//!
//! Every control signal of the panel is one bit of a 16-bit control word.
//! The low byte lives in the shift-register chain and is updated by shifting
//! out a new frame; the high byte maps to discrete MCU pins that can be
//! toggled directly. The driver flushes the two halves independently, so a
//! mutation that only touches shift-register bits never causes a
//! discrete-pin write and vice versa.
//!
//! Pin-number assignments are board wiring and live outside this crate; the
//! bit positions below are the driver's only view of the lines.

/// DC/DC converter (SMPS) enable, **active low**.
///
/// Clearing this bit turns the converter on, which is why the power-on
/// sequence starts by clearing the whole control word.
pub const SMPS: u16 = 1 << 0;

/// Negative rail (-15 V / -20 V) enable, active high.
pub const VNEG: u16 = 1 << 1;

/// Positive rail (+15 V / +22 V) enable, active high.
pub const VPOS: u16 = 1 << 2;

/// Gate-driver mode.
///
/// GMODE is a 2-bit input on the gate driver, but both bits are tied to this
/// single line: 00 is off, 11 is scanning.
pub const GMODE: u16 = 1 << 3;

/// Vertical (gate) clock.
pub const CKV: u16 = 1 << 4;

/// Start pulse vertical, active low.
pub const SPV: u16 = 1 << 5;

/// Start pulse horizontal, active low.
pub const SPH: u16 = 1 << 6;

/// Source-driver latch enable.
pub const LE: u16 = 1 << 7;

/// Horizontal (source) clock. Discrete pin.
pub const CL: u16 = 1 << 8;

/// Source-driver output enable, active high together with CKV. Discrete pin.
pub const OE: u16 = 1 << 9;

/// Bits resident in the shift-register chain.
pub const SHIFT_REGISTER_MASK: u16 = 0x00FF;

/// Bits on discrete MCU pins outside the shift register.
pub const DISCRETE_MASK: u16 = 0xFF00;

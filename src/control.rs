//! Control-line state
//!
//! [`ControlBus`] is the single source of truth for every control bit the
//! panel sees, shift-register-resident and discrete alike, plus the last
//! source-driver data byte shifted into the chain. Every mutation flushes the
//! minimal hardware write: a change confined to shift-register bits reshifts
//! the chain, a change confined to discrete bits only touches the pins, and
//! the two are never conflated.

use crate::interface::PanelInterface;
use crate::line;

/// Owned control word plus the hardware interface it is flushed to.
pub(crate) struct ControlBus<I: PanelInterface> {
    interface: I,
    /// Current control word; see [`crate::line`] for bit assignments.
    word: u16,
    /// Last data byte shifted into the source-driver half of the chain.
    data: u8,
}

impl<I: PanelInterface> ControlBus<I> {
    pub(crate) fn new(interface: I) -> Self {
        Self {
            interface,
            word: 0,
            data: 0,
        }
    }

    pub(crate) fn word(&self) -> u16 {
        self.word
    }

    #[cfg(test)]
    pub(crate) fn interface(&self) -> &I {
        &self.interface
    }

    /// Set the given lines high and flush the touched halves.
    pub(crate) fn assert_lines(&mut self, lines: u16) -> Result<(), I::Error> {
        self.word |= lines;
        self.flush(lines)
    }

    /// Set the given lines low and flush the touched halves.
    pub(crate) fn release_lines(&mut self, lines: u16) -> Result<(), I::Error> {
        self.word &= !lines;
        self.flush(lines)
    }

    /// Replace the whole control word and flush both halves.
    ///
    /// Used by the power sequencer, where the register content must be
    /// brought to a known state in one step.
    pub(crate) fn write_word(&mut self, word: u16) -> Result<(), I::Error> {
        self.word = word;
        self.flush(line::SHIFT_REGISTER_MASK | line::DISCRETE_MASK)
    }

    /// Shift a new source-driver data byte, eliding redundant reloads.
    ///
    /// Long runs of identical drive bytes are common, so the chain is only
    /// reshifted when the byte actually changes.
    pub(crate) fn load_data(&mut self, data: u8) -> Result<(), I::Error> {
        if data != self.data {
            self.data = data;
            self.flush(line::SHIFT_REGISTER_MASK)?;
        }
        Ok(())
    }

    fn flush(&mut self, touched: u16) -> Result<(), I::Error> {
        if touched & line::SHIFT_REGISTER_MASK != 0 {
            self.interface
                .write_frame((self.word & line::SHIFT_REGISTER_MASK) as u8, self.data)?;
        }
        if touched & line::DISCRETE_MASK != 0 {
            self.interface
                .write_discrete(self.word & line::CL != 0, self.word & line::OE != 0)?;
        }
        Ok(())
    }
}

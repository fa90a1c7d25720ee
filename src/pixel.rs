//! Packed-row pixel addressing
//!
//! Row buffers carry one pixel value per [`BitDepth`] unit, most-significant
//! unit first within each byte. Code 0 is the white endpoint and
//! [`BitDepth::max_level`] the black endpoint, so algorithms can treat pixel
//! values as plain intensities regardless of depth.

use crate::config::WIDTH;

/// Pixel bit depth of the row buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BitDepth {
    /// 1 bit per pixel: 0 = white, 1 = black.
    One,
    /// 4 bits per pixel: 0 = white endpoint, 15 = black endpoint.
    #[default]
    Four,
}

impl BitDepth {
    /// Bits per pixel.
    pub const fn bits(self) -> usize {
        match self {
            Self::One => 1,
            Self::Four => 4,
        }
    }

    /// Number of representable intensity levels.
    pub const fn levels(self) -> u8 {
        match self {
            Self::One => 2,
            Self::Four => 16,
        }
    }

    /// Highest pixel code, the black endpoint.
    pub const fn max_level(self) -> u8 {
        self.levels() - 1
    }

    /// Pixels packed into one row-buffer byte.
    pub const fn pixels_per_byte(self) -> usize {
        8 / self.bits()
    }
}

/// Largest row stride the driver ever needs, sized for 4-bit depth.
pub const MAX_ROW_BYTES: usize = (WIDTH as usize * 4) / 8;

/// Byte stride of one full-width row at the given depth.
pub const fn row_stride(depth: BitDepth) -> usize {
    WIDTH as usize * depth.bits() / 8
}

/// Bytes needed to pack `pixels` values at the given depth.
pub const fn row_bytes(pixels: usize, depth: BitDepth) -> usize {
    (pixels * depth.bits()).div_ceil(8)
}

/// Read the pixel value at `x` from a packed row.
pub fn get_row_pixel(row: &[u8], x: usize, depth: BitDepth) -> u8 {
    let per_byte = depth.pixels_per_byte();
    let byte_index = x / per_byte;
    let shift = 8 - ((x % per_byte) + 1) * depth.bits();
    let mask = ((1u16 << depth.bits()) - 1) as u8;
    (row[byte_index] >> shift) & mask
}

/// Write the pixel value at `x` into a packed row.
pub fn set_row_pixel(row: &mut [u8], x: usize, value: u8, depth: BitDepth) {
    let per_byte = depth.pixels_per_byte();
    let byte_index = x / per_byte;
    let shift = 8 - ((x % per_byte) + 1) * depth.bits();
    let mask = ((1u16 << depth.bits()) - 1) as u8;
    row[byte_index] = (row[byte_index] & !(mask << shift)) | ((value & mask) << shift);
}

/// Whether a pixel code is on the black half of the scale.
pub(crate) fn toward_black(value: u8, depth: BitDepth) -> bool {
    value > depth.max_level() / 2
}

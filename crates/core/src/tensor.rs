//! Single-bit activation tensors.
//!
//! A stored bit is semantically ±1 (0 ↔ −1, 1 ↔ +1). Rows are `u32`
//! bitmasks — the spatial extent never exceeds 32 — so pooling reduces to
//! row ORs and the convolution inner loop reads single bits. Cells outside
//! the declared extent do not exist: every constructor allocates exactly
//! `channels × size` rows, and stage boundaries re-check shapes, so
//! out-of-range channels can never be read as a stored ±1.

use bitconv_common::{BnnError, Result, MAX_CHANNELS, MAX_SPATIAL};

/// 3D single-bit grid, `[channel][row][col]`, channel-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryTensor {
    channels: usize,
    size: usize,
    rows: Vec<u32>,
}

impl BinaryTensor {
    /// Allocate an all-zero (all −1) tensor.
    pub fn new(channels: usize, size: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(BnnError::shape(
                "tensor channels",
                format!("1..={MAX_CHANNELS}"),
                channels,
            ));
        }
        if size == 0 || size > MAX_SPATIAL {
            return Err(BnnError::shape(
                "tensor spatial extent",
                format!("1..={MAX_SPATIAL}"),
                size,
            ));
        }
        Ok(Self {
            channels,
            size,
            rows: vec![0; channels * size],
        })
    }

    /// Convert a raw single-channel image: pixel > 0 → +1, else −1.
    pub fn from_pixels(pixels: &[i8], size: usize) -> Result<Self> {
        if pixels.len() != size * size {
            return Err(BnnError::shape(
                "image pixels",
                size * size,
                pixels.len(),
            ));
        }
        let mut tensor = Self::new(1, size)?;
        for (i, &p) in pixels.iter().enumerate() {
            if p > 0 {
                tensor.set(0, i / size, i % size, true);
            }
        }
        Ok(tensor)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn row_index(&self, channel: usize, row: usize) -> usize {
        debug_assert!(channel < self.channels && row < self.size);
        channel * self.size + row
    }

    /// Read one bit.
    #[inline]
    pub fn get(&self, channel: usize, row: usize, col: usize) -> bool {
        debug_assert!(col < self.size);
        (self.rows[self.row_index(channel, row)] >> col) & 1 == 1
    }

    /// Write one bit.
    #[inline]
    pub fn set(&mut self, channel: usize, row: usize, col: usize, bit: bool) {
        debug_assert!(col < self.size);
        let index = self.row_index(channel, row);
        if bit {
            self.rows[index] |= 1 << col;
        } else {
            self.rows[index] &= !(1 << col);
        }
    }

    /// One row as a column bitmask (bit `x` = column `x`).
    #[inline]
    pub fn row(&self, channel: usize, row: usize) -> u32 {
        self.rows[self.row_index(channel, row)]
    }

    #[inline]
    pub(crate) fn set_row(&mut self, channel: usize, row: usize, mask: u32) {
        let index = self.row_index(channel, row);
        self.rows[index] = mask;
    }

    /// Raw channel-major row storage; each output-channel group of the
    /// convolution owns a disjoint chunk of this slice.
    pub(crate) fn rows_mut(&mut self) -> &mut [u32] {
        &mut self.rows
    }
}

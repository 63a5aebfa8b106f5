//! 2×2 max pooling over binary feature maps.
//!
//! For ±1 bits the max of a window is simply the OR of its four bits, so a
//! whole output row is built from two input-row masks.

use bitconv_common::{BnnError, Result};

use crate::tensor::BinaryTensor;

/// Non-overlapping 2×2, stride-2, per-channel max: (M, I, I) → (M, I/2, I/2).
pub fn max_pool_2x2(input: &BinaryTensor) -> Result<BinaryTensor> {
    if input.size() % 2 != 0 {
        return Err(BnnError::shape(
            "pool input extent",
            "an even width",
            input.size(),
        ));
    }
    let out_size = input.size() / 2;
    let mut output = BinaryTensor::new(input.channels(), out_size)?;
    for c in 0..input.channels() {
        for y in 0..out_size {
            let merged = input.row(c, 2 * y) | input.row(c, 2 * y + 1);
            let mut row = 0u32;
            for x in 0..out_size {
                if (merged >> (2 * x)) & 0b11 != 0 {
                    row |= 1 << x;
                }
            }
            output.set_row(c, y, row);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_blocks_reproduce_their_constant() {
        // Channel 0: every 2×2 block all ones; channel 1: all zeros.
        let mut t = BinaryTensor::new(2, 8).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                t.set(0, y, x, true);
            }
        }
        let out = max_pool_2x2(&t).unwrap();
        assert_eq!(out.size(), 4);
        for y in 0..4 {
            assert_eq!(out.row(0, y), 0b1111);
            assert_eq!(out.row(1, y), 0);
        }
    }

    #[test]
    fn all_zero_channel_pools_to_all_zero() {
        let t = BinaryTensor::new(1, 4).unwrap();
        let out = max_pool_2x2(&t).unwrap();
        for y in 0..2 {
            assert_eq!(out.row(0, y), 0);
        }
    }

    #[test]
    fn single_set_bit_survives_its_block() {
        for (y, x) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            let mut t = BinaryTensor::new(1, 6).unwrap();
            t.set(0, 2 + y, 4 + x, true); // block (1, 2)
            let out = max_pool_2x2(&t).unwrap();
            for oy in 0..3 {
                for ox in 0..3 {
                    assert_eq!(out.get(0, oy, ox), (oy, ox) == (1, 2));
                }
            }
        }
    }

    #[test]
    fn odd_extent_is_rejected() {
        let t = BinaryTensor::new(1, 7).unwrap();
        assert!(matches!(
            max_pool_2x2(&t),
            Err(BnnError::ShapeMismatch { .. })
        ));
    }
}

//! Immutable weight data: convolution filter banks and dense matrices.
//!
//! Both are loaded once and shared read-only across invocations. Filter
//! banks keep the flat storage order of the trained weight files,
//! `(n + m·N)·25 + kr·5 + kc`, packed 25 bits per filter; dense matrices
//! are ±1.0 floats validated at construction.

use bitconv_common::{BnnError, Result, FILTER_SIZE, MAX_CHANNELS};

const FILTER_BITS: usize = FILTER_SIZE * FILTER_SIZE;

/// ±1 convolution weights, logically `[outCh][inCh][5][5]`.
///
/// Each (outCh, inCh) filter occupies one `u32` word with bit `kr·5 + kc`.
#[derive(Debug, Clone)]
pub struct BinaryFilterBank {
    in_channels: usize,
    out_channels: usize,
    filters: Vec<u32>,
}

impl BinaryFilterBank {
    /// Build from flat 0/1 values in trained-file order:
    /// index `(n + m·N)·25 + kr·5 + kc` for output channel `n`, input
    /// channel `m`.
    pub fn from_bits(bits: &[u8], in_channels: usize, out_channels: usize) -> Result<Self> {
        if in_channels == 0
            || in_channels > MAX_CHANNELS
            || out_channels == 0
            || out_channels > MAX_CHANNELS
        {
            return Err(BnnError::shape(
                "filter bank channels",
                format!("1..={MAX_CHANNELS}"),
                format!("{in_channels}x{out_channels}"),
            ));
        }
        let expected = in_channels * out_channels * FILTER_BITS;
        if bits.len() != expected {
            return Err(BnnError::shape("filter bank values", expected, bits.len()));
        }
        let mut filters = vec![0u32; in_channels * out_channels];
        for (i, &b) in bits.iter().enumerate() {
            match b {
                0 => {}
                1 => filters[i / FILTER_BITS] |= 1 << (i % FILTER_BITS),
                other => {
                    return Err(BnnError::InvalidEncoding {
                        index: i,
                        value: other as f32,
                    })
                }
            }
        }
        Ok(Self {
            in_channels,
            out_channels,
            filters,
        })
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Read one filter tap as a ±1 bit.
    #[inline]
    pub fn get(&self, out_ch: usize, in_ch: usize, kr: usize, kc: usize) -> bool {
        debug_assert!(out_ch < self.out_channels && in_ch < self.in_channels);
        debug_assert!(kr < FILTER_SIZE && kc < FILTER_SIZE);
        let word = self.filters[out_ch + in_ch * self.out_channels];
        (word >> (kr * FILTER_SIZE + kc)) & 1 == 1
    }
}

/// ±1.0-valued dense weights, row-major `[inUnits][outUnits]`, plus nothing —
/// the bias lives with the layer because it is full precision.
#[derive(Debug, Clone)]
pub struct DenseWeightMatrix {
    in_units: usize,
    out_units: usize,
    values: Vec<f32>,
}

impl DenseWeightMatrix {
    /// Validate and take ownership of flat row-major values
    /// (index `m·N + n`). Every value must be exactly ±1.0.
    pub fn new(values: Vec<f32>, in_units: usize, out_units: usize) -> Result<Self> {
        let expected = in_units * out_units;
        if values.len() != expected {
            return Err(BnnError::shape(
                "dense weight values",
                expected,
                values.len(),
            ));
        }
        for (i, &v) in values.iter().enumerate() {
            if v != 1.0 && v != -1.0 {
                return Err(BnnError::InvalidEncoding { index: i, value: v });
            }
        }
        Ok(Self {
            in_units,
            out_units,
            values,
        })
    }

    pub fn in_units(&self) -> usize {
        self.in_units
    }

    pub fn out_units(&self) -> usize {
        self.out_units
    }

    #[inline]
    pub fn get(&self, in_unit: usize, out_unit: usize) -> f32 {
        self.values[in_unit * self.out_units + out_unit]
    }

    /// One output unit's weight column.
    #[inline]
    pub fn column(&self, out_unit: usize) -> impl Iterator<Item = f32> + '_ {
        (0..self.in_units).map(move |m| self.values[m * self.out_units + out_unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_bank_keeps_trained_file_order() {
        // 2 in × 2 out: set a single tap of filter (out=1, in=1).
        let n = 2;
        let mut bits = vec![0u8; 2 * 2 * FILTER_BITS];
        let (out_ch, in_ch, kr, kc) = (1, 1, 3, 4);
        bits[(out_ch + in_ch * n) * FILTER_BITS + kr * FILTER_SIZE + kc] = 1;
        let bank = BinaryFilterBank::from_bits(&bits, 2, 2).unwrap();
        assert!(bank.get(1, 1, 3, 4));
        assert!(!bank.get(1, 1, 4, 3));
        assert!(!bank.get(0, 1, 3, 4));
        assert!(!bank.get(1, 0, 3, 4));
    }

    #[test]
    fn filter_bank_rejects_bad_shapes_and_values() {
        assert!(BinaryFilterBank::from_bits(&[0u8; 24], 1, 1).is_err());
        assert!(matches!(
            BinaryFilterBank::from_bits(&[2u8; 25], 1, 1),
            Err(BnnError::InvalidEncoding { index: 0, .. })
        ));
        assert!(BinaryFilterBank::from_bits(&[0u8; 25 * 65], 1, 65).is_err());
    }

    #[test]
    fn dense_matrix_is_row_major() {
        let values = vec![1.0, -1.0, -1.0, 1.0, 1.0, 1.0]; // 3 in × 2 out
        let w = DenseWeightMatrix::new(values, 3, 2).unwrap();
        assert_eq!(w.get(0, 1), -1.0);
        assert_eq!(w.get(1, 0), -1.0);
        assert_eq!(w.column(0).collect::<Vec<_>>(), vec![1.0, -1.0, 1.0]);
    }

    #[test]
    fn dense_matrix_rejects_non_binary_values() {
        let err = DenseWeightMatrix::new(vec![1.0, 0.5], 1, 2).unwrap_err();
        assert_eq!(
            err,
            BnnError::InvalidEncoding {
                index: 1,
                value: 0.5
            }
        );
        // 0.0 is not a valid encoding either — no epsilon tolerance.
        assert!(DenseWeightMatrix::new(vec![0.0], 1, 1).is_err());
    }
}

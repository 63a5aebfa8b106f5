//! Q16.16 signed fixed point for the convolution accumulator.
//!
//! The MAC loop only ever adds, negates and sign-tests; the single multiply
//! lives in the fused batch-norm threshold ([`crate::norm::ChannelAffine`]).
//! Capacity: the largest accumulated magnitude is `25·M·con = √(50·M) < 57`
//! for M ≤ 64, comfortably inside the ±32768 integer range of Q16.16.

use std::ops::{Add, AddAssign, Neg};

const FRAC_BITS: u32 = 16;
const ONE_RAW: i32 = 1 << FRAC_BITS;

/// Signed fixed-point scalar, 16 integer + 16 fractional bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(ONE_RAW);

    /// Quantise a float to the nearest representable fixed-point value.
    pub fn from_f32(value: f32) -> Fixed {
        Fixed((value * ONE_RAW as f32).round() as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / ONE_RAW as f32
    }

    /// Sign test; zero counts as non-negative.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Fixed-point multiply with a widened intermediate. Used only by the
    /// fused affine threshold, never in the MAC loop.
    #[inline]
    pub fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i64 * rhs.0 as i64) >> FRAC_BITS) as i32)
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

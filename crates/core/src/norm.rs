//! Fused batch normalisation.
//!
//! Batch norm never runs as a separate pass: its affine transform is folded
//! into the per-channel binarization threshold at load time, so the
//! convolution goes straight from fixed-point accumulation to output bits
//! without materialising a real-valued feature map.

use crate::fixed::Fixed;

/// Per-output-channel (scale, offset), folded once from batch-norm
/// parameters: `scale = γ/√(σ²+ε)`, `offset = −μ·scale + β`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAffine {
    pub scale: Fixed,
    pub offset: Fixed,
}

impl ChannelAffine {
    /// Pass-through: binarize on the raw accumulator sign.
    pub const IDENTITY: ChannelAffine = ChannelAffine {
        scale: Fixed::ONE,
        offset: Fixed::ZERO,
    };

    /// Fold raw batch-norm parameters. Runs once at load time, so the float
    /// square root never appears on the inference path.
    pub fn fold(gamma: f32, beta: f32, mean: f32, variance: f32, eps: f32) -> Self {
        let scale = gamma / (variance + eps).sqrt();
        Self {
            scale: Fixed::from_f32(scale),
            offset: Fixed::from_f32(-mean * scale + beta),
        }
    }

    /// Use pre-folded (scale, offset) values, e.g. from a trained-weight file.
    pub fn from_folded(scale: f32, offset: f32) -> Self {
        Self {
            scale: Fixed::from_f32(scale),
            offset: Fixed::from_f32(offset),
        }
    }

    /// The fused normalise-and-binarize step:
    /// output bit = `accum·scale + offset ≥ 0`.
    #[inline]
    pub fn binarize(&self, accum: Fixed) -> bool {
        !(accum.mul(self.scale) + self.offset).is_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_binarizes_on_sign() {
        let affine = ChannelAffine::IDENTITY;
        assert!(affine.binarize(Fixed::from_f32(0.1)));
        assert!(affine.binarize(Fixed::ZERO)); // zero is non-negative
        assert!(!affine.binarize(Fixed::from_f32(-0.1)));
    }

    #[test]
    fn fold_matches_closed_form() {
        // γ=2, β=1, μ=3, σ²=4, ε=0 → scale=1, offset=-3·1+1=-2
        let affine = ChannelAffine::fold(2.0, 1.0, 3.0, 4.0, 0.0);
        assert!((affine.scale.to_f32() - 1.0).abs() < 1e-4);
        assert!((affine.offset.to_f32() + 2.0).abs() < 1e-4);
        // Threshold sits at accum = 2: below → 0, at/above → 1.
        assert!(affine.binarize(Fixed::from_f32(2.5)));
        assert!(!affine.binarize(Fixed::from_f32(1.5)));
    }

    #[test]
    fn negative_scale_flips_the_comparison() {
        let affine = ChannelAffine::from_folded(-1.0, 0.0);
        assert!(affine.binarize(Fixed::from_f32(-1.0)));
        assert!(!affine.binarize(Fixed::from_f32(1.0)));
    }
}

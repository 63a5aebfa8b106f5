//! Fully-connected XNOR-popcount layers.
//!
//! Over ±1 values the dot product never needs a multiply: count the
//! positions where input and weight agree, and the exact product is
//! `(2·matches − M)·con` with `con = √(2/M)`. Equality is exact — inputs
//! and weights must be encoded as precisely ±1.0, which the constructors
//! and `forward` enforce up front.

use bitconv_common::{BnnError, Result};

use crate::weights::DenseWeightMatrix;

/// One dense layer: ±1.0 weights, full-precision bias, optional binarizing
/// activation (hidden layers binarize; the output layer stays linear and
/// its values are the class scores).
pub struct XnorDense {
    weights: DenseWeightMatrix,
    bias: Vec<f32>,
    binarize: bool,
    con: f32,
}

impl XnorDense {
    pub fn new(weights: DenseWeightMatrix, bias: Vec<f32>, binarize: bool) -> Result<Self> {
        if bias.len() != weights.out_units() {
            return Err(BnnError::shape(
                "dense bias",
                weights.out_units(),
                bias.len(),
            ));
        }
        let con = (2.0 / weights.in_units() as f32).sqrt();
        Ok(Self {
            weights,
            bias,
            binarize,
            con,
        })
    }

    pub fn in_units(&self) -> usize {
        self.weights.in_units()
    }

    pub fn out_units(&self) -> usize {
        self.weights.out_units()
    }

    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        let m = self.weights.in_units();
        if input.len() != m {
            return Err(BnnError::shape("dense input", m, input.len()));
        }
        for (i, &v) in input.iter().enumerate() {
            if v != 1.0 && v != -1.0 {
                return Err(BnnError::InvalidEncoding { index: i, value: v });
            }
        }

        let mut output = Vec::with_capacity(self.weights.out_units());
        for n in 0..self.weights.out_units() {
            let matches = self
                .weights
                .column(n)
                .zip(input)
                .filter(|(w, &x)| *w == x)
                .count();
            let dot = (2 * matches as i64 - m as i64) as f32 * self.con;
            let biased = dot + self.bias[n];
            output.push(if self.binarize {
                if biased > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            } else {
                biased
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_pm1(rng: &mut StdRng, len: usize) -> Vec<f32> {
        (0..len)
            .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
            .collect()
    }

    #[test]
    fn xnor_count_equals_naive_dot_product() {
        let mut rng = StdRng::seed_from_u64(0x1bc0);
        for &m in &[1usize, 8, 17, 512] {
            let n = 3;
            let weights = random_pm1(&mut rng, m * n);
            let input = random_pm1(&mut rng, m);
            let bias: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let con = (2.0 / m as f32).sqrt();

            let layer = XnorDense::new(
                DenseWeightMatrix::new(weights.clone(), m, n).unwrap(),
                bias.clone(),
                false,
            )
            .unwrap();
            let out = layer.forward(&input).unwrap();

            for (unit, &got) in out.iter().enumerate() {
                let naive: f32 = (0..m)
                    .map(|i| input[i] * weights[i * n + unit] * con)
                    .sum::<f32>()
                    + bias[unit];
                assert!(
                    (got - naive).abs() < 1e-3,
                    "m={m} unit={unit}: {got} vs {naive}"
                );
            }
        }
    }

    #[test]
    fn binarizing_layer_emits_exact_pm1() {
        let weights = DenseWeightMatrix::new(vec![1.0, -1.0, 1.0, 1.0], 2, 2).unwrap();
        let layer = XnorDense::new(weights, vec![0.0, 0.0], true).unwrap();
        let out = layer.forward(&[1.0, 1.0]).unwrap();
        // Unit 0: weights (1, 1) both match → dot 2·con > 0 → +1.
        // Unit 1: weights (-1, 1), one match → dot 0, not > 0 → −1.
        assert_eq!(out, vec![1.0, -1.0]);
        // The binarized output is itself a valid input for the next layer.
        assert!(layer.forward(&out).is_ok());
    }

    #[test]
    fn rejects_drifted_encodings() {
        let weights = DenseWeightMatrix::new(vec![1.0, -1.0], 2, 1).unwrap();
        let layer = XnorDense::new(weights, vec![0.0], false).unwrap();
        let err = layer.forward(&[1.0, 0.999_999]).unwrap_err();
        assert!(matches!(err, BnnError::InvalidEncoding { index: 1, .. }));
    }

    #[test]
    fn rejects_shape_disagreements() {
        let weights = DenseWeightMatrix::new(vec![1.0; 6], 3, 2).unwrap();
        assert!(XnorDense::new(weights.clone(), vec![0.0; 3], false).is_err());
        let layer = XnorDense::new(weights, vec![0.0; 2], false).unwrap();
        assert!(matches!(
            layer.forward(&[1.0, 1.0]),
            Err(BnnError::ShapeMismatch { .. })
        ));
    }
}

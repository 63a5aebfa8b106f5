//! The full network: fixed five-stage wiring.
//!
//! Conv1 → Pool → Conv2 → Pool → Reshape → Dense(hidden, binarize) →
//! Dense(output, linear). The model owns the loaded weights and is shared
//! read-only; every invocation owns its transient activation tensors, so
//! any number of images can be classified concurrently over one model.

use bitconv_common::{BnnError, Result, NUM_CLASSES};

use crate::conv::BinaryConv2d;
use crate::dense::XnorDense;
use crate::pool::max_pool_2x2;
use crate::reshape::channel_reshape;
use crate::tensor::BinaryTensor;

/// Class scores for one image.
pub type Scores = [f32; NUM_CLASSES];

/// The assembled network. Construct with [`BnnModel::new`], which checks
/// that consecutive stages agree on shapes, then call
/// [`infer`](Self::infer) per image.
pub struct BnnModel {
    conv1: BinaryConv2d,
    conv2: BinaryConv2d,
    fc1: XnorDense,
    fc2: XnorDense,
}

impl BnnModel {
    pub fn new(
        conv1: BinaryConv2d,
        conv2: BinaryConv2d,
        fc1: XnorDense,
        fc2: XnorDense,
    ) -> Result<Self> {
        let c1 = *conv1.config();
        let c2 = *conv2.config();
        if c1.spatial % 2 != 0 || c2.spatial % 2 != 0 {
            return Err(BnnError::shape(
                "pooled extents",
                "even widths",
                format!("{}, {}", c1.spatial, c2.spatial),
            ));
        }
        if c2.in_channels != c1.out_channels || c2.spatial != c1.spatial / 2 {
            return Err(BnnError::shape(
                "conv2 input",
                format!("{}x{}", c1.out_channels, c1.spatial / 2),
                format!("{}x{}", c2.in_channels, c2.spatial),
            ));
        }
        let pooled = c2.spatial / 2;
        let flat_units = c2.out_channels * pooled * pooled;
        if fc1.in_units() != flat_units {
            return Err(BnnError::shape("fc1 input units", flat_units, fc1.in_units()));
        }
        if fc2.in_units() != fc1.out_units() {
            return Err(BnnError::shape(
                "fc2 input units",
                fc1.out_units(),
                fc2.in_units(),
            ));
        }
        if fc2.out_units() != NUM_CLASSES {
            return Err(BnnError::shape(
                "fc2 output units",
                NUM_CLASSES,
                fc2.out_units(),
            ));
        }
        Ok(Self {
            conv1,
            conv2,
            fc1,
            fc2,
        })
    }

    /// Expected input image width.
    pub fn input_size(&self) -> usize {
        self.conv1.config().spatial
    }

    /// Classify one ±1-converted image, returning the raw class scores.
    /// Argmax and accuracy bookkeeping belong to the caller.
    pub fn infer(&self, image: &BinaryTensor) -> Result<Scores> {
        let fmap = self.conv1.forward(image)?;
        let fmap = max_pool_2x2(&fmap)?;
        let fmap = self.conv2.forward(&fmap)?;
        let fmap = max_pool_2x2(&fmap)?;
        let flat = channel_reshape(&fmap);
        let hidden = self.fc1.forward(&flat)?;
        let scores = self.fc2.forward(&hidden)?;
        let mut out = [0.0f32; NUM_CLASSES];
        out.copy_from_slice(&scores);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norm::ChannelAffine;
    use crate::weights::{BinaryFilterBank, DenseWeightMatrix};
    use bitconv_common::{LayerConfig, NetworkConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_conv(rng: &mut StdRng, cfg: LayerConfig) -> BinaryConv2d {
        let bits: Vec<u8> = (0..cfg.in_channels * cfg.out_channels * 25)
            .map(|_| rng.gen_range(0..=1))
            .collect();
        let bank = BinaryFilterBank::from_bits(&bits, cfg.in_channels, cfg.out_channels).unwrap();
        let affines: Vec<ChannelAffine> = (0..cfg.out_channels)
            .map(|_| {
                ChannelAffine::from_folded(rng.gen_range(0.5..2.0), rng.gen_range(-1.0..1.0))
            })
            .collect();
        BinaryConv2d::new(cfg, bank, affines).unwrap()
    }

    fn random_dense(rng: &mut StdRng, m: usize, n: usize, binarize: bool) -> XnorDense {
        let values: Vec<f32> = (0..m * n)
            .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
            .collect();
        let bias: Vec<f32> = (0..n).map(|_| rng.gen_range(-0.5..0.5)).collect();
        XnorDense::new(DenseWeightMatrix::new(values, m, n).unwrap(), bias, binarize).unwrap()
    }

    fn random_model(seed: u64) -> BnnModel {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = NetworkConfig::default();
        let conv1 = random_conv(&mut rng, config.conv1());
        let conv2 = random_conv(&mut rng, config.conv2());
        let fc1 = random_dense(&mut rng, config.dense_input_units(), config.hidden_units, true);
        let fc2 = random_dense(&mut rng, config.hidden_units, config.classes, false);
        BnnModel::new(conv1, conv2, fc1, fc2).unwrap()
    }

    fn random_image(seed: u64) -> BinaryTensor {
        let mut rng = StdRng::seed_from_u64(seed);
        let pixels: Vec<i8> = (0..28 * 28).map(|_| rng.gen_range(-128..=127)).collect();
        BinaryTensor::from_pixels(&pixels, 28).unwrap()
    }

    #[test]
    fn pipeline_is_deterministic() {
        let model = random_model(7);
        let image = random_image(11);
        let a = model.infer(&image).unwrap();
        let b = model.infer(&image).unwrap();
        assert_eq!(
            a.map(f32::to_bits),
            b.map(f32::to_bits),
            "score vectors must be bit-identical"
        );
    }

    #[test]
    fn scores_have_class_count_and_finite_values() {
        let model = random_model(3);
        let scores = model.infer(&random_image(5)).unwrap();
        assert_eq!(scores.len(), NUM_CLASSES);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn rejects_wrong_image_shape() {
        let model = random_model(1);
        let small = BinaryTensor::new(1, 14).unwrap();
        assert!(matches!(
            model.infer(&small),
            Err(BnnError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rejects_disagreeing_stages() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = NetworkConfig::default();
        let conv1 = random_conv(&mut rng, config.conv1());
        let conv2 = random_conv(&mut rng, config.conv2());
        // fc1 sized for the wrong flattened width.
        let fc1 = random_dense(&mut rng, 100, config.hidden_units, true);
        let fc2 = random_dense(&mut rng, config.hidden_units, config.classes, false);
        assert!(BnnModel::new(conv1, conv2, fc1, fc2).is_err());

        let mut rng = StdRng::seed_from_u64(9);
        let conv1 = random_conv(&mut rng, config.conv1());
        let conv2 = random_conv(&mut rng, config.conv2());
        let fc1 = random_dense(&mut rng, config.dense_input_units(), config.hidden_units, true);
        // Final layer must emit exactly NUM_CLASSES scores.
        let fc2 = random_dense(&mut rng, config.hidden_units, 12, false);
        assert!(BnnModel::new(conv1, conv2, fc1, fc2).is_err());
    }
}

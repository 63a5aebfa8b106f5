//! ASCII loaders for the trained model's data formats.
//!
//! A model directory contains whitespace-separated text files:
//!
//! | File | Contents |
//! |------|----------|
//! | `config.json` | [`NetworkConfig`] (optional; defaults apply) |
//! | `conv{1,2}_weights.dat` | 0/1 filter taps, flat index `(n + m·N)·25 + kr·5 + kc` |
//! | `conv{1,2}_scale.dat` / `conv{1,2}_offset.dat` | folded batch-norm `k`/`h`, one float per output channel |
//! | `fc{1,2}_weights.dat` | 0/1 dense weights, flat index `m·N + n` |
//! | `fc{1,2}_bias.dat` | full-precision biases |
//!
//! Stored dense bits are mapped to ±1.0 here, once, so the core only ever
//! sees the exact encoding it validates. Test images are 784 signed
//! integers per image; labels are one integer per image.

use std::path::Path;

use anyhow::{bail, Context, Result};

use bitconv_common::NetworkConfig;
use bitconv_core::{
    BinaryConv2d, BinaryFilterBank, BnnModel, ChannelAffine, DenseWeightMatrix, XnorDense,
};

/// Parse whitespace-separated 0/1 values.
pub fn parse_bits(text: &str) -> Result<Vec<u8>> {
    text.split_whitespace()
        .map(|tok| match tok.parse::<i64>() {
            Ok(0) => Ok(0u8),
            Ok(1) => Ok(1u8),
            Ok(other) => bail!("expected 0 or 1, got {other}"),
            Err(_) => bail!("expected 0 or 1, got {tok:?}"),
        })
        .collect()
}

/// Parse whitespace-separated floats.
pub fn parse_floats(text: &str) -> Result<Vec<f32>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<f32>()
                .with_context(|| format!("bad float {tok:?}"))
        })
        .collect()
}

fn read_bits(path: &Path) -> Result<Vec<u8>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    parse_bits(&text).with_context(|| format!("parse {}", path.display()))
}

fn read_floats(path: &Path) -> Result<Vec<f32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    parse_floats(&text).with_context(|| format!("parse {}", path.display()))
}

fn load_conv(dir: &Path, name: &str, cfg: bitconv_common::LayerConfig) -> Result<BinaryConv2d> {
    let bits = read_bits(&dir.join(format!("{name}_weights.dat")))?;
    let bank = BinaryFilterBank::from_bits(&bits, cfg.in_channels, cfg.out_channels)
        .with_context(|| format!("{name} filter bank"))?;

    let scales = read_floats(&dir.join(format!("{name}_scale.dat")))?;
    let offsets = read_floats(&dir.join(format!("{name}_offset.dat")))?;
    if scales.len() != cfg.out_channels || offsets.len() != cfg.out_channels {
        bail!(
            "{name}: expected {} scale/offset pairs, got {}/{}",
            cfg.out_channels,
            scales.len(),
            offsets.len()
        );
    }
    let affines = scales
        .iter()
        .zip(&offsets)
        .map(|(&k, &h)| ChannelAffine::from_folded(k, h))
        .collect();

    BinaryConv2d::new(cfg, bank, affines).with_context(|| format!("{name} stage"))
}

fn load_dense(
    dir: &Path,
    name: &str,
    in_units: usize,
    out_units: usize,
    binarize: bool,
) -> Result<XnorDense> {
    let bits = read_bits(&dir.join(format!("{name}_weights.dat")))?;
    let values: Vec<f32> = bits
        .iter()
        .map(|&b| if b == 1 { 1.0 } else { -1.0 })
        .collect();
    let weights = DenseWeightMatrix::new(values, in_units, out_units)
        .with_context(|| format!("{name} weights"))?;
    let bias = read_floats(&dir.join(format!("{name}_bias.dat")))?;
    XnorDense::new(weights, bias, binarize).with_context(|| format!("{name} stage"))
}

/// Load `config.json` (or defaults) and assemble the full validated model.
pub fn load_model(dir: &Path) -> Result<(NetworkConfig, BnnModel)> {
    let config_path = dir.join("config.json");
    let config = if config_path.exists() {
        NetworkConfig::load(&config_path)
            .with_context(|| format!("load {}", config_path.display()))?
    } else {
        NetworkConfig::default()
    };
    config.validate().context("network config")?;

    let conv1 = load_conv(dir, "conv1", config.conv1())?;
    let conv2 = load_conv(dir, "conv2", config.conv2())?;
    let fc1 = load_dense(
        dir,
        "fc1",
        config.dense_input_units(),
        config.hidden_units,
        true,
    )?;
    let fc2 = load_dense(dir, "fc2", config.hidden_units, config.classes, false)?;

    let model = BnnModel::new(conv1, conv2, fc1, fc2).context("assemble model")?;
    Ok((config, model))
}

// ── Test set ────────────────────────────────────────────────────────────────

/// Labelled evaluation images: raw signed pixels plus the expected class.
pub struct TestSet {
    pub images: Vec<Vec<i8>>,
    pub labels: Vec<usize>,
}

impl TestSet {
    /// Load images (`pixels_per_image` integers each) and one label per
    /// image, optionally truncated to `limit` images.
    pub fn load(
        images_path: &Path,
        labels_path: &Path,
        pixels_per_image: usize,
        limit: Option<usize>,
    ) -> Result<Self> {
        let text = std::fs::read_to_string(images_path)
            .with_context(|| format!("read {}", images_path.display()))?;
        let mut pixels = Vec::new();
        for tok in text.split_whitespace() {
            let v: i32 = tok
                .parse()
                .with_context(|| format!("bad pixel {tok:?} in {}", images_path.display()))?;
            if !(-128..=127).contains(&v) {
                bail!("pixel {v} out of i8 range in {}", images_path.display());
            }
            pixels.push(v as i8);
        }
        if pixels.len() % pixels_per_image != 0 {
            bail!(
                "{}: {} values is not a whole number of {pixels_per_image}-pixel images",
                images_path.display(),
                pixels.len()
            );
        }
        let mut images: Vec<Vec<i8>> = pixels
            .chunks(pixels_per_image)
            .map(<[i8]>::to_vec)
            .collect();

        let label_text = std::fs::read_to_string(labels_path)
            .with_context(|| format!("read {}", labels_path.display()))?;
        let mut labels = Vec::new();
        for tok in label_text.split_whitespace() {
            let v: usize = tok
                .parse()
                .with_context(|| format!("bad label {tok:?} in {}", labels_path.display()))?;
            labels.push(v);
        }

        if let Some(n) = limit {
            images.truncate(n);
            labels.truncate(n);
        }
        if images.len() != labels.len() {
            bail!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            );
        }
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

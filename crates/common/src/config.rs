//! Network topology configuration.
//!
//! Serialised as JSON next to the weight files so a model directory is
//! self-describing. Every field has a default matching the trained MNIST
//! topology, so a minimal `{}` JSON (or a missing file) produces the
//! standard network. Missing fields fall back to their `#[serde(default)]`
//! values for backwards compatibility.

use serde::{Deserialize, Serialize};

use crate::error::{BnnError, Result};

/// Maximum feature-map channel count the fixed-size storage supports.
pub const MAX_CHANNELS: usize = 64;
/// Maximum feature-map spatial extent.
pub const MAX_SPATIAL: usize = 32;
/// Convolution filter width; the pipeline supports exactly 5×5 filters.
pub const FILTER_SIZE: usize = 5;
/// Number of output classes.
pub const NUM_CLASSES: usize = 10;

/// The fixed five-stage topology: two conv+pool stages and two dense layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Input image width/height (images are square).
    #[serde(default = "default_image_size")]
    pub image_size: usize,
    /// Output channels of the first convolution stage.
    #[serde(default = "default_conv1_channels")]
    pub conv1_channels: usize,
    /// Output channels of the second convolution stage.
    #[serde(default = "default_conv2_channels")]
    pub conv2_channels: usize,
    /// Hidden units of the first (binarizing) dense layer.
    #[serde(default = "default_hidden_units")]
    pub hidden_units: usize,
    /// Output classes of the final (linear) dense layer.
    #[serde(default = "default_classes")]
    pub classes: usize,
}

fn default_image_size() -> usize {
    28
}
fn default_conv1_channels() -> usize {
    32
}
fn default_conv2_channels() -> usize {
    64
}
fn default_hidden_units() -> usize {
    512
}
fn default_classes() -> usize {
    NUM_CLASSES
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            image_size: default_image_size(),
            conv1_channels: default_conv1_channels(),
            conv2_channels: default_conv2_channels(),
            hidden_units: default_hidden_units(),
            classes: default_classes(),
        }
    }
}

impl NetworkConfig {
    /// Check the topology against the fixed storage maxima.
    ///
    /// The image is pooled 2×2 twice, so `image_size` must divide by 4.
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 || self.image_size > MAX_SPATIAL {
            return Err(BnnError::shape(
                "image size",
                format!("1..={MAX_SPATIAL}"),
                self.image_size,
            ));
        }
        if self.image_size % 4 != 0 {
            return Err(BnnError::shape(
                "image size",
                "a multiple of 4 (pooled twice)",
                self.image_size,
            ));
        }
        for (name, channels) in [
            ("conv1 channels", self.conv1_channels),
            ("conv2 channels", self.conv2_channels),
        ] {
            if channels == 0 || channels > MAX_CHANNELS {
                return Err(BnnError::shape(
                    name,
                    format!("1..={MAX_CHANNELS}"),
                    channels,
                ));
            }
        }
        if self.classes == 0 || self.hidden_units == 0 {
            return Err(BnnError::shape(
                "dense units",
                "non-zero",
                format!("{}x{}", self.hidden_units, self.classes),
            ));
        }
        Ok(())
    }

    /// Shape of the first convolution stage (single-channel input image).
    pub fn conv1(&self) -> LayerConfig {
        LayerConfig {
            in_channels: 1,
            out_channels: self.conv1_channels,
            spatial: self.image_size,
            filter: FILTER_SIZE,
        }
    }

    /// Shape of the second convolution stage (after the first 2×2 pool).
    pub fn conv2(&self) -> LayerConfig {
        LayerConfig {
            in_channels: self.conv1_channels,
            out_channels: self.conv2_channels,
            spatial: self.image_size / 2,
            filter: FILTER_SIZE,
        }
    }

    /// Feature-map width after both pooling stages.
    pub fn pooled_size(&self) -> usize {
        self.image_size / 4
    }

    /// Input width of the first dense layer (position-major flattened).
    pub fn dense_input_units(&self) -> usize {
        self.pooled_size() * self.pooled_size() * self.conv2_channels
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

/// Immutable shape descriptor for one convolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    /// Input (and output) feature-map width; padding keeps the extent.
    pub spatial: usize,
    pub filter: usize,
}

impl LayerConfig {
    /// Per-layer weight-magnitude constant: `con = √(2 / (F²·M))`.
    ///
    /// Stands in for the weight magnitude since stored weights are ±1.
    pub fn con(&self) -> f32 {
        (2.0 / (self.filter * self.filter * self.in_channels) as f32).sqrt()
    }

    /// Check the stage shape against the fixed maxima.
    pub fn validate(&self) -> Result<()> {
        if self.filter != FILTER_SIZE {
            return Err(BnnError::shape("filter size", FILTER_SIZE, self.filter));
        }
        if self.in_channels == 0 || self.in_channels > MAX_CHANNELS {
            return Err(BnnError::shape(
                "input channels",
                format!("1..={MAX_CHANNELS}"),
                self.in_channels,
            ));
        }
        if self.out_channels == 0 || self.out_channels > MAX_CHANNELS {
            return Err(BnnError::shape(
                "output channels",
                format!("1..={MAX_CHANNELS}"),
                self.out_channels,
            ));
        }
        if self.spatial == 0 || self.spatial > MAX_SPATIAL {
            return Err(BnnError::shape(
                "spatial extent",
                format!("1..={MAX_SPATIAL}"),
                self.spatial,
            ));
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! Tiled binary convolution with fused batch-norm threshold.
//!
//! One pass does convolution, normalisation and activation: for every valid
//! (pixel, filter-offset, input-channel, output-channel) combination the
//! input bit is compared with the filter bit — equal adds `con`, unequal
//! subtracts it — into a per-channel [`Fixed`] accumulator, and once every
//! input-channel group has landed the channel's [`ChannelAffine`] threshold
//! turns the sum into an output bit. No real-valued feature map is ever
//! materialised.
//!
//! Zero padding is realised as *no contribution*: a boundary predicate skips
//! any filter offset whose implied source pixel falls outside the input
//! extent. A stored bit could only mean ±1, so padding must never be a
//! stored value.
//!
//! Channels are processed in fixed-size groups (8 input × 16 output), which
//! bounds the live accumulator buffer independent of the true channel count;
//! output-channel groups are independent and run in parallel, each writing
//! only its own output rows.

use rayon::prelude::*;

use bitconv_common::{BnnError, LayerConfig, Result};

use crate::fixed::Fixed;
use crate::norm::ChannelAffine;
use crate::tensor::BinaryTensor;
use crate::weights::BinaryFilterBank;

/// Input channels accumulated per tile.
const IN_GROUP: usize = 8;
/// Output channels computed per tile; also the parallel work unit.
const OUT_GROUP: usize = 16;

/// Convolution + fused batch-norm + binarize stage.
pub struct BinaryConv2d {
    config: LayerConfig,
    filters: BinaryFilterBank,
    affines: Vec<ChannelAffine>,
    con: Fixed,
}

impl BinaryConv2d {
    /// Build a stage, checking that filters and affines agree with the
    /// declared shape.
    pub fn new(
        config: LayerConfig,
        filters: BinaryFilterBank,
        affines: Vec<ChannelAffine>,
    ) -> Result<Self> {
        config.validate()?;
        if filters.in_channels() != config.in_channels
            || filters.out_channels() != config.out_channels
        {
            return Err(BnnError::shape(
                "conv filter bank",
                format!("{}x{}", config.in_channels, config.out_channels),
                format!("{}x{}", filters.in_channels(), filters.out_channels()),
            ));
        }
        if affines.len() != config.out_channels {
            return Err(BnnError::shape(
                "conv affine table",
                config.out_channels,
                affines.len(),
            ));
        }
        let con = Fixed::from_f32(config.con());
        Ok(Self {
            config,
            filters,
            affines,
            con,
        })
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Run the stage: (M, I, I) in, (N, I, I) out, already binarized.
    pub fn forward(&self, input: &BinaryTensor) -> Result<BinaryTensor> {
        if input.channels() != self.config.in_channels || input.size() != self.config.spatial {
            return Err(BnnError::shape(
                "conv input",
                format!(
                    "{}x{}x{}",
                    self.config.in_channels, self.config.spatial, self.config.spatial
                ),
                format!("{}x{}x{}", input.channels(), input.size(), input.size()),
            ));
        }
        let size = self.config.spatial;
        let mut output = BinaryTensor::new(self.config.out_channels, size)?;

        // Each group of OUT_GROUP channels owns a contiguous, disjoint chunk
        // of the channel-major row storage.
        output
            .rows_mut()
            .par_chunks_mut(OUT_GROUP * size)
            .enumerate()
            .for_each(|(group, rows)| {
                self.forward_group(input, group * OUT_GROUP, rows);
            });
        Ok(output)
    }

    /// Compute output channels `[base_out, base_out + group_n)` into `rows`.
    fn forward_group(&self, input: &BinaryTensor, base_out: usize, rows: &mut [u32]) {
        let size = self.config.spatial;
        let filter = self.config.filter;
        let margin = (filter / 2) as isize;
        let group_n = OUT_GROUP.min(self.config.out_channels - base_out);
        let mut accum = vec![Fixed::ZERO; group_n * size * size];

        // Partial sums must span every input-channel group before the
        // threshold fires, so the affine step sits outside this loop.
        let mut base_in = 0;
        while base_in < self.config.in_channels {
            let group_m = IN_GROUP.min(self.config.in_channels - base_in);
            for y in 0..size {
                for kr in 0..filter {
                    let sy = y as isize + kr as isize - margin;
                    if sy < 0 || sy >= size as isize {
                        continue; // padding: no contribution
                    }
                    for x in 0..size {
                        for kc in 0..filter {
                            let sx = x as isize + kc as isize - margin;
                            if sx < 0 || sx >= size as isize {
                                continue;
                            }
                            for mm in 0..group_m {
                                let m = base_in + mm;
                                let in_bit = input.get(m, sy as usize, sx as usize);
                                for nn in 0..group_n {
                                    let w_bit = self.filters.get(base_out + nn, m, kr, kc);
                                    let cell = &mut accum[(nn * size + y) * size + x];
                                    *cell += if in_bit == w_bit { self.con } else { -self.con };
                                }
                            }
                        }
                    }
                }
            }
            base_in += IN_GROUP;
        }

        for nn in 0..group_n {
            let affine = &self.affines[base_out + nn];
            for y in 0..size {
                let mut row = 0u32;
                for x in 0..size {
                    if affine.binarize(accum[(nn * size + y) * size + x]) {
                        row |= 1 << x;
                    }
                }
                rows[nn * size + y] = row;
            }
        }
    }
}

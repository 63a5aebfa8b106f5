//! Layout transform feeding the dense layers.
//!
//! The convolution side is channel-major `(c, y, x)`; the trained dense
//! weights expect position-major, channel-interleaved order. Pure data
//! movement — the only numeric effect is re-encoding bits as ±1.0 floats
//! for the XNOR layers.

use crate::tensor::BinaryTensor;

/// Position-major interleaved index: `c + (x + y·W)·C`.
#[inline]
pub fn interleaved_index(channel: usize, row: usize, col: usize, width: usize, channels: usize) -> usize {
    channel + (col + row * width) * channels
}

/// Inverse of [`interleaved_index`]: recover `(channel, row, col)`.
#[inline]
pub fn planar_coords(pos: usize, width: usize, channels: usize) -> (usize, usize, usize) {
    let channel = pos % channels;
    let p = pos / channels;
    (channel, p / width, p % width)
}

/// Flatten a channel-major tensor into the position-major ±1.0 vector the
/// dense layers consume.
pub fn channel_reshape(input: &BinaryTensor) -> Vec<f32> {
    let channels = input.channels();
    let width = input.size();
    let mut out = vec![0.0f32; channels * width * width];
    for c in 0..channels {
        for y in 0..width {
            for x in 0..width {
                out[interleaved_index(c, y, x, width, channels)] =
                    if input.get(c, y, x) { 1.0 } else { -1.0 };
            }
        }
    }
    out
}

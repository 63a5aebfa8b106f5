//! # bitconv-core — The Numeric Engine
//!
//! Every compute primitive of the binarized inference pipeline lives here:
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`tensor`] | `BinaryTensor` — single-bit ±1 feature maps |
//! | [`fixed`] | `Fixed` — Q16.16 accumulator (add / negate / sign test) |
//! | [`weights`] | `BinaryFilterBank`, `DenseWeightMatrix` |
//! | [`norm`] | `ChannelAffine` — fused batch-norm threshold |
//! | [`conv`] | `BinaryConv2d` — tiled conv + norm + binarize in one pass |
//! | [`pool`] | `max_pool_2x2` — per-channel 2×2 OR-pooling |
//! | [`reshape`] | channel-major → position-major layout transform |
//! | [`dense`] | `XnorDense` — fully-connected XNOR-popcount layers |
//! | [`model`] | `BnnModel` — the fixed five-stage wiring |
//!
//! ## Design principles
//!
//! 1. **Multiply-free hot path.** The convolution inner loop only compares
//!    bits and adds ±`con`; the single fixed-point multiply sits in the
//!    per-channel threshold, applied once per output cell.
//! 2. **Fail fast.** Shapes and encodings are checked before any arithmetic;
//!    a contract violation never produces silently-wrong scores.
//! 3. **`Send + Sync`-safe.** Weights are plain read-only data; activation
//!    buffers are owned by a single invocation, so one model serves any
//!    number of concurrent inferences.
//! 4. **Deterministic.** Same image + same weights = bit-identical scores.

pub mod conv;
pub mod dense;
pub mod fixed;
pub mod model;
pub mod norm;
pub mod pool;
pub mod reshape;
pub mod tensor;
pub mod weights;

// ── Public re-exports ───────────────────────────────────────────────────────

pub use conv::BinaryConv2d;
pub use dense::XnorDense;
pub use fixed::Fixed;
pub use model::{BnnModel, Scores};
pub use norm::ChannelAffine;
pub use pool::max_pool_2x2;
pub use reshape::{channel_reshape, interleaved_index, planar_coords};
pub use tensor::BinaryTensor;
pub use weights::{BinaryFilterBank, DenseWeightMatrix};

//! # bitconv-common — Shared Primitives
//!
//! Types shared across every crate in the workspace:
//!
//! * **[`NetworkConfig`]** — the fixed network topology (serialised as JSON).
//! * **[`LayerConfig`]** — shape descriptor for one convolution stage.
//! * **[`BnnError`]** — the contract-violation error taxonomy.

pub mod config;
pub mod error;

pub use config::{
    LayerConfig, NetworkConfig, FILTER_SIZE, MAX_CHANNELS, MAX_SPATIAL, NUM_CLASSES,
};
pub use error::{BnnError, Result};

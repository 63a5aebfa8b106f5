//! # bitconv-infer — Loading and Batch Evaluation
//!
//! * **[`loader`]** — ASCII weight/affine/image parsers for the trained
//!   model's data formats; assembles a validated [`bitconv_core::BnnModel`].
//! * **[`TestSet`]** — labelled evaluation images.
//! * **[`InferenceRuntime`]** — load a model directory, classify single
//!   images, evaluate accuracy over a test set in parallel.

pub mod loader;
pub mod runtime;

pub use loader::{load_model, TestSet};
pub use runtime::{argmax, EvalReport, InferenceRuntime};

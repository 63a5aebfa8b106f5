//! Error taxonomy for the inference core.
//!
//! The pipeline is pure and deterministic, so there are no transient or
//! retryable failures — only caller-contract violations. Every check runs
//! before the numeric work starts; a bad shape or encoding can never produce
//! silently-wrong scores.

use thiserror::Error;

/// Contract violations detected by precondition checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BnnError {
    /// Declared dimensions exceed the fixed maxima, or a tensor's shape
    /// disagrees with the stage it was handed to.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    /// A dense-layer input or weight is not exactly -1.0 or +1.0.
    /// Equality counting requires the exact encoding; drift is not tolerated
    /// via epsilon comparison.
    #[error("invalid encoding at index {index}: {value} is not exactly ±1.0")]
    InvalidEncoding { index: usize, value: f32 },
}

impl BnnError {
    /// Shorthand for [`BnnError::ShapeMismatch`].
    pub fn shape(
        context: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::ShapeMismatch {
            context,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BnnError>;

//! High-level inference runtime: load once, classify many.
//!
//! The loaded model is plain read-only data, so batch evaluation fans
//! images out across the rayon pool; each invocation owns its activation
//! buffers and writes nothing shared.

use std::path::Path;

use anyhow::{bail, Result};
use rayon::prelude::*;

use bitconv_common::NetworkConfig;
use bitconv_core::{BinaryTensor, BnnModel, Scores};

use crate::loader::{self, TestSet};

/// Index of the highest score; ties break toward the lower class index.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

/// Accuracy bookkeeping for one evaluation run (or a chunk of one).
#[derive(Debug, Default, Clone, Copy)]
pub struct EvalReport {
    pub correct: usize,
    pub total: usize,
}

impl EvalReport {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn merge(&mut self, other: EvalReport) {
        self.correct += other.correct;
        self.total += other.total;
    }
}

/// A loaded model plus its topology; shared read-only across threads.
pub struct InferenceRuntime {
    config: NetworkConfig,
    model: BnnModel,
}

impl InferenceRuntime {
    /// Load a model directory (see [`crate::loader`] for the layout).
    pub fn load(model_dir: &Path) -> Result<Self> {
        let (config, model) = loader::load_model(model_dir)?;
        tracing::info!(
            dir = %model_dir.display(),
            image_size = config.image_size,
            conv1 = config.conv1_channels,
            conv2 = config.conv2_channels,
            hidden = config.hidden_units,
            "model loaded"
        );
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Classify one raw image, returning the ten class scores.
    pub fn classify(&self, pixels: &[i8]) -> Result<Scores> {
        let image = BinaryTensor::from_pixels(pixels, self.config.image_size)?;
        Ok(self.model.infer(&image)?)
    }

    /// Classify and reduce to the predicted class.
    pub fn predict(&self, pixels: &[i8]) -> Result<usize> {
        Ok(argmax(&self.classify(pixels)?))
    }

    /// Evaluate accuracy over labelled images, in parallel across the
    /// rayon pool.
    pub fn evaluate(&self, images: &[Vec<i8>], labels: &[usize]) -> Result<EvalReport> {
        if images.len() != labels.len() {
            bail!("{} images but {} labels", images.len(), labels.len());
        }
        let correct = images
            .par_iter()
            .zip(labels.par_iter())
            .map(|(pixels, &label)| -> Result<usize> {
                let predicted = self.predict(pixels)?;
                Ok(usize::from(predicted == label))
            })
            .try_reduce(|| 0usize, |a, b| Ok(a + b))?;
        let report = EvalReport {
            correct,
            total: images.len(),
        };
        tracing::debug!(
            correct = report.correct,
            total = report.total,
            accuracy = report.accuracy(),
            "batch evaluated"
        );
        Ok(report)
    }

    /// Evaluate a whole [`TestSet`].
    pub fn evaluate_set(&self, set: &TestSet) -> Result<EvalReport> {
        self.evaluate(&set.images, &set.labels)
    }
}

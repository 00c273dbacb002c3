//! Affinity prediction from a trained regression bundle.
//!
//! A bundle is a JSON file carrying the protocol, the descriptor list, an
//! optional standard scaler, the linear model itself, and (optionally) the
//! test set it was validated on. On load the bundle is re-verified against
//! that test set before it is trusted for new predictions.

use super::descriptors::{self, DescriptorError, DescriptorRequest};
use crate::config::Settings;
use crate::makemodel::ModelPipeline;
use crate::progress::ProgressReporter;
use crate::scoring::Scorer;
use crate::types::ChainCounts;
use md5::{Digest, Md5};
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

/// Maximum RMSE drift tolerated when re-verifying a bundle on its test set.
pub const BUNDLE_RMSE_TOLERANCE: f64 = 0.001;

pub const DEFAULT_NMODELS: usize = 12;
pub const DEFAULT_NCORES: usize = 11;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Could not read bundle '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse bundle '{path}': {source}", path = path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Bundle expects {expected} features but got {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error(
        "Bundle failed verification on its test set (RMSE {rmse:.6}, tolerance {BUNDLE_RMSE_TOLERANCE})"
    )]
    Verification { rmse: f64 },

    #[error(transparent)]
    Descriptors(#[from] DescriptorError),
}

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        if features.len() != self.mean.len() {
            return Err(PredictError::ShapeMismatch {
                expected: self.mean.len(),
                found: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictError> {
        if features.len() != self.coefficients.len() {
            return Err(PredictError::ShapeMismatch {
                expected: self.coefficients.len(),
                found: features.len(),
            });
        }
        Ok(features
            .iter()
            .zip(&self.coefficients)
            .map(|(x, c)| x * c)
            .sum::<f64>()
            + self.intercept)
    }
}

/// Held-out samples the bundle was validated on; rows of `features` line up
/// with `labels`.
#[derive(Debug, Clone, Deserialize)]
pub struct TestSet {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

/// A trained regression with everything needed to reproduce its inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct RegressionBundle {
    pub protocol: String,
    pub descriptors: Vec<String>,
    pub scaler: Option<Scaler>,
    pub model: LinearModel,
    pub test_set: Option<TestSet>,
}

impl RegressionBundle {
    /// Loads a bundle and, when it carries a test set, re-verifies the model
    /// reproduces the stored labels within [`BUNDLE_RMSE_TOLERANCE`].
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let raw = fs::read_to_string(path).map_err(|source| PredictError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: Self =
            serde_json::from_str(&raw).map_err(|source| PredictError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        bundle.verify()?;
        Ok(bundle)
    }

    fn verify(&self) -> Result<(), PredictError> {
        let Some(test) = &self.test_set else {
            return Ok(());
        };
        let mut sq_sum = 0.0;
        for (row, label) in test.features.iter().zip(&test.labels) {
            let predicted = self.predict_one(row)?;
            sq_sum += (predicted - label).powi(2);
        }
        let rmse = (sq_sum / test.labels.len() as f64).sqrt();
        if rmse > BUNDLE_RMSE_TOLERANCE {
            return Err(PredictError::Verification { rmse });
        }
        Ok(())
    }

    /// Applies the scaler (when present) and the linear model to one feature
    /// vector, in the bundle's descriptor order.
    pub fn predict_one(&self, features: &[f64]) -> Result<f64, PredictError> {
        match &self.scaler {
            Some(scaler) => self.model.predict(&scaler.transform(features)?),
            None => self.model.predict(features),
        }
    }
}

/// MD5 hex digest of a sequence; the default directory name for a complex
/// identified only by its sequence.
pub fn sequence_digest(sequence: &str) -> String {
    let digest = Md5::digest(sequence.as_bytes());
    let mut hex = String::with_capacity(32);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// One end-to-end prediction: which complex, and how hard to work on it.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub bundle: PathBuf,
    pub template: PathBuf,
    pub sequence: String,
    pub nchains: ChainCounts,
    /// Working directory; defaults to the sequence digest under the
    /// configured model tree.
    pub wrkdir: Option<PathBuf>,
    pub nmodels: usize,
    pub ncores: usize,
}

/// Builds the models a bundle needs, medians its descriptors, and runs the
/// regression. Returns the predicted binding affinity.
#[instrument(skip_all, name = "predict_workflow")]
pub fn eval_bundle(
    settings: &Settings,
    pipeline: &dyn ModelPipeline,
    scorer: &dyn Scorer,
    request: &PredictRequest,
    reporter: &ProgressReporter,
) -> Result<f64, PredictError> {
    let bundle = RegressionBundle::load(&request.bundle)?;
    let wrkdir = match &request.wrkdir {
        Some(dir) => dir.clone(),
        None => settings.wrkdir.join(sequence_digest(&request.sequence)),
    };
    info!(
        "Evaluating bundle '{}' in {}",
        request.bundle.display(),
        wrkdir.display()
    );

    let desc_request = DescriptorRequest {
        wrkdir: wrkdir.clone(),
        protocol: bundle.protocol.as_str().into(),
        template: request.template.clone(),
        sequence: request.sequence.clone(),
        nchains: request.nchains,
        wanted: bundle.descriptors.clone(),
        nmodels: request.nmodels,
        ncores: request.ncores,
        force: false,
    };
    descriptors::get_descriptors(pipeline, scorer, &desc_request, reporter)?;

    let scores = descriptors::get_descriptors_average(
        &wrkdir,
        &desc_request.protocol,
        &bundle.descriptors,
        Some(request.nmodels),
        true,
    )?;
    let features: Vec<f64> = scores.iter().map(|(_, agg)| agg.avg).collect();
    bundle.predict_one(&features)
}

//! Adapter around the externally trained scaler + binary classifier pair.
//!
//! The engine never trains or inspects the model. A [`ModelLoader`] produces the artifacts once,
//! during startup, and the adapter serves lock-free reads afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::reading::{FeatureReading, FEATURE_COUNT};

/// Binary verdict of the pre-trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClassifierLabel {
    NoMaintenance,
    MaintenanceNeeded,
}

impl From<ClassifierLabel> for u8 {
    fn from(value: ClassifierLabel) -> Self {
        match value {
            ClassifierLabel::NoMaintenance => 0,
            ClassifierLabel::MaintenanceNeeded => 1,
        }
    }
}

impl TryFrom<u8> for ClassifierLabel {
    type Error = InvalidLabel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ClassifierLabel::NoMaintenance),
            1 => Ok(ClassifierLabel::MaintenanceNeeded),
            other => Err(InvalidLabel(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLabel(pub u8);

impl fmt::Display for InvalidLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "classifier label must be 0 or 1, got {}", self.0)
    }
}

impl std::error::Error for InvalidLabel {}

/// Feature normalisation fitted alongside the model.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, values: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT];
}

/// Pre-trained binary model operating on scaled features.
pub trait BinaryClassifier: Send + Sync {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> ClassifierLabel;
}

/// Loaded scaler and model handles.
pub struct ModelArtifacts {
    pub scaler: Box<dyn FeatureScaler>,
    pub model: Box<dyn BinaryClassifier>,
}

impl fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifacts").finish_non_exhaustive()
    }
}

/// Produces the scaler and model at startup.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<ModelArtifacts, ModelUnavailableError>;
}

/// The classifier could not be loaded, so no prediction is possible.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelUnavailableError {
    #[error("prediction unavailable: no model artifacts configured")]
    NotConfigured,
    #[error("prediction unavailable: cannot read {}: {detail}", .path.display())]
    Unreadable { path: PathBuf, detail: String },
    #[error("prediction unavailable: malformed artifact {}: {detail}", .path.display())]
    Malformed { path: PathBuf, detail: String },
}

/// Classifier capability injected into the maintenance service.
pub struct ClassifierAdapter {
    loader: Option<Box<dyn ModelLoader>>,
    artifacts: OnceLock<Result<ModelArtifacts, ModelUnavailableError>>,
}

impl ClassifierAdapter {
    /// Defers loading until [`ClassifierAdapter::initialize`] or the first classification.
    pub fn new<L>(loader: L) -> Self
    where
        L: ModelLoader + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            artifacts: OnceLock::new(),
        }
    }

    pub fn from_parts<S, M>(scaler: S, model: M) -> Self
    where
        S: FeatureScaler + 'static,
        M: BinaryClassifier + 'static,
    {
        Self {
            loader: None,
            artifacts: OnceLock::from(Ok(ModelArtifacts {
                scaler: Box::new(scaler),
                model: Box::new(model),
            })),
        }
    }

    pub fn unavailable(error: ModelUnavailableError) -> Self {
        Self {
            loader: None,
            artifacts: OnceLock::from(Err(error)),
        }
    }

    /// Runs the loader if it has not run yet. Concurrent callers share a single attempt.
    pub fn initialize(&self) -> Result<(), ModelUnavailableError> {
        self.artifacts().map(|_| ())
    }

    pub fn is_available(&self) -> bool {
        self.artifacts().is_ok()
    }

    pub fn classify(
        &self,
        reading: &FeatureReading,
    ) -> Result<ClassifierLabel, ModelUnavailableError> {
        let artifacts = self.artifacts()?;
        let scaled = artifacts.scaler.transform(reading.values());
        Ok(artifacts.model.predict(&scaled))
    }

    fn artifacts(&self) -> Result<&ModelArtifacts, ModelUnavailableError> {
        self.artifacts
            .get_or_init(|| {
                let outcome = match &self.loader {
                    Some(loader) => loader.load(),
                    None => Err(ModelUnavailableError::NotConfigured),
                };
                match &outcome {
                    Ok(_) => info!("maintenance classifier loaded"),
                    Err(err) => warn!(error = %err, "maintenance classifier failed to load"),
                }
                outcome
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.artifacts.get() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "unavailable",
        };
        f.debug_struct("ClassifierAdapter")
            .field("state", &state)
            .finish()
    }
}

/// Standard scaler exported as JSON: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerArtifact {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl FeatureScaler for StandardScalerArtifact {
    fn transform(&self, values: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (index, value) in values.into_iter().enumerate() {
            // constant features are exported with scale 0; they pass through centred
            let scale = if self.scale[index] == 0.0 {
                1.0
            } else {
                self.scale[index]
            };
            scaled[index] = (value - self.mean[index]) / scale;
        }
        scaled
    }
}

/// Logistic regression exported as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModelArtifact {
    pub coefficients: [f64; FEATURE_COUNT],
    pub intercept: f64,
    #[serde(default = "default_decision_threshold")]
    pub threshold: f64,
}

fn default_decision_threshold() -> f64 {
    0.5
}

impl LogisticModelArtifact {
    pub fn probability(&self, scaled: &[f64; FEATURE_COUNT]) -> f64 {
        let logit: f64 = self
            .coefficients
            .iter()
            .zip(scaled)
            .map(|(coefficient, value)| coefficient * value)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-logit).exp())
    }
}

impl BinaryClassifier for LogisticModelArtifact {
    fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> ClassifierLabel {
        if self.probability(scaled) > self.threshold {
            ClassifierLabel::MaintenanceNeeded
        } else {
            ClassifierLabel::NoMaintenance
        }
    }
}

/// Loads [`StandardScalerArtifact`] and [`LogisticModelArtifact`] from JSON files.
#[derive(Debug, Clone)]
pub struct JsonArtifactLoader {
    scaler_path: PathBuf,
    model_path: PathBuf,
}

impl JsonArtifactLoader {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(scaler_path: P, model_path: Q) -> Self {
        Self {
            scaler_path: scaler_path.into(),
            model_path: model_path.into(),
        }
    }
}

impl ModelLoader for JsonArtifactLoader {
    fn load(&self) -> Result<ModelArtifacts, ModelUnavailableError> {
        let scaler: StandardScalerArtifact = read_artifact(&self.scaler_path)?;
        ensure_finite(&self.scaler_path, scaler.mean.iter().chain(&scaler.scale))?;

        let model: LogisticModelArtifact = read_artifact(&self.model_path)?;
        ensure_finite(
            &self.model_path,
            model.coefficients.iter().chain([&model.intercept]),
        )?;
        if !(model.threshold > 0.0 && model.threshold < 1.0) {
            return Err(ModelUnavailableError::Malformed {
                path: self.model_path.clone(),
                detail: format!("decision threshold {} outside (0, 1)", model.threshold),
            });
        }

        Ok(ModelArtifacts {
            scaler: Box::new(scaler),
            model: Box::new(model),
        })
    }
}

fn read_artifact<T>(path: &Path) -> Result<T, ModelUnavailableError>
where
    T: for<'de> Deserialize<'de>,
{
    let raw = std::fs::read(path).map_err(|err| ModelUnavailableError::Unreadable {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    serde_json::from_slice(&raw).map_err(|err| ModelUnavailableError::Malformed {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })
}

fn ensure_finite<'a, I>(path: &Path, values: I) -> Result<(), ModelUnavailableError>
where
    I: IntoIterator<Item = &'a f64>,
{
    if values.into_iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(ModelUnavailableError::Malformed {
            path: path.to_path_buf(),
            detail: "artifact contains non-finite parameters".to_string(),
        })
    }
}

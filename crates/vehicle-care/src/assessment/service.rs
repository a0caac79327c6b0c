use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::classifier::{ClassifierAdapter, ClassifierLabel, ModelUnavailableError};
use super::history::{HistoryRecord, HistoryStore, OwnerId, StoreError, VehicleId};
use super::reading::{FeatureReading, ValidationError};
use super::scoring::{DecisionEngine, EngineConfig, OverallAssessment};

/// Inbound facade: validation, scoring, classification and history in one place.
pub struct MaintenanceService<S> {
    engine: Arc<DecisionEngine>,
    classifier: Arc<ClassifierAdapter>,
    store: Arc<S>,
    require_classifier: bool,
}

impl<S> MaintenanceService<S>
where
    S: HistoryStore + 'static,
{
    pub fn new(config: EngineConfig, classifier: Arc<ClassifierAdapter>, store: Arc<S>) -> Self {
        Self {
            engine: Arc::new(DecisionEngine::new(config)),
            classifier,
            store,
            require_classifier: false,
        }
    }

    /// Report "prediction unavailable" instead of degrading to heuristic-only assessments.
    pub fn require_classifier(mut self, required: bool) -> Self {
        self.require_classifier = required;
        self
    }

    pub fn classifier_available(&self) -> bool {
        self.classifier.is_available()
    }

    /// Single entry point for raw string-keyed input.
    pub fn evaluate<H: BuildHasher>(
        &self,
        raw: &HashMap<String, String, H>,
    ) -> Result<OverallAssessment, EvaluationError> {
        let reading = FeatureReading::from_raw(raw)?;
        self.evaluate_reading(&reading)
    }

    pub fn evaluate_reading(
        &self,
        reading: &FeatureReading,
    ) -> Result<OverallAssessment, EvaluationError> {
        let implausible = reading.implausible_fields();
        if !implausible.is_empty() {
            let fields: Vec<&str> = implausible.iter().map(|field| field.key()).collect();
            warn!(fields = ?fields, "reading outside plausible sensor ranges");
        }

        let label = self.classifier_label(reading)?;
        let scores = self.engine.score(reading);
        let assessment = self.engine.assess(reading, label, &scores);

        debug!(
            composite = assessment.composite_score,
            tier = assessment.tier.label(),
            "assessment computed"
        );
        Ok(assessment)
    }

    /// Evaluates and persists the result. Storage failures are returned in the outcome and
    /// never discard the assessment.
    pub fn evaluate_and_record<H: BuildHasher>(
        &self,
        raw: &HashMap<String, String, H>,
        vehicle_id: VehicleId,
        owner_id: OwnerId,
    ) -> Result<RecordedAssessment, EvaluationError> {
        let reading = FeatureReading::from_raw(raw)?;
        let assessment = self.evaluate_reading(&reading)?;
        let record = HistoryRecord::build(&reading, &assessment, vehicle_id, owner_id, Utc::now());

        let storage = match self.store.save(record.clone()) {
            Ok(()) => StorageOutcome::Stored,
            Err(err) => {
                warn!(
                    vehicle_id = %record.vehicle_id,
                    error = %err,
                    "history record not persisted"
                );
                StorageOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        Ok(RecordedAssessment {
            assessment,
            record,
            storage,
        })
    }

    pub fn latest(&self, vehicle_id: &VehicleId) -> Result<Option<HistoryRecord>, StoreError> {
        self.store.fetch_latest(vehicle_id)
    }

    pub fn history(&self, vehicle_id: &VehicleId) -> Result<Vec<HistoryRecord>, StoreError> {
        self.store.fetch_all(vehicle_id)
    }

    fn classifier_label(
        &self,
        reading: &FeatureReading,
    ) -> Result<Option<ClassifierLabel>, EvaluationError> {
        match self.classifier.classify(reading) {
            Ok(label) => Ok(Some(label)),
            Err(err) if self.require_classifier => Err(err.into()),
            Err(err) => {
                debug!(error = %err, "classifier unavailable, assessing from heuristics only");
                Ok(None)
            }
        }
    }
}

/// Assessment plus the history record derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedAssessment {
    pub assessment: OverallAssessment,
    pub record: HistoryRecord,
    pub storage: StorageOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StorageOutcome {
    Stored,
    Failed { reason: String },
}

/// Error raised by [`MaintenanceService::evaluate`].
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ModelUnavailable(#[from] ModelUnavailableError),
}

//! Risk assessment and maintenance decision engine.
//!
//! Raw sensor fields flow through [`FeatureReading`] validation, per-subsystem scoring and the
//! optional classifier into an [`OverallAssessment`]. [`MaintenanceService`] wires these
//! together for callers and hands finished assessments to a [`HistoryStore`].

pub mod classifier;
pub mod history;
pub mod import;
pub mod reading;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use classifier::{
    BinaryClassifier, ClassifierAdapter, ClassifierLabel, FeatureScaler, JsonArtifactLoader,
    LogisticModelArtifact, ModelArtifacts, ModelLoader, ModelUnavailableError,
    StandardScalerArtifact,
};
pub use history::{HistoryRecord, HistoryStore, OwnerId, StoreError, VehicleId};
pub use import::{ImportedReading, ReadingCsvImporter, ReadingImportError};
pub use reading::{FeatureField, FeatureReading, ValidationError, FEATURE_COUNT};
pub use router::{assessment_router, AssessmentRequest};
pub use scoring::{
    ConfigurationError, DecisionBasis, DecisionEngine, EngineConfig, MaintenanceTier,
    OverallAssessment, ScoringConfig, ScoringPreset, ScoringRule, Subsystem, SubsystemAssessment,
    SubsystemScores, TierThresholds,
};
pub use service::{EvaluationError, MaintenanceService, RecordedAssessment, StorageOutcome};

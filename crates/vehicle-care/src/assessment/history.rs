use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::ClassifierLabel;
use super::reading::{FeatureReading, ValidationError};
use super::scoring::{DecisionBasis, MaintenanceTier, OverallAssessment};

/// Identifier wrapper for monitored vehicles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub String);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for the account that owns a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Storage-friendly flattening of an assessment and the reading it was computed from.
///
/// Reading fields keep their canonical keys so [`HistoryRecord::reading`] rebuilds the exact
/// input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub vehicle_id: VehicleId,
    pub owner_id: OwnerId,
    pub recorded_at: DateTime<Utc>,
    pub engine_temperature: f64,
    pub oil_pressure: f64,
    pub vibration_level: f64,
    pub battery_voltage: f64,
    pub mileage: f64,
    pub fuel_efficiency: f64,
    pub subsystem_scores: BTreeMap<String, f64>,
    pub composite_score: f64,
    pub tier: MaintenanceTier,
    pub classifier_label: Option<ClassifierLabel>,
    pub basis: DecisionBasis,
}

impl HistoryRecord {
    pub fn build(
        reading: &FeatureReading,
        assessment: &OverallAssessment,
        vehicle_id: VehicleId,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> Self {
        let subsystem_scores = assessment
            .subsystems
            .iter()
            .map(|entry| (entry.subsystem.key().to_string(), entry.score))
            .collect();

        Self {
            vehicle_id,
            owner_id,
            recorded_at: now,
            engine_temperature: reading.engine_temperature(),
            oil_pressure: reading.oil_pressure(),
            vibration_level: reading.vibration_level(),
            battery_voltage: reading.battery_voltage(),
            mileage: reading.mileage(),
            fuel_efficiency: reading.fuel_efficiency(),
            subsystem_scores,
            composite_score: assessment.composite_score,
            tier: assessment.tier,
            classifier_label: assessment.classifier_label,
            basis: assessment.basis,
        }
    }

    /// Rebuilds the reading this record was created from.
    pub fn reading(&self) -> Result<FeatureReading, ValidationError> {
        FeatureReading::from_values([
            self.engine_temperature,
            self.oil_pressure,
            self.vibration_level,
            self.battery_voltage,
            self.mileage,
            self.fuel_efficiency,
        ])
    }
}

/// Outbound storage collaborator.
pub trait HistoryStore: Send + Sync {
    fn save(&self, record: HistoryRecord) -> Result<(), StoreError>;
    fn fetch_latest(&self, vehicle_id: &VehicleId) -> Result<Option<HistoryRecord>, StoreError>;
    /// Newest first.
    fn fetch_all(&self, vehicle_id: &VehicleId) -> Result<Vec<HistoryRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
    #[error("history record rejected: {0}")]
    Rejected(String),
}

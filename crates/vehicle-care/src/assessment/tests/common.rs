use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::assessment::classifier::{
    BinaryClassifier, ClassifierAdapter, ClassifierLabel, FeatureScaler, ModelUnavailableError,
};
use crate::assessment::history::{HistoryRecord, HistoryStore, StoreError, VehicleId};
use crate::assessment::reading::{FeatureReading, FEATURE_COUNT};
use crate::assessment::scoring::{DecisionEngine, EngineConfig};
use crate::assessment::{assessment_router, MaintenanceService};

pub(super) const IDEAL: [f64; FEATURE_COUNT] = [90.0, 3.5, 0.0, 12.6, 0.0, 15.0];
pub(super) const DEGRADED: [f64; FEATURE_COUNT] = [150.0, 1.0, 10.0, 10.0, 200_000.0, 5.0];

const KEYS: [&str; FEATURE_COUNT] = [
    "engine_temperature",
    "oil_pressure",
    "vibration_level",
    "battery_voltage",
    "mileage",
    "fuel_efficiency",
];

pub(super) fn raw_fields(values: [f64; FEATURE_COUNT]) -> HashMap<String, String> {
    KEYS.iter()
        .zip(values)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub(super) fn reading(values: [f64; FEATURE_COUNT]) -> FeatureReading {
    FeatureReading::from_values(values).expect("valid reading")
}

pub(super) fn standard_engine() -> DecisionEngine {
    DecisionEngine::new(EngineConfig::standard())
}

pub(super) struct PassThrough;

impl FeatureScaler for PassThrough {
    fn transform(&self, values: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        values
    }
}

/// Returns the same verdict for every reading.
pub(super) struct FixedVerdict(pub(super) ClassifierLabel);

impl BinaryClassifier for FixedVerdict {
    fn predict(&self, _scaled: &[f64; FEATURE_COUNT]) -> ClassifierLabel {
        self.0
    }
}

pub(super) fn classifier(label: ClassifierLabel) -> Arc<ClassifierAdapter> {
    Arc::new(ClassifierAdapter::from_parts(PassThrough, FixedVerdict(label)))
}

pub(super) fn missing_classifier() -> Arc<ClassifierAdapter> {
    Arc::new(ClassifierAdapter::unavailable(
        ModelUnavailableError::NotConfigured,
    ))
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<Vec<HistoryRecord>>>,
}

impl HistoryStore for MemoryStore {
    fn save(&self, record: HistoryRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record);
        Ok(())
    }

    fn fetch_latest(&self, vehicle_id: &VehicleId) -> Result<Option<HistoryRecord>, StoreError> {
        Ok(self.fetch_all(vehicle_id)?.into_iter().next())
    }

    fn fetch_all(&self, vehicle_id: &VehicleId) -> Result<Vec<HistoryRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut records: Vec<HistoryRecord> = guard
            .iter()
            .filter(|record| &record.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        records.reverse();
        Ok(records)
    }
}

pub(super) struct OfflineStore;

impl HistoryStore for OfflineStore {
    fn save(&self, _record: HistoryRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_latest(&self, _vehicle_id: &VehicleId) -> Result<Option<HistoryRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch_all(&self, _vehicle_id: &VehicleId) -> Result<Vec<HistoryRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(
    classifier: Arc<ClassifierAdapter>,
) -> (MaintenanceService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = MaintenanceService::new(EngineConfig::standard(), classifier, store.clone());
    (service, store)
}

pub(super) fn router_with_service(service: MaintenanceService<MemoryStore>) -> axum::Router {
    assessment_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use vehicle_care::assessment::{
    ClassifierAdapter, HistoryRecord, HistoryStore, MaintenanceService, StoreError, VehicleId,
};
use vehicle_care::config::AppConfig;
use vehicle_care::error::AppError;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) classifier: Arc<ClassifierAdapter>,
}

/// Process-local history, newest record first per vehicle.
#[derive(Default, Clone)]
pub(crate) struct InMemoryHistoryStore {
    records: Arc<Mutex<HashMap<VehicleId, Vec<HistoryRecord>>>>,
}

impl InMemoryHistoryStore {
    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<VehicleId, Vec<HistoryRecord>>>, StoreError>
    {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("history mutex poisoned".to_string()))
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn save(&self, record: HistoryRecord) -> Result<(), StoreError> {
        let mut guard = self.guard()?;
        guard
            .entry(record.vehicle_id.clone())
            .or_default()
            .insert(0, record);
        Ok(())
    }

    fn fetch_latest(&self, vehicle_id: &VehicleId) -> Result<Option<HistoryRecord>, StoreError> {
        let guard = self.guard()?;
        Ok(guard
            .get(vehicle_id)
            .and_then(|records| records.first())
            .cloned())
    }

    fn fetch_all(&self, vehicle_id: &VehicleId) -> Result<Vec<HistoryRecord>, StoreError> {
        let guard = self.guard()?;
        Ok(guard.get(vehicle_id).cloned().unwrap_or_default())
    }
}

/// Resolves scoring settings and loads the classifier once, before any request is served.
pub(crate) fn build_service(
    config: &AppConfig,
) -> Result<
    (
        Arc<MaintenanceService<InMemoryHistoryStore>>,
        Arc<ClassifierAdapter>,
    ),
    AppError,
> {
    let engine_config = config.scoring.engine_config()?;
    info!(
        soon = engine_config.thresholds.soon,
        urgent = ?engine_config.thresholds.urgent,
        preset = ?config.scoring.preset,
        custom_rules = config.scoring.config_path.is_some(),
        "scoring configuration resolved"
    );

    let classifier = Arc::new(config.model.classifier());
    if let Err(err) = classifier.initialize() {
        if config.model.require_classifier {
            warn!(
                error = %err,
                "classifier required but unavailable; assessments will be rejected"
            );
        }
    }

    let store = Arc::new(InMemoryHistoryStore::default());
    let service = MaintenanceService::new(engine_config, classifier.clone(), store)
        .require_classifier(config.model.require_classifier);

    Ok((Arc::new(service), classifier))
}

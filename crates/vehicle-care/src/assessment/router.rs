use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::history::{HistoryStore, OwnerId, VehicleId};
use super::reading::FeatureField;
use super::scoring::OverallAssessment;
use super::service::{EvaluationError, MaintenanceService, StorageOutcome};

const UNASSIGNED_OWNER: &str = "unassigned";

/// Prediction request: the six sensor fields at the top level, as strings or numbers.
///
/// Other keys are accepted and ignored. A canonical field holding `null` counts as missing and
/// any other non-numeric JSON value is rejected during validation with the field named.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

impl AssessmentRequest {
    /// Raw string form of the canonical sensor fields.
    pub fn raw_fields(&self) -> HashMap<String, String> {
        FeatureField::ordered()
            .into_iter()
            .filter_map(|field| {
                let raw = match self.fields.get(field.key())? {
                    Value::Null => return None,
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                Some((field.key().to_string(), raw))
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct AssessmentResponse {
    assessment: OverallAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StorageOutcome>,
}

/// Router builder exposing the prediction and history endpoints.
pub fn assessment_router<S>(service: Arc<MaintenanceService<S>>) -> Router
where
    S: HistoryStore + 'static,
{
    Router::new()
        .route("/api/v1/assessments", post(assess_handler::<S>))
        .route(
            "/api/v1/vehicles/:vehicle_id/history",
            get(history_handler::<S>),
        )
        .route(
            "/api/v1/vehicles/:vehicle_id/history/latest",
            get(latest_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn assess_handler<S>(
    State(service): State<Arc<MaintenanceService<S>>>,
    axum::Json(request): axum::Json<AssessmentRequest>,
) -> Response
where
    S: HistoryStore + 'static,
{
    let raw = request.raw_fields();
    let AssessmentRequest {
        vehicle_id,
        owner_id,
        ..
    } = request;

    let outcome = match vehicle_id.filter(|id| !id.trim().is_empty()) {
        Some(vehicle_id) => {
            let owner_id = owner_id.unwrap_or_else(|| UNASSIGNED_OWNER.to_string());
            service
                .evaluate_and_record(&raw, VehicleId(vehicle_id), OwnerId(owner_id))
                .map(|recorded| AssessmentResponse {
                    assessment: recorded.assessment,
                    storage: Some(recorded.storage),
                })
        }
        None => service.evaluate(&raw).map(|assessment| AssessmentResponse {
            assessment,
            storage: None,
        }),
    };

    match outcome {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(EvaluationError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "field": error.field().key(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(EvaluationError::ModelUnavailable(error)) => {
            let payload = json!({
                "error": "prediction unavailable",
                "detail": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn latest_handler<S>(
    State(service): State<Arc<MaintenanceService<S>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    S: HistoryStore + 'static,
{
    let id = VehicleId(vehicle_id);
    match service.latest(&id) {
        Ok(Some(record)) => (StatusCode::OK, axum::Json(record)).into_response(),
        Ok(None) => {
            let payload = json!({
                "vehicle_id": id.0,
                "error": "no assessments recorded",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn history_handler<S>(
    State(service): State<Arc<MaintenanceService<S>>>,
    Path(vehicle_id): Path<String>,
) -> Response
where
    S: HistoryStore + 'static,
{
    let id = VehicleId(vehicle_id);
    match service.history(&id) {
        Ok(records) => {
            let payload = json!({
                "vehicle_id": id.0,
                "records": records,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

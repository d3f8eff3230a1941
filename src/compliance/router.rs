use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::CaseDossier;
use super::repository::{AlertPublisher, AssessmentRepository, CaseRef, DossierStatus, RepositoryError};
use super::service::{AssessmentServiceError, CaseAssessmentService};

/// Router builder exposing HTTP endpoints for dossier intake and scoring.
pub fn assessment_router<R, A>(service: Arc<CaseAssessmentService<R, A>>) -> Router
where
    R: AssessmentRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/compliance/cases", post(submit_handler::<R, A>))
        .route(
            "/api/v1/compliance/cases/:case_ref",
            get(status_handler::<R, A>),
        )
        .route(
            "/api/v1/compliance/cases/:case_ref/assessment",
            post(assess_handler::<R, A>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R, A>(
    State(service): State<Arc<CaseAssessmentService<R, A>>>,
    axum::Json(dossier): axum::Json<CaseDossier>,
) -> Response
where
    R: AssessmentRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.submit(dossier) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.view())).into_response(),
        Err(AssessmentServiceError::Input(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(AssessmentServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({ "error": "case already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn assess_handler<R, A>(
    State(service): State<Arc<CaseAssessmentService<R, A>>>,
    Path(case_ref): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    A: AlertPublisher + 'static,
{
    let case_ref = CaseRef(case_ref);
    match service.assess(&case_ref) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(AssessmentServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({ "error": format!("unknown case {}", case_ref.0) });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(AssessmentServiceError::Input(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<R, A>(
    State(service): State<Arc<CaseAssessmentService<R, A>>>,
    Path(case_ref): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    A: AlertPublisher + 'static,
{
    let case_ref = CaseRef(case_ref);
    match service.get(&case_ref) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(AssessmentServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "case_ref": case_ref.0,
                "status": DossierStatus::Received.label(),
                "score_global": serde_json::Value::Null,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

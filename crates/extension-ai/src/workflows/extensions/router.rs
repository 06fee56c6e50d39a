use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde_json::json;

use super::domain::{ExtensionRequest, RequestId};
use super::repository::{AuditLog, DecisionLog, RequestStore, StoreError};
use super::service::{ExtensionReviewService, FinalizeDecision, ReviewServiceError};

type SharedService<S, D, A> = Arc<ExtensionReviewService<S, D, A>>;

/// Router exposing evaluation, intake, and review endpoints.
pub fn extension_router<S, D, A>(service: SharedService<S, D, A>) -> Router
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/extensions/evaluate",
            post(evaluate_handler::<S, D, A>),
        )
        .route("/api/v1/extensions", post(submit_handler::<S, D, A>))
        .route(
            "/api/v1/extensions/pending",
            get(pending_handler::<S, D, A>),
        )
        .route(
            "/api/v1/extensions/statistics",
            get(statistics_handler::<S, D, A>),
        )
        .route(
            "/api/v1/extensions/:request_id/review",
            get(review_handler::<S, D, A>),
        )
        .route(
            "/api/v1/extensions/:request_id/decision",
            post(decision_handler::<S, D, A>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<S, D, A>(
    State(service): State<SharedService<S, D, A>>,
    axum::Json(request): axum::Json<ExtensionRequest>,
) -> Response
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    match service.evaluate(&request) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S, D, A>(
    State(service): State<SharedService<S, D, A>>,
    axum::Json(request): axum::Json<ExtensionRequest>,
) -> Response
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    match service.submit(request) {
        Ok(stored) => (StatusCode::ACCEPTED, axum::Json(stored)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pending_handler<S, D, A>(
    State(service): State<SharedService<S, D, A>>,
) -> Response
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    match service.pending() {
        Ok(pending) => (StatusCode::OK, axum::Json(pending)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statistics_handler<S, D, A>(
    State(service): State<SharedService<S, D, A>>,
) -> Response
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    match service.statistics(Local::now().date_naive()) {
        Ok(statistics) => (StatusCode::OK, axum::Json(statistics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<S, D, A>(
    State(service): State<SharedService<S, D, A>>,
    Path(request_id): Path<String>,
) -> Response
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    match service.review(&RequestId(request_id)) {
        Ok(review) => (StatusCode::OK, axum::Json(review)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<S, D, A>(
    State(service): State<SharedService<S, D, A>>,
    Path(request_id): Path<String>,
    axum::Json(verdict): axum::Json<FinalizeDecision>,
) -> Response
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    match service.finalize(&RequestId(request_id), verdict) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ReviewServiceError) -> Response {
    let status = match &error {
        ReviewServiceError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewServiceError::MissingRequestId => StatusCode::BAD_REQUEST,
        ReviewServiceError::NotFound(_) | ReviewServiceError::Store(StoreError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        ReviewServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        ReviewServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use extension_ai::workflows::extensions::{
    extension_router, AuditLog, DecisionLog, ExtensionReviewService, RequestStore,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_extension_routes<S, D, A>(
    service: Arc<ExtensionReviewService<S, D, A>>,
) -> axum::Router
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    extension_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::LedgerReviewService;
    use extension_ai::workflows::extensions::{CsvLedger, DecisionEngine};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn ledger_service(dir: &TempDir) -> LedgerReviewService {
        let ledger = Arc::new(CsvLedger::open(dir.path()).expect("ledger opens"));
        ExtensionReviewService::new(
            DecisionEngine::default(),
            ledger.clone(),
            ledger.clone(),
            ledger,
        )
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = readiness_endpoint(Extension(app_state(false)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readiness_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_and_extension_routes_are_mounted() {
        let dir = TempDir::new().expect("temp dir");
        let service = ledger_service(&dir);
        let router =
            with_extension_routes(Arc::new(service)).layer(Extension(app_state(true)));

        let health = router
            .clone()
            .oneshot(
                axum::http::Request::get("/health")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(health.status(), StatusCode::OK);

        let pending = router
            .clone()
            .oneshot(
                axum::http::Request::get("/api/v1/extensions/pending")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(pending.status(), StatusCode::OK);

        let metrics = router
            .oneshot(
                axum::http::Request::get("/metrics")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(metrics.status(), StatusCode::OK);
    }
}

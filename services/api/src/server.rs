use crate::cli::ServeArgs;
use crate::infra::{ledger_review_service, AppState};
use crate::routes::with_extension_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use extension_ai::config::AppConfig;
use extension_ai::error::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let review_service = Arc::new(ledger_review_service(&config, None)?);

    let app = with_extension_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "extension decision service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

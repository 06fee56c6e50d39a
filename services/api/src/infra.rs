use chrono::NaiveDate;
use extension_ai::config::AppConfig;
use extension_ai::error::AppError;
use extension_ai::workflows::extensions::{CsvLedger, DecisionEngine, ExtensionReviewService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type LedgerReviewService = ExtensionReviewService<CsvLedger, CsvLedger, CsvLedger>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Review service over the CSV ledger in `data_dir`, falling back to the configured directory.
pub(crate) fn ledger_review_service(
    config: &AppConfig,
    data_dir: Option<PathBuf>,
) -> Result<LedgerReviewService, AppError> {
    let policy = config.decision_policy()?;
    let data_dir = data_dir.unwrap_or_else(|| config.storage.data_dir.clone());
    let ledger = Arc::new(CsvLedger::open(&data_dir)?);

    info!(
        data_dir = %data_dir.display(),
        custom_policy = config.policy_path.is_some(),
        "extension ledger opened"
    );

    Ok(ExtensionReviewService::new(
        DecisionEngine::new(policy),
        ledger.clone(),
        ledger.clone(),
        ledger,
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

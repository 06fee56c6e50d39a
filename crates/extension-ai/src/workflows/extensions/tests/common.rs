use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::extensions::domain::{ExtensionRequest, FieldValue, RequestId};
use crate::workflows::extensions::repository::{
    AuditEntry, AuditLog, DecisionLog, DecisionRecord, RequestStore, StoreError,
};
use crate::workflows::extensions::{extension_router, DecisionEngine, ExtensionReviewService};

pub(super) type MemoryService = ExtensionReviewService<MemoryRequests, MemoryDecisions, MemoryAudit>;

pub(super) fn request(
    id: &str,
    amount: f64,
    days: f64,
    reliability: f64,
    history: f64,
    cash_flow: &str,
    priority: &str,
) -> ExtensionRequest {
    ExtensionRequest {
        request_id: RequestId(id.to_string()),
        vendor_name: "Prime Logistics".to_string(),
        reason: Some("Seasonal cash flow".to_string()),
        invoice_amount: Some(FieldValue::Number(amount)),
        requested_extension_days: Some(FieldValue::Number(days)),
        vendor_reliability_score: Some(FieldValue::Number(reliability)),
        payment_history_score: Some(FieldValue::Number(history)),
        cash_flow_impact: Some(FieldValue::text(cash_flow)),
        priority: Some(FieldValue::text(priority)),
        ..ExtensionRequest::default()
    }
}

/// Trusted vendor, small invoice, short extension.
pub(super) fn trusted_request() -> ExtensionRequest {
    request("REQ-1001", 10_000.0, 7.0, 0.95, 0.95, "Low", "Low")
}

/// Large invoice from a shaky vendor.
pub(super) fn large_risky_request() -> ExtensionRequest {
    request("REQ-1002", 60_000.0, 30.0, 0.5, 0.5, "High", "High")
}

/// Same vendor profile as the large request, below the escalation amount.
pub(super) fn small_risky_request() -> ExtensionRequest {
    request("REQ-1003", 10_000.0, 30.0, 0.5, 0.5, "High", "High")
}

/// Confidence between the approval thresholds with risk under the moderate ceiling.
pub(super) fn moderate_request() -> ExtensionRequest {
    request("REQ-1004", 10_000.0, 14.0, 0.8, 0.8, "Medium", "Medium")
}

pub(super) fn engine() -> DecisionEngine {
    DecisionEngine::default()
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryRequests>,
    Arc<MemoryDecisions>,
    Arc<MemoryAudit>,
) {
    let requests = Arc::new(MemoryRequests::default());
    let decisions = Arc::new(MemoryDecisions::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = ExtensionReviewService::new(
        engine(),
        requests.clone(),
        decisions.clone(),
        audit.clone(),
    );
    (service, requests, decisions, audit)
}

pub(super) fn seeded_service(pending: Vec<ExtensionRequest>) -> (
    MemoryService,
    Arc<MemoryRequests>,
    Arc<MemoryDecisions>,
    Arc<MemoryAudit>,
) {
    let (service, requests, decisions, audit) = build_service();
    for request in pending {
        service.submit(request).expect("seed request");
    }
    (service, requests, decisions, audit)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRequests {
    records: Arc<Mutex<BTreeMap<RequestId, ExtensionRequest>>>,
}

impl RequestStore for MemoryRequests {
    fn insert(&self, request: ExtensionRequest) -> Result<ExtensionRequest, StoreError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        if guard.contains_key(&request.request_id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(request.request_id.clone(), request.clone());
        Ok(request)
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<ExtensionRequest>, StoreError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn pending(&self) -> Result<Vec<ExtensionRequest>, StoreError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn remove(&self, id: &RequestId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDecisions {
    records: Arc<Mutex<Vec<DecisionRecord>>>,
}

impl DecisionLog for MemoryDecisions {
    fn append(&self, record: DecisionRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("decision mutex poisoned")
            .push(record);
        Ok(())
    }

    fn history(&self) -> Result<Vec<DecisionRecord>, StoreError> {
        Ok(self.records.lock().expect("decision mutex poisoned").clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl AuditLog for MemoryAudit {
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("audit mutex poisoned")
            .push(entry);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.entries.lock().expect("audit mutex poisoned").clone())
    }
}

pub(super) struct UnavailableRequests;

impl RequestStore for UnavailableRequests {
    fn insert(&self, _request: ExtensionRequest) -> Result<ExtensionRequest, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn fetch(&self, _id: &RequestId) -> Result<Option<ExtensionRequest>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn pending(&self) -> Result<Vec<ExtensionRequest>, StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }

    fn remove(&self, _id: &RequestId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("ledger offline".to_string()))
    }
}

/// Queue whose removals always miss, as when a concurrent finalize dequeued the request first.
#[derive(Default)]
pub(super) struct RacingRequests {
    pub(super) inner: MemoryRequests,
}

impl RequestStore for RacingRequests {
    fn insert(&self, request: ExtensionRequest) -> Result<ExtensionRequest, StoreError> {
        self.inner.insert(request)
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<ExtensionRequest>, StoreError> {
        self.inner.fetch(id)
    }

    fn pending(&self) -> Result<Vec<ExtensionRequest>, StoreError> {
        self.inner.pending()
    }

    fn remove(&self, _id: &RequestId) -> Result<(), StoreError> {
        Err(StoreError::NotFound)
    }
}

pub(super) struct UnavailableDecisions;

impl DecisionLog for UnavailableDecisions {
    fn append(&self, _record: DecisionRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("history offline".to_string()))
    }

    fn history(&self) -> Result<Vec<DecisionRecord>, StoreError> {
        Ok(Vec::new())
    }
}

pub(super) fn extension_router_with_service(service: MemoryService) -> axum::Router {
    extension_router(Arc::new(service))
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

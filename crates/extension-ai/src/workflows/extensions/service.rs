use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Decision, ExtensionRequest, FieldValue, RequestId};
use super::evaluation::{round_two, DecisionEngine, DecisionResult, EvaluationError};
use super::repository::{
    AuditEntry, AuditLog, DecisionLog, DecisionRecord, RequestStore, StoreError,
};
use super::statistics::{summarize, LedgerStatistics};

/// Actor recorded for decisions finalized without a human reviewer.
pub const SYSTEM_ACTOR: &str = "System";

/// Service composing the decision engine with the request queue, decision history, and audit trail.
pub struct ExtensionReviewService<S, D, A> {
    engine: Arc<DecisionEngine>,
    requests: Arc<S>,
    decisions: Arc<D>,
    audit: Arc<A>,
}

/// Reviewer's verdict on a pending request. Without an explicit decision the AI recommendation stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeDecision {
    #[serde(default)]
    pub final_decision: Option<Decision>,
    pub reviewer: String,
}

/// Pending request paired with the engine's current recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionReview {
    pub request: ExtensionRequest,
    pub result: DecisionResult,
}

/// Outcome of a batch pass over the pending queue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoProcessSummary {
    pub finalized: Vec<DecisionRecord>,
    pub escalated: Vec<RequestId>,
    pub invalid: Vec<InvalidRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidRequest {
    pub request_id: RequestId,
    pub error: String,
}

impl<S, D, A> ExtensionReviewService<S, D, A>
where
    S: RequestStore + 'static,
    D: DecisionLog + 'static,
    A: AuditLog + 'static,
{
    pub fn new(engine: DecisionEngine, requests: Arc<S>, decisions: Arc<D>, audit: Arc<A>) -> Self {
        Self {
            engine: Arc::new(engine),
            requests,
            decisions,
            audit,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Evaluate an ad-hoc request without touching any store.
    pub fn evaluate(&self, request: &ExtensionRequest) -> Result<DecisionResult, ReviewServiceError> {
        Ok(self.engine.evaluate(request)?)
    }

    /// Queue a new pending request.
    pub fn submit(&self, request: ExtensionRequest) -> Result<ExtensionRequest, ReviewServiceError> {
        if request.request_id.0.trim().is_empty() {
            return Err(ReviewServiceError::MissingRequestId);
        }

        let stored = self.requests.insert(request)?;
        info!(request_id = %stored.request_id, vendor = %stored.vendor_name, "extension request queued");
        Ok(stored)
    }

    pub fn pending(&self) -> Result<Vec<ExtensionRequest>, ReviewServiceError> {
        Ok(self.requests.pending()?)
    }

    /// Evaluate a pending request; nothing is recorded until it is finalized.
    pub fn review(&self, request_id: &RequestId) -> Result<ExtensionReview, ReviewServiceError> {
        let request = self.fetch(request_id)?;
        let result = self.engine.evaluate(&request)?;
        Ok(ExtensionReview { request, result })
    }

    /// Record the reviewer's verdict, append the audit entry, and dequeue the request.
    pub fn finalize(
        &self,
        request_id: &RequestId,
        verdict: FinalizeDecision,
    ) -> Result<DecisionRecord, ReviewServiceError> {
        let request = self.fetch(request_id)?;
        let result = self.engine.evaluate(&request)?;
        let final_decision = verdict.final_decision.unwrap_or(result.decision);

        self.record_decision(&request, &result, final_decision, true, &verdict.reviewer)
    }

    /// Finalize every pending request the engine can decide on its own.
    ///
    /// Escalations and requests that fail coercion stay in the queue for a human.
    pub fn auto_process(&self, actor: &str) -> Result<AutoProcessSummary, ReviewServiceError> {
        let mut summary = AutoProcessSummary::default();

        for request in self.requests.pending()? {
            let result = match self.engine.evaluate(&request) {
                Ok(result) => result,
                Err(error) => {
                    warn!(request_id = %request.request_id, %error, "request left in queue");
                    summary.invalid.push(InvalidRequest {
                        request_id: request.request_id.clone(),
                        error: error.to_string(),
                    });
                    continue;
                }
            };

            if result.decision == Decision::Escalate {
                summary.escalated.push(request.request_id.clone());
                continue;
            }

            let record = self.record_decision(&request, &result, result.decision, false, actor)?;
            summary.finalized.push(record);
        }

        Ok(summary)
    }

    pub fn statistics(&self, today: NaiveDate) -> Result<LedgerStatistics, ReviewServiceError> {
        let pending = self.requests.pending()?;
        let history = self.decisions.history()?;
        Ok(summarize(&pending, &history, today))
    }

    /// Most recent decisions first.
    pub fn recent_decisions(&self, limit: usize) -> Result<Vec<DecisionRecord>, ReviewServiceError> {
        let mut history = self.decisions.history()?;
        history.sort_by(|left, right| right.decision_date.cmp(&left.decision_date));
        history.truncate(limit);
        Ok(history)
    }

    fn fetch(&self, request_id: &RequestId) -> Result<ExtensionRequest, ReviewServiceError> {
        self.requests
            .fetch(request_id)?
            .ok_or_else(|| ReviewServiceError::NotFound(request_id.clone()))
    }

    fn record_decision(
        &self,
        request: &ExtensionRequest,
        result: &DecisionResult,
        final_decision: Decision,
        human_review: bool,
        actor: &str,
    ) -> Result<DecisionRecord, ReviewServiceError> {
        let now = now();
        let record = DecisionRecord {
            request_id: request.request_id.clone(),
            decision_date: now,
            ai_decision: result.decision,
            confidence_score: round_two(result.confidence_score),
            human_review,
            final_decision,
            processing_time_seconds: result.processing_time.as_secs_f64(),
            vendor_name: request.vendor_name.clone(),
            invoice_amount: request.invoice_amount.as_ref().and_then(FieldValue::as_f64),
        };

        let details = if record.overridden() {
            format!(
                "AI recommended {}, reviewer recorded {}",
                result.decision, final_decision
            )
        } else {
            format!("extension request {}", final_decision.outcome_verb())
        };

        // Dequeue first: a concurrent or repeated finalize stops here before writing history.
        self.requests
            .remove(&request.request_id)
            .map_err(|error| match error {
                StoreError::NotFound => ReviewServiceError::NotFound(request.request_id.clone()),
                other => other.into(),
            })?;

        let entry = AuditEntry {
            timestamp: now,
            action: format!("Decision: {final_decision}"),
            actor: actor.to_string(),
            request_id: Some(request.request_id.clone()),
            details,
            ip_address: None,
        };
        if let Err(error) = self.write_history(&record, entry) {
            if let Err(requeue) = self.requests.insert(request.clone()) {
                warn!(request_id = %request.request_id, %requeue, "failed to requeue request");
            }
            return Err(error);
        }

        info!(
            request_id = %record.request_id,
            ai_decision = %record.ai_decision,
            final_decision = %record.final_decision,
            human_review,
            "extension decision recorded"
        );

        Ok(record)
    }

    fn write_history(&self, record: &DecisionRecord, entry: AuditEntry) -> Result<(), ReviewServiceError> {
        self.decisions.append(record.clone())?;
        self.audit.record(entry)?;
        Ok(())
    }
}

// Ledgers store whole seconds; truncate so returned records match what is read back.
fn now() -> NaiveDateTime {
    let local = Local::now().naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("request {0} is not pending")]
    NotFound(RequestId),
    #[error("request_id is required")]
    MissingRequestId,
}

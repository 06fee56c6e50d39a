//! Payment-extension decisions for vendor invoices.
//!
//! A [`DecisionEngine`] scores each request on six weighted factors and either
//! approves, rejects, or escalates it for human review. The review service layers a
//! pending queue, decision history, and audit trail on top of the engine.

pub mod csv_ledger;
pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod service;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use csv_ledger::CsvLedger;
pub use domain::{Decision, ExtensionRequest, FieldValue, ImpactLevel, LevelInput, RequestId};
pub use evaluation::{
    classify, format_currency, Classification, DecisionEngine, DecisionPolicy, DecisionResult,
    DecisionRule, EvaluationError, FactorAssessment, FactorDetail, FactorKind,
    NormalizedFeatures, PolicyError, RawValue, Severity,
};
pub use repository::{
    AuditEntry, AuditLog, DecisionLog, DecisionRecord, RequestStore, StoreError,
};
pub use router::extension_router;
pub use service::{
    AutoProcessSummary, ExtensionReview, ExtensionReviewService, FinalizeDecision,
    ReviewServiceError, SYSTEM_ACTOR,
};
pub use statistics::LedgerStatistics;

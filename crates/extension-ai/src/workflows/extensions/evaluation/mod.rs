mod assessment;
mod config;
mod features;
mod policy;
mod reasoning;
mod scoring;

pub use assessment::{FactorAssessment, Severity};
pub use config::{
    DecisionPolicy, DecisionRules, FeatureWeights, InputDefaults, LevelRiskTable,
    NormalizationLimits, PolicyError, RiskBands,
};
pub use features::{NormalizedFeatures, RequestFactors};
pub use policy::{classify, Classification, DecisionRule};
pub use reasoning::format_currency;

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use super::domain::{Decision, ExtensionRequest};
use reasoning::ReasoningContext;

/// Stateless evaluator applying a fixed [`DecisionPolicy`] to extension requests.
///
/// The engine holds no mutable state, so a single instance can be shared
/// across threads and tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    policy: DecisionPolicy,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionPolicy::default())
    }
}

impl DecisionEngine {
    pub fn new(policy: DecisionPolicy) -> Self {
        let total = policy.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            warn!(total, "feature weights do not sum to 1.0");
        }

        Self { policy }
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Normalize, score, classify, explain. Fails only when a numeric field cannot be coerced.
    pub fn evaluate(&self, request: &ExtensionRequest) -> Result<DecisionResult, EvaluationError> {
        let started = Instant::now();

        let factors = RequestFactors::coerce(request, &self.policy.defaults)?;
        let normalized = NormalizedFeatures::from_factors(&factors, &self.policy);
        let risk = scoring::risk_score(&normalized, &self.policy.weights);
        let confidence = scoring::confidence_score(&factors, &self.policy.normalization);
        let classification = classify(
            confidence,
            risk,
            factors.invoice_amount,
            &self.policy.rules,
        );

        let reasoning = reasoning::explain(&ReasoningContext {
            decision: classification.decision,
            confidence,
            risk,
            factors: &factors,
            bands: &self.policy.bands,
        });
        let factor_details = self.factor_details(&factors, &normalized);

        debug!(
            request_id = %request.request_id,
            decision = %classification.decision,
            rule = ?classification.rule,
            risk,
            confidence,
            "evaluated extension request"
        );

        Ok(DecisionResult {
            decision: classification.decision,
            matched_rule: classification.rule,
            confidence_score: confidence,
            risk_score: risk,
            reasoning,
            processing_time: started.elapsed(),
            factor_details,
            normalized_features: normalized,
        })
    }

    fn factor_details(
        &self,
        factors: &RequestFactors,
        normalized: &NormalizedFeatures,
    ) -> BTreeMap<FactorKind, FactorDetail> {
        let weights = &self.policy.weights;

        FactorKind::ALL
            .iter()
            .map(|&kind| {
                let (raw_value, risk, weight) = match kind {
                    FactorKind::Amount => (
                        RawValue::Number(factors.invoice_amount),
                        normalized.amount_risk,
                        weights.amount,
                    ),
                    FactorKind::Extension => (
                        RawValue::Days(factors.requested_extension_days),
                        normalized.extension_risk,
                        weights.extension,
                    ),
                    FactorKind::Vendor => (
                        RawValue::Number(factors.vendor_reliability_score),
                        normalized.vendor_risk,
                        weights.vendor,
                    ),
                    FactorKind::Payment => (
                        RawValue::Number(factors.payment_history_score),
                        normalized.payment_risk,
                        weights.payment,
                    ),
                    FactorKind::CashFlow => (
                        RawValue::Level(factors.cash_flow_impact.label().to_string()),
                        normalized.cash_flow_risk,
                        weights.cash_flow,
                    ),
                    FactorKind::Priority => (
                        RawValue::Level(factors.priority.label().to_string()),
                        normalized.priority_risk,
                        weights.priority,
                    ),
                };

                let detail = FactorDetail {
                    raw_value,
                    normalized: risk,
                    weight,
                    contribution: risk * weight,
                    assessment: assessment::assess(kind, factors, &self.policy.bands),
                };
                (kind, detail)
            })
            .collect()
    }
}

/// The six scoring factors, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Amount,
    Extension,
    Vendor,
    Payment,
    CashFlow,
    Priority,
}

impl FactorKind {
    pub const ALL: [FactorKind; 6] = [
        FactorKind::Amount,
        FactorKind::Extension,
        FactorKind::Vendor,
        FactorKind::Payment,
        FactorKind::CashFlow,
        FactorKind::Priority,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FactorKind::Amount => "Invoice Amount",
            FactorKind::Extension => "Extension Period",
            FactorKind::Vendor => "Vendor Reliability",
            FactorKind::Payment => "Payment History",
            FactorKind::CashFlow => "Cash Flow Impact",
            FactorKind::Priority => "Priority Level",
        }
    }
}

/// Raw input value echoed back in the factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Days(i64),
    Level(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(value) => write!(f, "{value}"),
            RawValue::Days(days) => write!(f, "{days}"),
            RawValue::Level(level) => f.write_str(level),
        }
    }
}

/// Single feature's share of the risk score, allowing transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorDetail {
    pub raw_value: RawValue,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
    pub assessment: FactorAssessment,
}

/// Evaluation output: scores, verdict, narrative, and the factor-level breakdown.
///
/// Scores keep full precision in memory; serialization rounds them to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    pub decision: Decision,
    pub matched_rule: DecisionRule,
    #[serde(serialize_with = "serialize_two_decimals")]
    pub confidence_score: f64,
    #[serde(serialize_with = "serialize_two_decimals")]
    pub risk_score: f64,
    pub reasoning: String,
    #[serde(serialize_with = "serialize_seconds")]
    pub processing_time: Duration,
    pub factor_details: BTreeMap<FactorKind, FactorDetail>,
    pub normalized_features: NormalizedFeatures,
}

impl DecisionResult {
    pub fn contribution_total(&self) -> f64 {
        self.factor_details
            .values()
            .map(|detail| detail.contribution)
            .sum()
    }

    pub fn rounded_confidence(&self) -> f64 {
        round_two(self.confidence_score)
    }

    pub fn rounded_risk(&self) -> f64 {
        round_two(self.risk_score)
    }
}

/// The only condition that aborts an evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("field `{field}` cannot be read as a number: {value:?}")]
    InvalidInputType { field: &'static str, value: String },
}

pub(crate) fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_two(*value))
}

fn serialize_seconds<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

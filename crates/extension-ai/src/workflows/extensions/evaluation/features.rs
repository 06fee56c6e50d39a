use serde::{Deserialize, Serialize};

use super::super::domain::{ExtensionRequest, FieldValue, ImpactLevel, LevelInput};
use super::config::{DecisionPolicy, InputDefaults};
use super::EvaluationError;

/// Fully defaulted, strongly typed view of the six scoring fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFactors {
    pub invoice_amount: f64,
    pub requested_extension_days: i64,
    pub vendor_reliability_score: f64,
    pub payment_history_score: f64,
    pub cash_flow_impact: LevelInput,
    pub priority: LevelInput,
}

impl RequestFactors {
    pub fn coerce(
        request: &ExtensionRequest,
        defaults: &InputDefaults,
    ) -> Result<Self, EvaluationError> {
        Ok(Self {
            invoice_amount: coerce_real(
                "invoice_amount",
                request.invoice_amount.as_ref(),
                defaults.invoice_amount,
            )?,
            requested_extension_days: coerce_days(
                "requested_extension_days",
                request.requested_extension_days.as_ref(),
                defaults.requested_extension_days,
            )?,
            vendor_reliability_score: coerce_real(
                "vendor_reliability_score",
                request.vendor_reliability_score.as_ref(),
                defaults.vendor_reliability_score,
            )?,
            payment_history_score: coerce_real(
                "payment_history_score",
                request.payment_history_score.as_ref(),
                defaults.payment_history_score,
            )?,
            cash_flow_impact: coerce_level(
                request.cash_flow_impact.as_ref(),
                defaults.cash_flow_impact,
            ),
            priority: coerce_level(request.priority.as_ref(), defaults.priority),
        })
    }
}

/// Six risk scalars, each roughly in `[0, 1]`. Only amount and extension are capped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatures {
    pub amount_risk: f64,
    pub extension_risk: f64,
    pub vendor_risk: f64,
    pub payment_risk: f64,
    pub cash_flow_risk: f64,
    pub priority_risk: f64,
}

impl NormalizedFeatures {
    pub fn from_factors(factors: &RequestFactors, policy: &DecisionPolicy) -> Self {
        let limits = &policy.normalization;

        Self {
            amount_risk: (factors.invoice_amount / limits.amount_ceiling).min(1.0),
            extension_risk: (factors.requested_extension_days as f64
                / limits.extension_ceiling_days)
                .min(1.0),
            vendor_risk: 1.0 - factors.vendor_reliability_score,
            payment_risk: 1.0 - factors.payment_history_score,
            cash_flow_risk: policy
                .cash_flow_risk
                .lookup(factors.cash_flow_impact.known()),
            priority_risk: policy.priority_risk.lookup(factors.priority.known()),
        }
    }
}

fn present(value: Option<&FieldValue>) -> Option<&FieldValue> {
    value.filter(|value| !value.is_blank())
}

fn coerce_real(
    field: &'static str,
    value: Option<&FieldValue>,
    default: f64,
) -> Result<f64, EvaluationError> {
    let parsed = match present(value) {
        None => return Ok(default),
        Some(FieldValue::Number(number)) => Some(*number),
        Some(FieldValue::Text(text)) => text.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(invalid(field, value)),
    }
}

fn coerce_days(
    field: &'static str,
    value: Option<&FieldValue>,
    default: i64,
) -> Result<i64, EvaluationError> {
    match present(value) {
        None => Ok(default),
        Some(FieldValue::Number(number)) if number.is_finite() => Ok(number.trunc() as i64),
        Some(FieldValue::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(field, value)),
        Some(_) => Err(invalid(field, value)),
    }
}

fn coerce_level(value: Option<&FieldValue>, default: ImpactLevel) -> LevelInput {
    match present(value) {
        None => LevelInput::Known(default),
        Some(FieldValue::Text(text)) => match ImpactLevel::parse(text) {
            Some(level) => LevelInput::Known(level),
            None => LevelInput::Unmapped(text.clone()),
        },
        Some(other) => LevelInput::Unmapped(other.to_string()),
    }
}

fn invalid(field: &'static str, value: Option<&FieldValue>) -> EvaluationError {
    EvaluationError::InvalidInputType {
        field,
        value: value.map(ToString::to_string).unwrap_or_default(),
    }
}

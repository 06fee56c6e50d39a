use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the upstream request store (e.g. `REQ-1001`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loosely typed scalar as delivered by CSV rows (always text) or JSON bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Blank text is treated the same as an absent field.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(text) if text.trim().is_empty())
    }

    /// Lenient numeric view used for reporting; scoring goes through strict coercion.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Pending payment-extension request exactly as submitted by a vendor.
///
/// Every scoring field is optional and loosely typed; the engine applies the
/// configured defaults and coercion rules before any computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRequest {
    #[serde(default)]
    pub request_id: RequestId,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_amount: Option<FieldValue>,
    #[serde(default)]
    pub requested_extension_days: Option<FieldValue>,
    #[serde(default)]
    pub vendor_reliability_score: Option<FieldValue>,
    #[serde(default)]
    pub payment_history_score: Option<FieldValue>,
    #[serde(default)]
    pub cash_flow_impact: Option<FieldValue>,
    #[serde(default)]
    pub priority: Option<FieldValue>,
}

/// Symbolic level shared by `cash_flow_impact` and `priority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

impl ImpactLevel {
    /// Exact, case-sensitive match; request stores emit the canonical spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImpactLevel::Low => "Low",
            ImpactLevel::Medium => "Medium",
            ImpactLevel::High => "High",
        }
    }
}

/// Categorical input after coercion: a known level or the raw text that did not map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelInput {
    Known(ImpactLevel),
    Unmapped(String),
}

impl LevelInput {
    pub fn label(&self) -> &str {
        match self {
            LevelInput::Known(level) => level.label(),
            LevelInput::Unmapped(raw) => raw,
        }
    }

    pub fn known(&self) -> Option<ImpactLevel> {
        match self {
            LevelInput::Known(level) => Some(*level),
            LevelInput::Unmapped(_) => None,
        }
    }
}

/// Categorical recommendation produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
    Escalate,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
            Decision::Escalate => "Escalate",
        }
    }

    /// Past-tense verb used in audit details.
    pub fn outcome_verb(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
            Decision::Escalate => "escalated",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::ImpactLevel;

/// Static policy the engine is constructed with. Every section falls back to
/// the production defaults when omitted from a policy file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    pub weights: FeatureWeights,
    pub rules: DecisionRules,
    pub normalization: NormalizationLimits,
    pub cash_flow_risk: LevelRiskTable,
    pub priority_risk: LevelRiskTable,
    pub defaults: InputDefaults,
    pub bands: RiskBands,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            weights: FeatureWeights::default(),
            rules: DecisionRules::default(),
            normalization: NormalizationLimits::default(),
            cash_flow_risk: LevelRiskTable::cash_flow(),
            priority_risk: LevelRiskTable::priority(),
            defaults: InputDefaults::default(),
            bands: RiskBands::default(),
        }
    }
}

impl DecisionPolicy {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PolicyError> {
        let policy: DecisionPolicy = serde_json::from_reader(reader)?;
        Ok(policy)
    }
}

/// Per-feature coefficients of the weighted risk sum. Intended to total 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWeights {
    pub amount: f64,
    pub extension: f64,
    pub vendor: f64,
    pub payment: f64,
    pub cash_flow: f64,
    pub priority: f64,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        Self {
            amount: 0.25,
            extension: 0.20,
            vendor: 0.20,
            payment: 0.15,
            cash_flow: 0.15,
            priority: 0.05,
        }
    }
}

impl FeatureWeights {
    pub fn total(&self) -> f64 {
        self.amount + self.extension + self.vendor + self.payment + self.cash_flow + self.priority
    }
}

/// Thresholds of the classification table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionRules {
    pub auto_approve_threshold: f64,
    pub low_risk_threshold: f64,
    pub min_confidence_score: f64,
    pub escalate_risk_threshold: f64,
    pub high_risk_amount: f64,
    /// Risk ceiling for approving moderate-confidence requests.
    pub moderate_risk_ceiling: f64,
}

impl Default for DecisionRules {
    fn default() -> Self {
        Self {
            auto_approve_threshold: 0.8,
            low_risk_threshold: 0.4,
            min_confidence_score: 0.6,
            escalate_risk_threshold: 0.7,
            high_risk_amount: 50_000.0,
            moderate_risk_ceiling: 0.6,
        }
    }
}

/// Policy ceilings used to rescale open-ended quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationLimits {
    pub amount_ceiling: f64,
    pub extension_ceiling_days: f64,
    pub confidence_amount_scale: f64,
    pub max_amount_discount: f64,
}

impl Default for NormalizationLimits {
    fn default() -> Self {
        Self {
            amount_ceiling: 50_000.0,
            extension_ceiling_days: 30.0,
            confidence_amount_scale: 100_000.0,
            max_amount_discount: 0.3,
        }
    }
}

/// Risk assigned to each symbolic level, with a neutral value for unmapped input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRiskTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub fallback: f64,
}

impl LevelRiskTable {
    pub fn cash_flow() -> Self {
        Self {
            low: 0.2,
            medium: 0.5,
            high: 0.8,
            fallback: 0.5,
        }
    }

    pub fn priority() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            fallback: 0.5,
        }
    }

    pub fn lookup(&self, level: Option<ImpactLevel>) -> f64 {
        match level {
            Some(ImpactLevel::Low) => self.low,
            Some(ImpactLevel::Medium) => self.medium,
            Some(ImpactLevel::High) => self.high,
            None => self.fallback,
        }
    }
}

/// Values substituted for absent fields before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDefaults {
    pub invoice_amount: f64,
    pub requested_extension_days: i64,
    pub vendor_reliability_score: f64,
    pub payment_history_score: f64,
    pub cash_flow_impact: ImpactLevel,
    pub priority: ImpactLevel,
}

impl Default for InputDefaults {
    fn default() -> Self {
        Self {
            invoice_amount: 0.0,
            requested_extension_days: 0,
            vendor_reliability_score: 0.0,
            payment_history_score: 0.0,
            cash_flow_impact: ImpactLevel::Medium,
            priority: ImpactLevel::Medium,
        }
    }
}

/// Qualitative bands used by the narrative and the per-factor assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskBands {
    pub low_amount: f64,
    pub high_amount: f64,
    pub short_extension_days: i64,
    pub long_extension_days: i64,
    pub excellent_reliability: f64,
    pub good_reliability: f64,
    pub excellent_payment_history: f64,
    pub good_payment_history: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            low_amount: 20_000.0,
            high_amount: 50_000.0,
            short_extension_days: 14,
            long_extension_days: 21,
            excellent_reliability: 0.85,
            good_reliability: 0.70,
            excellent_payment_history: 0.85,
            good_payment_history: 0.70,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),
}

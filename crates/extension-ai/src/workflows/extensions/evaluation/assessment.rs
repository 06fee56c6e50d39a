use serde::{Deserialize, Serialize};

use super::super::domain::{ImpactLevel, LevelInput};
use super::config::RiskBands;
use super::features::RequestFactors;
use super::FactorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Favorable,
    Moderate,
    Elevated,
}

/// Plain-language band for a single raw factor, shown beside its contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorAssessment {
    pub severity: Severity,
    pub label: &'static str,
}

impl FactorAssessment {
    fn new(severity: Severity, label: &'static str) -> Self {
        Self { severity, label }
    }
}

pub(crate) fn assess(
    kind: FactorKind,
    factors: &RequestFactors,
    bands: &RiskBands,
) -> FactorAssessment {
    use Severity::*;

    match kind {
        FactorKind::Amount => {
            let amount = factors.invoice_amount;
            if amount < bands.low_amount {
                FactorAssessment::new(Favorable, "LOW RISK")
            } else if amount < bands.high_amount {
                FactorAssessment::new(Moderate, "MEDIUM")
            } else {
                FactorAssessment::new(Elevated, "HIGH RISK")
            }
        }
        FactorKind::Extension => {
            let days = factors.requested_extension_days;
            if days <= bands.short_extension_days {
                FactorAssessment::new(Favorable, "SHORT")
            } else if days <= bands.long_extension_days {
                FactorAssessment::new(Moderate, "MODERATE")
            } else {
                FactorAssessment::new(Elevated, "LONG PERIOD")
            }
        }
        FactorKind::Vendor => {
            let score = factors.vendor_reliability_score;
            if score > bands.excellent_reliability {
                FactorAssessment::new(Favorable, "EXCELLENT")
            } else if score > bands.good_reliability {
                FactorAssessment::new(Moderate, "GOOD")
            } else {
                FactorAssessment::new(Elevated, "CONCERNING")
            }
        }
        FactorKind::Payment => {
            let score = factors.payment_history_score;
            if score > bands.excellent_payment_history {
                FactorAssessment::new(Favorable, "EXCELLENT")
            } else if score > bands.good_payment_history {
                FactorAssessment::new(Moderate, "GOOD")
            } else {
                FactorAssessment::new(Elevated, "NEEDS REVIEW")
            }
        }
        FactorKind::CashFlow => match &factors.cash_flow_impact {
            LevelInput::Known(ImpactLevel::Low) => FactorAssessment::new(Favorable, "LOW IMPACT"),
            LevelInput::Known(ImpactLevel::Medium) => {
                FactorAssessment::new(Moderate, "MEDIUM IMPACT")
            }
            _ => FactorAssessment::new(Elevated, "HIGH IMPACT"),
        },
        FactorKind::Priority => match &factors.priority {
            LevelInput::Known(ImpactLevel::Low) => FactorAssessment::new(Favorable, "LOW"),
            LevelInput::Known(ImpactLevel::Medium) => FactorAssessment::new(Moderate, "MEDIUM"),
            _ => FactorAssessment::new(Elevated, "HIGH"),
        },
    }
}

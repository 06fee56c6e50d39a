use serde::{Deserialize, Serialize};

use super::super::domain::Decision;
use super::config::DecisionRules;

/// Row of the classification table that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    AutoApprove,
    LowConfidenceOrHighRisk,
    ModerateApproval,
    AmbiguousFallback,
}

impl DecisionRule {
    pub fn describe(self) -> &'static str {
        match self {
            DecisionRule::AutoApprove => "high confidence and low risk",
            DecisionRule::LowConfidenceOrHighRisk => "low confidence or high risk",
            DecisionRule::ModerateApproval => "moderate confidence with acceptable risk",
            DecisionRule::AmbiguousFallback => "ambiguous middle band",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub decision: Decision,
    pub rule: DecisionRule,
}

/// First matching row wins. A confidence exactly at `min_confidence_score` is
/// neither "low" nor "moderate" and only reaches a verdict through the risk
/// ceiling or the fallback row.
pub fn classify(confidence: f64, risk: f64, amount: f64, rules: &DecisionRules) -> Classification {
    if confidence >= rules.auto_approve_threshold && risk < rules.low_risk_threshold {
        return Classification {
            decision: Decision::Approved,
            rule: DecisionRule::AutoApprove,
        };
    }

    if confidence < rules.min_confidence_score || risk > rules.escalate_risk_threshold {
        let decision = if amount > rules.high_risk_amount {
            Decision::Escalate
        } else {
            Decision::Rejected
        };
        return Classification {
            decision,
            rule: DecisionRule::LowConfidenceOrHighRisk,
        };
    }

    if risk < rules.moderate_risk_ceiling && confidence > rules.min_confidence_score {
        return Classification {
            decision: Decision::Approved,
            rule: DecisionRule::ModerateApproval,
        };
    }

    Classification {
        decision: Decision::Escalate,
        rule: DecisionRule::AmbiguousFallback,
    }
}

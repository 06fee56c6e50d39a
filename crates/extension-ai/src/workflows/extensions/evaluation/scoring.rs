use super::config::{FeatureWeights, NormalizationLimits};
use super::features::{NormalizedFeatures, RequestFactors};

/// Weighted sum of the normalized features. Deliberately left unclamped: an
/// out-of-range reliability or history score can push it past 1.0.
pub(crate) fn risk_score(features: &NormalizedFeatures, weights: &FeatureWeights) -> f64 {
    features.amount_risk * weights.amount
        + features.extension_risk * weights.extension
        + features.vendor_risk * weights.vendor
        + features.payment_risk * weights.payment
        + features.cash_flow_risk * weights.cash_flow
        + features.priority_risk * weights.priority
}

/// Mean of the two trust signals, discounted by up to `max_amount_discount` as the invoice grows.
pub(crate) fn confidence_score(factors: &RequestFactors, limits: &NormalizationLimits) -> f64 {
    let base = (factors.vendor_reliability_score + factors.payment_history_score) / 2.0;
    let amount_factor = 1.0
        - (factors.invoice_amount / limits.confidence_amount_scale).min(limits.max_amount_discount);
    base * amount_factor
}

use super::super::domain::Decision;
use super::config::RiskBands;
use super::features::RequestFactors;

/// Inputs available to every narrative observation.
pub(crate) struct ReasoningContext<'a> {
    pub decision: Decision,
    pub confidence: f64,
    pub risk: f64,
    pub factors: &'a RequestFactors,
    pub bands: &'a RiskBands,
}

/// One sentence of the narrative and the condition under which it is emitted.
struct Observation {
    applies: fn(&ReasoningContext<'_>) -> bool,
    render: fn(&ReasoningContext<'_>) -> String,
}

const APPROVED: &[Observation] = &[
    Observation {
        applies: always,
        render: approved_headline,
    },
    Observation {
        applies: always,
        render: acceptable_risk,
    },
    Observation {
        applies: excellent_reliability,
        render: reliability_praise,
    },
    Observation {
        applies: excellent_payment_history,
        render: payment_history_praise,
    },
    Observation {
        applies: low_amount,
        render: low_amount_note,
    },
    Observation {
        applies: short_extension,
        render: short_extension_note,
    },
];

const REJECTED: &[Observation] = &[
    Observation {
        applies: always,
        render: rejected_headline,
    },
    Observation {
        applies: always,
        render: elevated_risk,
    },
    Observation {
        applies: always,
        render: confidence_level,
    },
    Observation {
        applies: concerning_reliability,
        render: reliability_concern,
    },
    Observation {
        applies: weak_payment_history,
        render: payment_history_concern,
    },
    Observation {
        applies: high_amount,
        render: high_amount_warning,
    },
    Observation {
        applies: long_extension,
        render: long_extension_warning,
    },
];

const ESCALATE: &[Observation] = &[
    Observation {
        applies: always,
        render: escalate_headline,
    },
    Observation {
        applies: always,
        render: confidence_and_risk,
    },
    Observation {
        applies: always,
        render: management_approval,
    },
    Observation {
        applies: high_amount,
        render: high_value_transaction,
    },
];

/// Narrative for the decision already made; it never influences classification.
pub(crate) fn explain(context: &ReasoningContext<'_>) -> String {
    observations(context).join(" ")
}

pub(crate) fn observations(context: &ReasoningContext<'_>) -> Vec<String> {
    let table = match context.decision {
        Decision::Approved => APPROVED,
        Decision::Rejected => REJECTED,
        Decision::Escalate => ESCALATE,
    };

    table
        .iter()
        .filter(|observation| (observation.applies)(context))
        .map(|observation| (observation.render)(context))
        .collect()
}

fn always(_: &ReasoningContext<'_>) -> bool {
    true
}

fn excellent_reliability(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.vendor_reliability_score > ctx.bands.excellent_reliability
}

fn excellent_payment_history(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.payment_history_score > ctx.bands.excellent_payment_history
}

fn concerning_reliability(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.vendor_reliability_score < ctx.bands.good_reliability
}

fn weak_payment_history(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.payment_history_score < ctx.bands.good_payment_history
}

fn low_amount(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.invoice_amount < ctx.bands.low_amount
}

fn high_amount(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.invoice_amount > ctx.bands.high_amount
}

fn short_extension(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.requested_extension_days <= ctx.bands.short_extension_days
}

fn long_extension(ctx: &ReasoningContext<'_>) -> bool {
    ctx.factors.requested_extension_days > ctx.bands.long_extension_days
}

fn approved_headline(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Request APPROVED with {}% confidence.",
        percent(ctx.confidence)
    )
}

fn acceptable_risk(ctx: &ReasoningContext<'_>) -> String {
    format!("Risk assessment: {}% (acceptable level).", percent(ctx.risk))
}

fn reliability_praise(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Vendor has excellent reliability ({}%).",
        percent(ctx.factors.vendor_reliability_score)
    )
}

fn payment_history_praise(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Strong payment history ({}%).",
        percent(ctx.factors.payment_history_score)
    )
}

fn low_amount_note(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Amount {} is within low-risk threshold.",
        format_currency(ctx.factors.invoice_amount)
    )
}

fn short_extension_note(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Short extension period ({} days) is reasonable.",
        ctx.factors.requested_extension_days
    )
}

fn rejected_headline(_: &ReasoningContext<'_>) -> String {
    "Request REJECTED due to elevated risk factors.".to_string()
}

fn elevated_risk(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Risk assessment: {}% (above acceptable threshold).",
        percent(ctx.risk)
    )
}

fn confidence_level(ctx: &ReasoningContext<'_>) -> String {
    format!("Confidence level: {}%.", percent(ctx.confidence))
}

fn reliability_concern(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Vendor reliability concerns ({}%).",
        percent(ctx.factors.vendor_reliability_score)
    )
}

fn payment_history_concern(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Payment history needs improvement ({}%).",
        percent(ctx.factors.payment_history_score)
    )
}

fn high_amount_warning(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "High invoice amount: {}.",
        format_currency(ctx.factors.invoice_amount)
    )
}

fn long_extension_warning(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Extended period requested ({} days).",
        ctx.factors.requested_extension_days
    )
}

fn escalate_headline(_: &ReasoningContext<'_>) -> String {
    "Request flagged for ESCALATION to human review.".to_string()
}

fn confidence_and_risk(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "Confidence: {}%, Risk: {}%.",
        percent(ctx.confidence),
        percent(ctx.risk)
    )
}

fn management_approval(_: &ReasoningContext<'_>) -> String {
    "Factors require management approval due to complexity or amount.".to_string()
}

fn high_value_transaction(ctx: &ReasoningContext<'_>) -> String {
    format!(
        "High-value transaction: {}.",
        format_currency(ctx.factors.invoice_amount)
    )
}

fn percent(value: f64) -> String {
    format!("{:.0}", value * 100.0)
}

/// `$12,345.67` style formatting.
pub fn format_currency(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("${sign}{grouped}.{cents}")
}

use crate::infra::{ledger_review_service, parse_date, LedgerReviewService};
use chrono::{Local, NaiveDate};
use clap::Args;
use extension_ai::config::AppConfig;
use extension_ai::error::AppError;
use extension_ai::workflows::extensions::{
    format_currency, AutoProcessSummary, DecisionEngine, DecisionRecord, DecisionResult,
    ExtensionRequest, FieldValue, LedgerStatistics, RequestId, SYSTEM_ACTOR,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct EvaluateArgs {
    /// Identifier echoed in the output
    #[arg(long, default_value = "CLI-REQUEST")]
    pub(crate) request_id: String,
    /// Vendor name echoed in the output
    #[arg(long, default_value = "")]
    pub(crate) vendor: String,
    /// Invoice amount in dollars
    #[arg(long)]
    pub(crate) amount: Option<String>,
    /// Requested extension in days
    #[arg(long)]
    pub(crate) days: Option<String>,
    /// Vendor reliability score between 0 and 1
    #[arg(long)]
    pub(crate) reliability: Option<String>,
    /// Payment history score between 0 and 1
    #[arg(long)]
    pub(crate) history: Option<String>,
    /// Cash flow impact: Low, Medium, or High
    #[arg(long)]
    pub(crate) cash_flow: Option<String>,
    /// Priority: Low, Medium, or High
    #[arg(long)]
    pub(crate) priority: Option<String>,
    /// Print the full decision as JSON instead of the console summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReviewArgs {
    /// Ledger directory (defaults to APP_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Finalize every non-escalated recommendation
    #[arg(long)]
    pub(crate) apply: bool,
    /// Actor recorded in the audit trail when applying
    #[arg(long, default_value = SYSTEM_ACTOR)]
    pub(crate) actor: String,
}

#[derive(Args, Debug)]
pub(crate) struct StatsArgs {
    /// Ledger directory (defaults to APP_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Number of recent decisions to list
    #[arg(long, default_value_t = 5)]
    pub(crate) recent: usize,
}

pub(crate) fn run_evaluate(args: EvaluateArgs, config: &AppConfig) -> Result<(), AppError> {
    let engine = DecisionEngine::new(config.decision_policy()?);

    let print_json = args.json;
    let request = request_from_args(args);
    let result = engine
        .evaluate(&request)
        .map_err(|err| AppError::Review(err.into()))?;

    if print_json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Decision payload unavailable: {err}"),
        }
    } else {
        render_decision(&request, &result);
    }

    Ok(())
}

pub(crate) fn run_review(args: ReviewArgs, config: &AppConfig) -> Result<(), AppError> {
    let service = ledger_review_service(config, args.data_dir)?;

    render_pending(&service)?;

    if args.apply {
        let summary = service.auto_process(&args.actor)?;
        render_auto_process(&summary);
    }

    Ok(())
}

pub(crate) fn run_stats(args: StatsArgs, config: &AppConfig) -> Result<(), AppError> {
    let service = ledger_review_service(config, args.data_dir)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let stats = service.statistics(today)?;
    render_statistics(&stats, today);

    let recent = service.recent_decisions(args.recent)?;
    render_recent(&recent);

    Ok(())
}

fn request_from_args(args: EvaluateArgs) -> ExtensionRequest {
    ExtensionRequest {
        request_id: RequestId(args.request_id),
        vendor_name: args.vendor,
        invoice_amount: args.amount.map(FieldValue::Text),
        requested_extension_days: args.days.map(FieldValue::Text),
        vendor_reliability_score: args.reliability.map(FieldValue::Text),
        payment_history_score: args.history.map(FieldValue::Text),
        cash_flow_impact: args.cash_flow.map(FieldValue::Text),
        priority: args.priority.map(FieldValue::Text),
        ..ExtensionRequest::default()
    }
}

fn render_decision(request: &ExtensionRequest, result: &DecisionResult) {
    println!("Extension decision for {}", request.request_id);
    if !request.vendor_name.is_empty() {
        println!("Vendor: {}", request.vendor_name);
    }
    println!(
        "Decision: {} ({})",
        result.decision,
        result.matched_rule.describe()
    );
    println!(
        "Confidence {:.0}% | Risk {:.0}% | evaluated in {:.3} ms",
        result.confidence_score * 100.0,
        result.risk_score * 100.0,
        result.processing_time.as_secs_f64() * 1000.0
    );
    println!("\nReasoning\n{}", result.reasoning);

    println!("\nFactor breakdown");
    for (kind, detail) in &result.factor_details {
        println!(
            "- {:<20} {:>12} | risk {:.2} x weight {:.2} = {:.3} | {}",
            kind.label(),
            detail.raw_value.to_string(),
            detail.normalized,
            detail.weight,
            detail.contribution,
            detail.assessment.label
        );
    }
    println!(
        "  {:<20} {:>12} | total {:.3}",
        "",
        "",
        result.contribution_total()
    );
}

fn render_pending(service: &LedgerReviewService) -> Result<(), AppError> {
    let pending = service.pending()?;
    if pending.is_empty() {
        println!("Pending queue: empty");
        return Ok(());
    }

    println!("Pending queue ({} requests)", pending.len());
    for request in &pending {
        match service.review(&request.request_id) {
            Ok(review) => {
                let amount = request
                    .invoice_amount
                    .as_ref()
                    .and_then(FieldValue::as_f64)
                    .map(format_currency)
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "- {} {} {} -> {} (confidence {:.0}%, risk {:.0}%)",
                    request.request_id,
                    request.vendor_name,
                    amount,
                    review.result.decision,
                    review.result.confidence_score * 100.0,
                    review.result.risk_score * 100.0
                );
                println!("  {}", review.result.reasoning);
            }
            Err(err) => println!("- {} cannot be evaluated: {}", request.request_id, err),
        }
    }

    Ok(())
}

fn render_auto_process(summary: &AutoProcessSummary) {
    println!("\nApplied {} decisions", summary.finalized.len());
    for record in &summary.finalized {
        println!("- {} {}", record.request_id, record.final_decision.outcome_verb());
    }
    if !summary.escalated.is_empty() {
        println!("Escalated for human review");
        for id in &summary.escalated {
            println!("- {id}");
        }
    }
    if !summary.invalid.is_empty() {
        println!("Left in queue with invalid input");
        for invalid in &summary.invalid {
            println!("- {}: {}", invalid.request_id, invalid.error);
        }
    }
}

fn render_statistics(stats: &LedgerStatistics, today: NaiveDate) {
    println!("Extension ledger statistics ({today})");
    println!(
        "- Pending: {} ({} high priority) worth {}, average {}",
        stats.pending_count,
        stats.high_priority_count,
        format_currency(stats.total_pending_value),
        format_currency(stats.average_pending_amount)
    );
    println!(
        "- Processed: {} total, {} today",
        stats.total_processed, stats.processed_today
    );
    println!(
        "- Outcomes: {} approved | {} rejected | {} escalated | {:.1}% approval rate",
        stats.approved_count, stats.rejected_count, stats.escalated_count, stats.approval_rate
    );
}

fn render_recent(recent: &[DecisionRecord]) {
    if recent.is_empty() {
        println!("\nRecent decisions: none");
        return;
    }

    println!("\nRecent decisions");
    for record in recent {
        let review = if record.human_review {
            "human"
        } else {
            "auto"
        };
        let overridden = if record.overridden() {
            format!(" (AI: {})", record.ai_decision)
        } else {
            String::new()
        };
        println!(
            "- {} {} {}{} [{}] {}",
            record.decision_date,
            record.request_id,
            record.final_decision,
            overridden,
            review,
            record.vendor_name
        );
    }
}

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Decision, ExtensionRequest, FieldValue, ImpactLevel};
use super::repository::DecisionRecord;

/// Aggregate view of the pending queue and decision history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerStatistics {
    pub pending_count: usize,
    pub processed_today: usize,
    pub total_processed: usize,
    pub approved_count: usize,
    pub rejected_count: usize,
    pub escalated_count: usize,
    pub high_priority_count: usize,
    pub average_pending_amount: f64,
    pub total_pending_value: f64,
    /// Percentage of finalized decisions that ended approved.
    pub approval_rate: f64,
}

pub fn summarize(
    pending: &[ExtensionRequest],
    history: &[DecisionRecord],
    today: NaiveDate,
) -> LedgerStatistics {
    let amounts: Vec<f64> = pending
        .iter()
        .filter_map(|request| request.invoice_amount.as_ref().and_then(FieldValue::as_f64))
        .collect();
    let total_pending_value: f64 = amounts.iter().sum();
    let average_pending_amount = if amounts.is_empty() {
        0.0
    } else {
        total_pending_value / amounts.len() as f64
    };

    let high_priority_count = pending
        .iter()
        .filter(|request| {
            matches!(
                &request.priority,
                Some(FieldValue::Text(text)) if ImpactLevel::parse(text.trim()) == Some(ImpactLevel::High)
            )
        })
        .count();

    let count_final = |decision: Decision| {
        history
            .iter()
            .filter(|record| record.final_decision == decision)
            .count()
    };
    let approved_count = count_final(Decision::Approved);
    let rejected_count = count_final(Decision::Rejected);
    let escalated_count = count_final(Decision::Escalate);

    let processed_today = history
        .iter()
        .filter(|record| record.decision_date.date() == today)
        .count();

    let approval_rate = if history.is_empty() {
        0.0
    } else {
        approved_count as f64 / history.len() as f64 * 100.0
    };

    LedgerStatistics {
        pending_count: pending.len(),
        processed_today,
        total_processed: history.len(),
        approved_count,
        rejected_count,
        escalated_count,
        high_priority_count,
        average_pending_amount,
        total_pending_value,
        approval_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::extensions::domain::RequestId;

    fn pending(id: &str, amount: Option<&str>, priority: &str) -> ExtensionRequest {
        ExtensionRequest {
            request_id: RequestId(id.to_string()),
            invoice_amount: amount.map(FieldValue::text),
            priority: Some(FieldValue::text(priority)),
            ..ExtensionRequest::default()
        }
    }

    fn decided(day: u32, final_decision: Decision) -> DecisionRecord {
        DecisionRecord {
            request_id: RequestId(format!("REQ-9{day:02}")),
            decision_date: NaiveDate::from_ymd_opt(2025, 10, day)
                .expect("valid date")
                .and_hms_opt(12, 0, 0)
                .expect("valid time"),
            ai_decision: final_decision,
            confidence_score: 0.8,
            human_review: false,
            final_decision,
            processing_time_seconds: 0.001,
            vendor_name: "Prime Logistics".to_string(),
            invoice_amount: Some(10_000.0),
        }
    }

    #[test]
    fn empty_ledger_reports_zeroes() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 21).expect("valid date");
        let stats = summarize(&[], &[], today);
        assert_eq!(stats.pending_count, 0);
        assert_eq!(stats.average_pending_amount, 0.0);
        assert_eq!(stats.approval_rate, 0.0);
    }

    #[test]
    fn aggregates_queue_and_history() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 21).expect("valid date");
        let queue = vec![
            pending("REQ-1", Some("10000"), "High"),
            pending("REQ-2", Some("30000"), "Low"),
            pending("REQ-3", Some("n/a"), "High"),
        ];
        let history = vec![
            decided(21, Decision::Approved),
            decided(21, Decision::Rejected),
            decided(20, Decision::Approved),
            decided(19, Decision::Escalate),
        ];

        let stats = summarize(&queue, &history, today);

        assert_eq!(stats.pending_count, 3);
        assert_eq!(stats.high_priority_count, 2);
        assert_eq!(stats.total_pending_value, 40_000.0);
        assert_eq!(stats.average_pending_amount, 20_000.0);
        assert_eq!(stats.processed_today, 2);
        assert_eq!(stats.total_processed, 4);
        assert_eq!(stats.approved_count, 2);
        assert_eq!(stats.rejected_count, 1);
        assert_eq!(stats.escalated_count, 1);
        assert_eq!(stats.approval_rate, 50.0);
    }
}

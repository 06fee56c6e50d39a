use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::domain::{ExtensionRequest, FieldValue, RequestId};
use super::repository::{
    AuditEntry, AuditLog, DecisionLog, DecisionRecord, RequestStore, StoreError,
};

pub const REQUESTS_FILE: &str = "invoice_requests.csv";
pub const DECISIONS_FILE: &str = "decisions.csv";
pub const AUDIT_LOG_FILE: &str = "audit_log.csv";

const REQUEST_COLUMNS: [&str; 11] = [
    "request_id",
    "vendor_name",
    "invoice_amount",
    "original_due_date",
    "requested_extension_days",
    "reason",
    "priority",
    "vendor_reliability_score",
    "payment_history_score",
    "cash_flow_impact",
    "submission_date",
];

/// CSV-backed request queue, decision history, and audit trail sharing one data directory.
#[derive(Debug)]
pub struct CsvLedger {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl CsvLedger {
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("ledger lock poisoned".to_string()))
    }

    fn request_rows(&self) -> Result<Vec<RequestRow>, StoreError> {
        read_rows(&self.path(REQUESTS_FILE))
    }
}

impl RequestStore for CsvLedger {
    fn insert(&self, request: ExtensionRequest) -> Result<ExtensionRequest, StoreError> {
        let _guard = self.guard()?;
        let rows = self.request_rows()?;
        if rows.iter().any(|row| row.request_id == request.request_id.0) {
            return Err(StoreError::Conflict);
        }

        append_row(&self.path(REQUESTS_FILE), &RequestRow::from(&request))?;
        Ok(request)
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<ExtensionRequest>, StoreError> {
        let _guard = self.guard()?;
        Ok(self
            .request_rows()?
            .into_iter()
            .find(|row| row.request_id == id.0)
            .map(ExtensionRequest::from))
    }

    fn pending(&self) -> Result<Vec<ExtensionRequest>, StoreError> {
        let _guard = self.guard()?;
        Ok(self
            .request_rows()?
            .into_iter()
            .map(ExtensionRequest::from)
            .collect())
    }

    fn remove(&self, id: &RequestId) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let rows = self.request_rows()?;
        let before = rows.len();
        let remaining: Vec<RequestRow> = rows
            .into_iter()
            .filter(|row| row.request_id != id.0)
            .collect();

        if remaining.len() == before {
            return Err(StoreError::NotFound);
        }

        rewrite_requests(&self.path(REQUESTS_FILE), &remaining)
    }
}

impl DecisionLog for CsvLedger {
    fn append(&self, record: DecisionRecord) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        append_row(&self.path(DECISIONS_FILE), &record)
    }

    fn history(&self) -> Result<Vec<DecisionRecord>, StoreError> {
        let _guard = self.guard()?;
        read_rows(&self.path(DECISIONS_FILE))
    }
}

impl AuditLog for CsvLedger {
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        append_row(&self.path(AUDIT_LOG_FILE), &entry)
    }

    fn entries(&self) -> Result<Vec<AuditEntry>, StoreError> {
        let _guard = self.guard()?;
        read_rows(&self.path(AUDIT_LOG_FILE))
    }
}

/// Missing files read as empty. Rows may be shorter than the header so files written
/// before a column was added stay readable.
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<T>() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Header is written only when the file is new or empty.
fn append_row<T: Serialize>(path: &Path, row: &T) -> Result<(), StoreError> {
    let needs_header = fs::metadata(path)
        .map(|meta| meta.len() == 0)
        .unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}

/// Writes to a sibling temp file and renames it over the original.
fn rewrite_requests(path: &Path, rows: &[RequestRow]) -> Result<(), StoreError> {
    let staging = path.with_extension("csv.tmp");
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&staging)?;
        writer.write_record(REQUEST_COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&staging, path)?;
    Ok(())
}

/// On-disk request layout; every column is text so coercion stays with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RequestRow {
    request_id: String,
    #[serde(default)]
    vendor_name: String,
    #[serde(default)]
    invoice_amount: Option<String>,
    #[serde(default)]
    original_due_date: Option<String>,
    #[serde(default)]
    requested_extension_days: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    vendor_reliability_score: Option<String>,
    #[serde(default)]
    payment_history_score: Option<String>,
    #[serde(default)]
    cash_flow_impact: Option<String>,
    #[serde(default)]
    submission_date: Option<String>,
}

impl From<RequestRow> for ExtensionRequest {
    fn from(row: RequestRow) -> Self {
        Self {
            request_id: RequestId(row.request_id),
            vendor_name: row.vendor_name,
            reason: row.reason.filter(|reason| !reason.is_empty()),
            original_due_date: row.original_due_date.as_deref().and_then(parse_date),
            submission_date: row.submission_date.as_deref().and_then(parse_date),
            invoice_amount: text_field(row.invoice_amount),
            requested_extension_days: text_field(row.requested_extension_days),
            vendor_reliability_score: text_field(row.vendor_reliability_score),
            payment_history_score: text_field(row.payment_history_score),
            cash_flow_impact: text_field(row.cash_flow_impact),
            priority: text_field(row.priority),
        }
    }
}

impl From<&ExtensionRequest> for RequestRow {
    fn from(request: &ExtensionRequest) -> Self {
        let text = |value: &Option<FieldValue>| value.as_ref().map(ToString::to_string);
        let date = |value: &Option<NaiveDate>| value.map(|date| date.format("%Y-%m-%d").to_string());

        Self {
            request_id: request.request_id.0.clone(),
            vendor_name: request.vendor_name.clone(),
            invoice_amount: text(&request.invoice_amount),
            original_due_date: date(&request.original_due_date),
            requested_extension_days: text(&request.requested_extension_days),
            reason: request.reason.clone(),
            priority: text(&request.priority),
            vendor_reliability_score: text(&request.vendor_reliability_score),
            payment_history_score: text(&request.payment_history_score),
            cash_flow_impact: text(&request.cash_flow_impact),
            submission_date: date(&request.submission_date),
        }
    }
}

fn text_field(value: Option<String>) -> Option<FieldValue> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(FieldValue::Text)
}

/// Accepts plain dates and the `YYYY-MM-DD HH:MM:SS` form spreadsheet tools emit.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    use crate::workflows::extensions::domain::Decision;

    fn request(id: &str) -> ExtensionRequest {
        ExtensionRequest {
            request_id: RequestId(id.to_string()),
            vendor_name: "Acme Corp".to_string(),
            reason: Some("Seasonal revenue fluctuation, Q3".to_string()),
            original_due_date: NaiveDate::from_ymd_opt(2025, 11, 3),
            submission_date: NaiveDate::from_ymd_opt(2025, 10, 20),
            invoice_amount: Some(FieldValue::Number(18_250.5)),
            requested_extension_days: Some(FieldValue::text("14")),
            vendor_reliability_score: Some(FieldValue::Number(0.88)),
            payment_history_score: Some(FieldValue::Number(0.9)),
            cash_flow_impact: Some(FieldValue::text("Low")),
            priority: Some(FieldValue::text("Medium")),
        }
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 21)
            .expect("valid date")
            .and_hms_opt(9, 30, 0)
            .expect("valid time")
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        assert!(ledger.pending().expect("pending").is_empty());
        assert!(ledger.history().expect("history").is_empty());
        assert!(ledger.entries().expect("entries").is_empty());
    }

    #[test]
    fn inserted_requests_come_back_as_text_fields() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        ledger.insert(request("REQ-1001")).expect("insert");

        let stored = ledger
            .fetch(&RequestId("REQ-1001".to_string()))
            .expect("fetch")
            .expect("present");
        assert_eq!(stored.invoice_amount, Some(FieldValue::text("18250.5")));
        assert_eq!(stored.reason.as_deref(), Some("Seasonal revenue fluctuation, Q3"));
        assert_eq!(stored.original_due_date, NaiveDate::from_ymd_opt(2025, 11, 3));
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        ledger.insert(request("REQ-1001")).expect("insert");
        let error = ledger
            .insert(request("REQ-1001"))
            .expect_err("duplicate rejected");
        assert!(matches!(error, StoreError::Conflict));
    }

    #[test]
    fn remove_rewrites_queue_and_keeps_header() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        ledger.insert(request("REQ-1001")).expect("insert");
        ledger.insert(request("REQ-1002")).expect("insert");

        ledger
            .remove(&RequestId("REQ-1001".to_string()))
            .expect("remove");
        let pending = ledger.pending().expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].request_id, RequestId("REQ-1002".to_string()));

        ledger
            .remove(&RequestId("REQ-1002".to_string()))
            .expect("remove");
        let contents = fs::read_to_string(dir.path().join(REQUESTS_FILE)).expect("file readable");
        assert!(contents.starts_with("request_id,vendor_name,invoice_amount"));
        assert!(ledger.pending().expect("pending").is_empty());

        let error = ledger
            .remove(&RequestId("REQ-1002".to_string()))
            .expect_err("already removed");
        assert!(matches!(error, StoreError::NotFound));
    }

    #[test]
    fn decisions_and_audit_entries_append() {
        let dir = TempDir::new().expect("temp dir");
        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        let record = DecisionRecord {
            request_id: RequestId("REQ-1001".to_string()),
            decision_date: timestamp(),
            ai_decision: Decision::Escalate,
            confidence_score: 0.62,
            human_review: true,
            final_decision: Decision::Approved,
            processing_time_seconds: 0.0004,
            vendor_name: "Acme Corp".to_string(),
            invoice_amount: Some(61_000.0),
        };
        ledger.append(record.clone()).expect("append");
        ledger.append(record.clone()).expect("append");
        ledger
            .record(AuditEntry {
                timestamp: timestamp(),
                action: "Decision: Approved".to_string(),
                actor: "Finance Manager".to_string(),
                request_id: None,
                details: "manual override".to_string(),
                ip_address: None,
            })
            .expect("audit");

        let history = ledger.history().expect("history");
        assert_eq!(history, vec![record.clone(), record]);
        assert!(history[0].overridden());

        let entries = ledger.entries().expect("entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, "Finance Manager");
        assert!(entries[0].request_id.is_none());
    }

    #[test]
    fn reads_capitalized_booleans_from_older_exports() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(
            dir.path().join(DECISIONS_FILE),
            "request_id,decision_date,ai_decision,confidence_score,human_review,final_decision,processing_time_seconds,vendor_name,invoice_amount\n\
REQ-901,2025-09-01 10:15:00,Approved,0.84,False,Approved,112.4,Prime Logistics,23000.5\n",
        )
        .expect("seed file");

        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        let history = ledger.history().expect("history");
        assert_eq!(history.len(), 1);
        assert!(!history[0].human_review);
        assert_eq!(history[0].invoice_amount, Some(23_000.5));
    }

    #[test]
    fn appends_to_audit_logs_with_address_column() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(
            dir.path().join(AUDIT_LOG_FILE),
            "timestamp,action,user,request_id,details,ip_address\n\
2025-09-01 10:15:00,Decision: Approved,Finance Manager,REQ-901,Reviewed invoice,192.168.1.20\n",
        )
        .expect("seed file");

        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        ledger
            .record(AuditEntry {
                timestamp: timestamp(),
                action: "Decision: Rejected".to_string(),
                actor: "System".to_string(),
                request_id: Some(RequestId("REQ-902".to_string())),
                details: "extension request rejected".to_string(),
                ip_address: None,
            })
            .expect("audit");

        let entries = ledger.entries().expect("entries readable after append");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ip_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(entries[1].request_id, Some(RequestId("REQ-902".to_string())));
        assert!(entries[1].ip_address.is_none());
    }

    #[test]
    fn reads_audit_rows_without_address_column() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(
            dir.path().join(AUDIT_LOG_FILE),
            "timestamp,action,user,request_id,details,ip_address\n\
2025-09-01 10:15:00,Decision: Approved,Finance Manager,REQ-901,Reviewed invoice\n",
        )
        .expect("seed file");

        let ledger = CsvLedger::open(dir.path()).expect("ledger opens");
        let entries = ledger.entries().expect("short rows are readable");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ip_address.is_none());
    }

    #[test]
    fn parse_date_accepts_datetime_suffix() {
        assert_eq!(
            parse_date("2025-10-01 00:00:00"),
            NaiveDate::from_ymd_opt(2025, 10, 1)
        );
        assert_eq!(parse_date("not a date"), None);
    }
}

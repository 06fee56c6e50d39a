use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{Decision, ExtensionRequest, RequestId};

/// Finalized decision as appended to the decision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub request_id: RequestId,
    #[serde(with = "timestamp_format")]
    pub decision_date: NaiveDateTime,
    pub ai_decision: Decision,
    pub confidence_score: f64,
    #[serde(deserialize_with = "lenient_bool")]
    pub human_review: bool,
    pub final_decision: Decision,
    pub processing_time_seconds: f64,
    pub vendor_name: String,
    pub invoice_amount: Option<f64>,
}

impl DecisionRecord {
    pub fn overridden(&self) -> bool {
        self.ai_decision != self.final_decision
    }
}

/// Timestamped action in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub action: String,
    #[serde(rename = "user")]
    pub actor: String,
    pub request_id: Option<RequestId>,
    pub details: String,
    /// Client address when the action arrived over the network.
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// Queue of pending requests awaiting a decision.
pub trait RequestStore: Send + Sync {
    fn insert(&self, request: ExtensionRequest) -> Result<ExtensionRequest, StoreError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<ExtensionRequest>, StoreError>;
    fn pending(&self) -> Result<Vec<ExtensionRequest>, StoreError>;
    fn remove(&self, id: &RequestId) -> Result<(), StoreError>;
}

/// Append-only history of finalized decisions.
pub trait DecisionLog: Send + Sync {
    fn append(&self, record: DecisionRecord) -> Result<(), StoreError>;
    fn history(&self) -> Result<Vec<DecisionRecord>, StoreError>;
}

/// Append-only trail of reviewer and system actions.
pub trait AuditLog: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError>;
    fn entries(&self) -> Result<Vec<AuditEntry>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request already exists")]
    Conflict,
    #[error("request not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepts `true`/`false` in any case; older exports wrote `True`/`False`.
fn lenient_bool<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    let raw = match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => return Ok(value),
        Flag::Text(text) => text,
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, found {other:?}"
        ))),
    }
}

pub(crate) mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub(crate) fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

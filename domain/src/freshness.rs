use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// §C.2 supplement — latest timestamp per source table, backing
/// `GET /data-freshness`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct DataFreshnessReport {
    pub latest_by_source: HashMap<String, DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct UploadHistoryEntry {
    pub source: String,
    pub uploaded_at: DateTime<Utc>,
    pub row_count: i64,
    pub note: Option<String>,
}

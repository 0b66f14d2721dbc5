use serde::{Deserialize, Serialize};

/// One stored event log. Every field is optional and nothing is enforced on
/// insert, so a record mirrors exactly what the node returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogRecord {
    pub address: Option<String>,
    pub block_hash: Option<String>,
    pub data: Option<String>,
    pub removed: Option<bool>,
    pub topics: Option<Vec<String>>,
    pub transaction_hash: Option<String>,
}

/// A page of stored records plus the totals observed by the same request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPage {
    pub items: Vec<EventLogRecord>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
}

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::datasets::logs::{EventLogRecord, LogPage};
use crate::models::errors::PersistenceError;

/// Append-and-page repository over the stored event logs.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Inserts every record as a new entry, in order. Not transactional: on
    /// failure a prefix of `records` may already be stored.
    async fn append_all(&self, records: Vec<EventLogRecord>) -> Result<(), PersistenceError>;

    /// Returns page `page_number` (1-based) of `per_page` records in insertion order.
    async fn page(&self, page_number: u64, per_page: u64) -> Result<LogPage, PersistenceError>;
}

/// Offset of the first record on `page_number` (1-based). Page 0 is treated as page 1.
pub fn page_offset(page_number: u64, per_page: u64) -> u64 {
    page_number.saturating_sub(1).saturating_mul(per_page)
}

pub fn total_pages(total_count: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total_count.div_ceil(per_page)
}

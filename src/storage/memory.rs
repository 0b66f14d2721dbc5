use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::datasets::logs::{EventLogRecord, LogPage};
use crate::models::errors::PersistenceError;
use crate::storage::{LogStore, page_offset, total_pages};

/// Process-local store, used in tests.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    records: RwLock<Vec<EventLogRecord>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn append_all(&self, records: Vec<EventLogRecord>) -> Result<(), PersistenceError> {
        self.records.write().await.extend(records);
        Ok(())
    }

    async fn page(&self, page_number: u64, per_page: u64) -> Result<LogPage, PersistenceError> {
        let records = self.records.read().await;
        let total_count = records.len() as u64;

        let offset = usize::try_from(page_offset(page_number, per_page)).unwrap_or(usize::MAX);
        let limit = usize::try_from(per_page).unwrap_or(usize::MAX);
        let items = records.iter().skip(offset).take(limit).cloned().collect();

        Ok(LogPage {
            items,
            current_page: page_number,
            total_pages: total_pages(total_count, per_page),
            total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(n: u8) -> EventLogRecord {
        EventLogRecord {
            data: Some(format!("0x{:02x}", n)),
            removed: Some(false),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_append_then_page_returns_insertion_order() {
        let store = MemoryLogStore::new();
        let records: Vec<_> = (0..5).map(record).collect();
        store.append_all(records.clone()).await.unwrap();

        let page = store.page(1, 10).await.unwrap();
        assert_eq!(page.items, records);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let store = MemoryLogStore::new();
        store.append_all(vec![record(1)]).await.unwrap();
        store.append_all(vec![record(1)]).await.unwrap();

        let page = store.page(1, 10).await.unwrap();
        assert_eq!(page.items, vec![record(1), record(1)]);
    }

    #[tokio::test]
    async fn test_middle_and_past_end_pages() {
        let store = MemoryLogStore::new();
        store
            .append_all((0..25).map(record).collect())
            .await
            .unwrap();

        let page = store.page(3, 10).await.unwrap();
        assert_eq!(page.items, (20..25).map(record).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);

        let page = store.page(4, 10).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 4);

        let page = store.page(u64::MAX, u64::MAX).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_store_the_union() {
        let store = Arc::new(MemoryLogStore::new());
        let first: Vec<_> = (0..50).map(record).collect();
        let second: Vec<_> = (25..75).map(record).collect();

        let (a, b) = tokio::join!(
            {
                let store = store.clone();
                let first = first.clone();
                async move { store.append_all(first).await }
            },
            {
                let store = store.clone();
                let second = second.clone();
                async move { store.append_all(second).await }
            }
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(store.len().await, 100);
        let page = store.page(1, 100).await.unwrap();
        for r in first.iter().chain(second.iter()) {
            assert!(page.items.contains(r));
        }
    }
}

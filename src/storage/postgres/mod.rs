mod schema;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::KeyValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error, info};

use crate::metrics::Metrics;
use crate::models::common::DatabaseConfig;
use crate::models::datasets::logs::{EventLogRecord, LogPage};
use crate::models::errors::PersistenceError;
use crate::storage::postgres::schema::{LOG_COLUMNS, LOGS_TABLE, log_table_ddl};
use crate::storage::{LogStore, page_offset, total_pages};

// Postgres caps bind parameters at 65535 per statement; 6 per row.
const INSERT_CHUNK_SIZE: usize = 5_000;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(sqlx::FromRow)]
struct LogRow {
    address: Option<String>,
    block_hash: Option<String>,
    data: Option<String>,
    removed: Option<bool>,
    topics: Option<Vec<String>>,
    transaction_hash: Option<String>,
}

impl From<LogRow> for EventLogRecord {
    fn from(row: LogRow) -> Self {
        Self {
            address: row.address,
            block_hash: row.block_hash,
            data: row.data,
            removed: row.removed,
            topics: row.topics,
            transaction_hash: row.transaction_hash,
        }
    }
}

#[derive(Clone)]
pub struct PostgresLogStore {
    pool: PgPool,
    metrics: Option<Arc<Metrics>>,
}

impl PostgresLogStore {
    pub fn new(pool: PgPool, metrics: Option<Arc<Metrics>>) -> Self {
        Self { pool, metrics }
    }

    pub async fn connect(
        config: &DatabaseConfig,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self, PersistenceError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| PersistenceError::Unavailable("database URL not configured".into()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(PersistenceError::Connect)?;

        info!("Connected to database");
        Ok(Self::new(pool, metrics))
    }

    /// Creates the log table if it does not exist yet.
    pub async fn create_table(&self) -> Result<(), PersistenceError> {
        let ddl = log_table_ddl();
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|source| PersistenceError::Query {
                operation: "create table",
                source,
            })?;

        info!("Table '{}' is ready", LOGS_TABLE);
        Ok(())
    }

    fn record_error(&self) {
        if let Some(metrics) = &self.metrics {
            metrics
                .store_errors
                .add(1, &[KeyValue::new("contract", metrics.contract.clone())]);
        }
    }
}

#[async_trait]
impl LogStore for PostgresLogStore {
    async fn append_all(&self, records: Vec<EventLogRecord>) -> Result<(), PersistenceError> {
        if records.is_empty() {
            debug!("No logs to insert");
            return Ok(());
        }

        for chunk in records.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                LOGS_TABLE,
                LOG_COLUMNS.join(", ")
            ));
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.address.clone())
                    .push_bind(record.block_hash.clone())
                    .push_bind(record.data.clone())
                    .push_bind(record.removed)
                    .push_bind(record.topics.clone())
                    .push_bind(record.transaction_hash.clone());
            });

            if let Err(source) = builder.build().execute(&self.pool).await {
                error!("Failed to insert batch of {} logs: {}", chunk.len(), source);
                self.record_error();
                return Err(PersistenceError::Query {
                    operation: "insert",
                    source,
                });
            }

            if let Some(metrics) = &self.metrics {
                metrics.logs_stored.add(
                    chunk.len() as u64,
                    &[KeyValue::new("contract", metrics.contract.clone())],
                );
            }
        }

        Ok(())
    }

    async fn page(&self, page_number: u64, per_page: u64) -> Result<LogPage, PersistenceError> {
        let count_query = format!("SELECT COUNT(*) FROM {LOGS_TABLE}");
        let total_count: i64 = sqlx::query_scalar(&count_query)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| {
                self.record_error();
                PersistenceError::Query {
                    operation: "count",
                    source,
                }
            })?;
        let total_count = u64::try_from(total_count).unwrap_or_default();

        let limit = i64::try_from(per_page).unwrap_or(i64::MAX);
        let offset = i64::try_from(page_offset(page_number, per_page)).unwrap_or(i64::MAX);

        let select_query = format!(
            "SELECT {} FROM {} ORDER BY id LIMIT $1 OFFSET $2",
            LOG_COLUMNS.join(", "),
            LOGS_TABLE
        );
        let rows = sqlx::query_as::<_, LogRow>(&select_query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| {
                self.record_error();
                PersistenceError::Query {
                    operation: "select",
                    source,
                }
            })?;

        Ok(LogPage {
            items: rows.into_iter().map(EventLogRecord::from).collect(),
            current_page: page_number,
            total_pages: total_pages(total_count, per_page),
            total_count,
        })
    }
}

pub const LOGS_TABLE: &str = "ethereum_event_logs";

// `id` only provides insertion order; records themselves carry no key.
pub fn log_table_ddl() -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {LOGS_TABLE} (
            id BIGSERIAL PRIMARY KEY,
            address TEXT,
            block_hash TEXT,
            data TEXT,
            removed BOOLEAN,
            topics TEXT[],
            transaction_hash TEXT,
            inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#
    )
}

pub const LOG_COLUMNS: [&str; 6] = [
    "address",
    "block_hash",
    "data",
    "removed",
    "topics",
    "transaction_hash",
];

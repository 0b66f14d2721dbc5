use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid contract address '{address}': {reason}")]
    InvalidContractAddress { address: String, reason: String },
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },
    #[error("Missing database URL: set DATABASE_URL or database.url")]
    MissingDatabaseUrl,
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failure while querying the chain node for logs.
#[derive(Error, Debug)]
pub enum RemoteFetchError {
    #[error("eth_getLogs for blocks {from_block}-{to_block} failed: {message}")]
    Rpc {
        from_block: u64,
        to_block: u64,
        message: String,
    },
    #[error("eth_getLogs for blocks {from_block}-{to_block} timed out after {timeout_secs}s")]
    Timeout {
        from_block: u64,
        to_block: u64,
        timeout_secs: u64,
    },
}

/// Failure while reading from or writing to the log store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("Database {operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// Errors surfaced at the HTTP boundary. `Read` covers the paging endpoint,
// `Fetch` and `Persistence` the sync endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid block numbers")]
    InvalidBlockNumbers,
    #[error("Failed to read logs: {0}")]
    Read(#[source] PersistenceError),
    #[error(transparent)]
    Fetch(#[from] RemoteFetchError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

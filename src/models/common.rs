use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_PORT: u16 = 3001;
pub const DEFAULT_RPC_URL: &str = "https://mainnet.infura.io/v3/";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_METRICS_PORT: u16 = 9100;

// Tether USD on Ethereum mainnet
pub const USDT_CONTRACT_ADDRESS: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
pub const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub address: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_url")]
    pub url: String,
    // Appended to `url` as the last path segment (Infura style)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    #[serde(default = "default_contract_address")]
    pub address: String,
    #[serde(default = "default_event_signature")]
    pub event_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub address: String,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_bind_address(),
            port: default_server_port(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            api_key: None,
            request_timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: default_contract_address(),
            event_signature: default_event_signature(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_db_max_connections(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_bind_address(),
            port: default_metrics_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}

fn default_contract_address() -> String {
    USDT_CONTRACT_ADDRESS.to_string()
}

fn default_event_signature() -> String {
    TRANSFER_EVENT_SIGNATURE.to_string()
}

fn default_db_max_connections() -> u32 {
    DEFAULT_DB_MAX_CONNECTIONS
}

fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

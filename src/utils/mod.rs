use std::{env, path::Path};

use tracing::info;
use url::Url;

use crate::indexer::TransferFilter;
use crate::models::common::{Config, RpcConfig};
use crate::models::errors::ConfigError;

const ENV_PREFIX: &str = "INDEXER";

/// Loads `config.yml` (if present), layers `INDEXER_*` environment overrides
/// and the conventional `DATABASE_URL` / `INFURA_API_KEY` / `PORT` variables
/// on top, and validates the result.
pub fn load_config<P: AsRef<Path>>(file_name: P) -> Result<Config, ConfigError> {
    let config_path = file_name.as_ref();
    info!("Config path: {}", config_path.to_string_lossy());

    let settings = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", env::var("DATABASE_URL").ok())?
        .set_override_option("rpc.api_key", env::var("INFURA_API_KEY").ok())?
        .set_override_option("server.port", env::var("PORT").ok())?
        .build()?;

    let config: Config = settings.try_deserialize()?;
    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Parses the contract address and hashes the event signature
    TransferFilter::from_config(&config.contract)?;

    rpc_url(&config.rpc)?;

    match config.database.url.as_deref() {
        Some(url) if !url.trim().is_empty() => {}
        _ => return Err(ConfigError::MissingDatabaseUrl),
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::InvalidValue {
            field: "database.max_connections".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if config.rpc.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "rpc.request_timeout_secs".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Full RPC endpoint, with the API key appended as the last path segment.
pub fn rpc_url(rpc: &RpcConfig) -> Result<Url, ConfigError> {
    let raw = match rpc.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            format!("{}/{}", rpc.url.trim_end_matches('/'), key)
        }
        _ => rpc.url.clone(),
    };

    Url::parse(&raw).map_err(|e| ConfigError::InvalidRpcUrl {
        url: rpc.url.clone(),
        reason: e.to_string(),
    })
}

// Keeps API keys out of the logs
pub fn redact_rpc_url(rpc: &RpcConfig) -> String {
    match rpc.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            format!("{}/<redacted>", rpc.url.trim_end_matches('/'))
        }
        _ => rpc.url.clone(),
    }
}

pub fn strip_html(error: &str) -> String {
    // If the error contains HTML tags, extract just the text content
    if error.contains("<!doctype html>") || error.contains("<html>") {
        error
            .lines()
            .map(|line| line.trim())
            .find(|line| {
                !line.starts_with('<')
                    && !line.ends_with('>')
                    && !line.is_empty()
                    && *line != "html"
                    && *line != "body"
            })
            .unwrap_or(error)
            .to_string()
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::USDT_CONTRACT_ADDRESS;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.database.url = Some("postgres://localhost/indexer".to_string());
        config
    }

    #[test]
    fn test_default_config_with_database_is_valid() {
        assert!(validate_config(&valid_config()).is_ok());
        assert_eq!(valid_config().contract.address, USDT_CONTRACT_ADDRESS);
    }

    #[test]
    fn test_rejects_malformed_contract_address() {
        let mut config = valid_config();
        // 41 hex characters
        config.contract.address = "0xdac17f958d2ee523a2206206994597c13d831ec7a".to_string();

        match validate_config(&config) {
            Err(ConfigError::InvalidContractAddress { address, .. }) => {
                assert_eq!(address, config.contract.address);
            }
            other => panic!("expected invalid contract address, got {:?}", other),
        }
    }

    #[test]
    fn test_requires_database_url() {
        let mut config = valid_config();
        config.database.url = None;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingDatabaseUrl)
        ));

        config.database.url = Some("  ".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = valid_config();
        config.rpc.request_timeout_secs = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rpc_url_appends_api_key() {
        let rpc = RpcConfig {
            url: "https://mainnet.infura.io/v3/".to_string(),
            api_key: Some("abc123".to_string()),
            request_timeout_secs: 30,
        };

        assert_eq!(
            rpc_url(&rpc).unwrap().as_str(),
            "https://mainnet.infura.io/v3/abc123"
        );
        assert_eq!(
            redact_rpc_url(&rpc),
            "https://mainnet.infura.io/v3/<redacted>"
        );
    }

    #[test]
    fn test_rpc_url_without_api_key() {
        let rpc = RpcConfig {
            url: "http://localhost:8545".to_string(),
            api_key: None,
            request_timeout_secs: 30,
        };

        assert_eq!(rpc_url(&rpc).unwrap().as_str(), "http://localhost:8545/");
        assert_eq!(redact_rpc_url(&rpc), "http://localhost:8545");
    }

    #[test]
    fn test_rpc_url_rejects_garbage() {
        let rpc = RpcConfig {
            url: "not a url".to_string(),
            api_key: None,
            request_timeout_secs: 30,
        };

        assert!(matches!(
            rpc_url(&rpc),
            Err(ConfigError::InvalidRpcUrl { .. })
        ));
    }

    #[test]
    fn test_strip_html() {
        let html = "<!doctype html>\n<html>\n<body>\n429 Too Many Requests\n</body>\n</html>";
        assert_eq!(strip_html(html), "429 Too Many Requests");
        assert_eq!(strip_html("plain error"), "plain error");
    }
}

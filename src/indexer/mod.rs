pub mod rpc;

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, keccak256};
use alloy_provider::{DynProvider, Provider};
use alloy_rpc_types_eth::Filter;
use async_trait::async_trait;
use opentelemetry::KeyValue;
use tracing::{info, warn};

use crate::indexer::rpc::logs::LogParser;
use crate::metrics::Metrics;
use crate::models::common::ContractConfig;
use crate::models::datasets::logs::EventLogRecord;
use crate::models::errors::{ConfigError, RemoteFetchError};
use crate::utils::strip_html;

/// Contract address and event topic every log query is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFilter {
    pub address: Address,
    pub topic0: B256,
}

impl TransferFilter {
    pub fn new(address: Address, event_signature: &str) -> Self {
        Self {
            address,
            topic0: keccak256(event_signature.as_bytes()),
        }
    }

    pub fn from_config(contract: &ContractConfig) -> Result<Self, ConfigError> {
        let address = Address::from_str(contract.address.trim()).map_err(|e| {
            ConfigError::InvalidContractAddress {
                address: contract.address.clone(),
                reason: e.to_string(),
            }
        })?;

        if contract.event_signature.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "contract.event_signature".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self::new(address, contract.event_signature.trim()))
    }

    /// `eth_getLogs` filter for the inclusive range `[from_block, to_block]`.
    pub fn block_range(&self, from_block: u64, to_block: u64) -> Filter {
        Filter::new()
            .address(self.address)
            .event_signature(self.topic0)
            .from_block(BlockNumberOrTag::Number(from_block))
            .to_block(BlockNumberOrTag::Number(to_block))
    }
}

#[async_trait]
pub trait LogFetcher: Send + Sync {
    /// Returns the matching logs in the order the node sent them.
    async fn fetch(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<EventLogRecord>, RemoteFetchError>;
}

pub struct RpcLogFetcher {
    provider: DynProvider,
    filter: TransferFilter,
    request_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl RpcLogFetcher {
    pub fn new(
        provider: DynProvider,
        filter: TransferFilter,
        request_timeout: Duration,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            provider,
            filter,
            request_timeout,
            metrics,
        }
    }

    fn record_request(&self, start: Instant, failed: bool) {
        let Some(metrics) = &self.metrics else {
            return;
        };

        let labels = [
            KeyValue::new("contract", metrics.contract.clone()),
            KeyValue::new("method", "eth_getLogs"),
        ];
        metrics.rpc_requests.add(1, &labels);
        metrics
            .rpc_latency
            .record(start.elapsed().as_secs_f64(), &labels);
        if failed {
            metrics.rpc_errors.add(1, &labels);
        }
    }
}

#[async_trait]
impl LogFetcher for RpcLogFetcher {
    async fn fetch(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<EventLogRecord>, RemoteFetchError> {
        let filter = self.filter.block_range(from_block, to_block);

        info!(
            "Fetching logs from block {} to {} for address {}",
            from_block, to_block, self.filter.address
        );

        let start = Instant::now();
        let result =
            tokio::time::timeout(self.request_timeout, self.provider.get_logs(&filter)).await;

        let logs = match result {
            Ok(Ok(logs)) => {
                self.record_request(start, false);
                logs
            }
            Ok(Err(e)) => {
                self.record_request(start, true);
                let message = strip_html(&e.to_string());
                warn!(
                    "Failed to fetch logs for blocks {}-{}. Error details:\n{}",
                    from_block, to_block, message
                );
                return Err(RemoteFetchError::Rpc {
                    from_block,
                    to_block,
                    message,
                });
            }
            Err(_) => {
                self.record_request(start, true);
                warn!(
                    "Timed out fetching logs for blocks {}-{} after {:?}",
                    from_block, to_block, self.request_timeout
                );
                return Err(RemoteFetchError::Timeout {
                    from_block,
                    to_block,
                    timeout_secs: self.request_timeout.as_secs(),
                });
            }
        };

        info!("Fetched {} log(s)", logs.len());

        if let Some(metrics) = &self.metrics {
            metrics.logs_fetched.add(
                logs.len() as u64,
                &[KeyValue::new("contract", metrics.contract.clone())],
            );
        }

        Ok(logs.parse_event_logs())
    }
}

use alloy_rpc_types_eth::Log;

use crate::models::datasets::logs::EventLogRecord;

pub trait LogParser {
    fn parse_event_logs(self) -> Vec<EventLogRecord>;
}

impl LogParser for Vec<Log> {
    // Keeps node order. Hex fields are rendered the way the node sends them
    // (0x-prefixed); the address uses its checksummed form.
    fn parse_event_logs(self) -> Vec<EventLogRecord> {
        self.into_iter()
            .map(|log| EventLogRecord {
                address: Some(log.inner.address.to_checksum(None)),
                block_hash: log.block_hash.map(|hash| hash.to_string()),
                data: Some(log.inner.data.data.to_string()),
                removed: Some(log.removed),
                topics: Some(
                    log.inner
                        .data
                        .topics()
                        .iter()
                        .map(|topic| topic.to_string())
                        .collect(),
                ),
                transaction_hash: log.transaction_hash.map(|hash| hash.to_string()),
            })
            .collect()
    }
}

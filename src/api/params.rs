use std::collections::HashMap;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

// Query values are kept as raw strings so that a bad value never fails
// extraction; interpretation happens here.
#[derive(Debug, Default)]
pub struct PageParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Default)]
pub struct SyncParams {
    pub from_block: Option<String>,
    pub to_block: Option<String>,
}

impl PageParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            page: query.get("page").cloned(),
            per_page: query.get("perPage").cloned(),
        }
    }

    /// `(page, per_page)`, each falling back to its default when missing,
    /// unparsable, or below 1.
    pub fn normalize(&self) -> (u64, u64) {
        (
            positive_or(self.page.as_deref(), DEFAULT_PAGE),
            positive_or(self.per_page.as_deref(), DEFAULT_PER_PAGE),
        )
    }
}

impl SyncParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            from_block: query.get("fromBlock").cloned(),
            to_block: query.get("toBlock").cloned(),
        }
    }

    /// `None` unless both bounds are valid block numbers.
    pub fn block_range(&self) -> Option<(u64, u64)> {
        let from_block = parse_block_number(self.from_block.as_deref()?)?;
        let to_block = parse_block_number(self.to_block.as_deref()?)?;
        Some((from_block, to_block))
    }
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value >= 1)
        .unwrap_or(default)
}

// Decimal, or 0x-prefixed hex as used in JSON-RPC
fn parse_block_number(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse::<u64>().ok(),
    }
}

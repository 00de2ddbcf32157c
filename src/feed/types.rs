use alloy::primitives::U256;
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const WEI_DECIMALS: u32 = 18;
pub const GWEI_DECIMALS: u32 = 9;

/// A normalized transaction, ready for scoring.
///
/// Addresses are lower-cased at construction; value and gas fields keep full
/// precision and are only converted to floats for display.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub hash: String,
    pub block_number: u64,
    pub from: String,
    pub to: String,
    pub value_wei: BigDecimal,
    pub gas_price: BigDecimal,
    pub gas_used: BigDecimal,
    pub gas_limit: BigDecimal,
    pub timestamp: i64,
    pub is_error: bool,
    pub input_data: String,
    pub contract_address_created: Option<String>,
}

impl Transaction {
    /// First 4 bytes of call data as `0x`-prefixed lower-case hex.
    /// Returns `None` for plain transfers or call data that is not hex.
    pub fn method_selector(&self) -> Option<String> {
        let body = self.input_data.strip_prefix("0x")?;
        let bytes = hex::decode(body.get(..8)?).ok()?;
        Some(format!("0x{}", hex::encode(bytes)))
    }

    /// Call data length in hex characters, excluding the `0x` prefix.
    pub fn input_len(&self) -> usize {
        self.input_data
            .strip_prefix("0x")
            .unwrap_or(&self.input_data)
            .len()
    }

    pub fn is_outgoing(&self, subject: &str) -> bool {
        self.from.eq_ignore_ascii_case(subject)
    }

    /// The other side of the transaction relative to `subject`.
    /// Falls back to the recipient when the subject is on neither side.
    pub fn counterparty(&self, subject: &str) -> &str {
        if self.is_outgoing(subject) {
            &self.to
        } else if self.to.eq_ignore_ascii_case(subject) {
            &self.from
        } else {
            &self.to
        }
    }

    pub fn value_eth(&self) -> f64 {
        raw_to_human(&self.value_wei, WEI_DECIMALS)
    }

    pub fn gas_price_gwei(&self) -> f64 {
        raw_to_human(&self.gas_price, GWEI_DECIMALS)
    }

    pub fn has_gas_price(&self) -> bool {
        self.gas_price > BigDecimal::from(0)
    }
}

/// Explorer-shaped transaction record (Etherscan `txlist` field names).
/// Every field is a string as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    pub is_error: String,
    pub input: String,
    pub contract_address: String,
    pub gas_used: String,
}

impl RawTransaction {
    /// Convert into a [`Transaction`]. Unparseable numeric fields become zero
    /// and are logged; a bad timestamp becomes 0, which time-based
    /// extractors skip.
    pub fn normalize(&self) -> Transaction {
        let quantity = |field: &str, raw: &str| -> BigDecimal {
            match parse_quantity(raw) {
                Some(v) => v,
                None => {
                    if !raw.trim().is_empty() {
                        tracing::warn!(
                            tx_hash = %self.hash,
                            field,
                            raw,
                            "Malformed numeric field, treating as zero"
                        );
                    }
                    BigDecimal::from(0)
                }
            }
        };

        let timestamp = match self.time_stamp.trim().parse::<i64>() {
            Ok(ts) if ts > 0 => ts,
            _ => {
                tracing::warn!(
                    tx_hash = %self.hash,
                    raw = %self.time_stamp,
                    "Malformed timestamp, excluded from timing analysis"
                );
                0
            }
        };

        let created = self.contract_address.trim().to_ascii_lowercase();

        Transaction {
            hash: self.hash.trim().to_string(),
            block_number: self.block_number.trim().parse().unwrap_or(0),
            from: self.from.trim().to_ascii_lowercase(),
            to: self.to.trim().to_ascii_lowercase(),
            value_wei: quantity("value", &self.value),
            gas_price: quantity("gasPrice", &self.gas_price),
            gas_used: quantity("gasUsed", &self.gas_used),
            gas_limit: quantity("gas", &self.gas),
            timestamp,
            is_error: self.is_error.trim() == "1",
            input_data: self.input.trim().to_ascii_lowercase(),
            contract_address_created: (!created.is_empty()).then_some(created),
        }
    }
}

/// Parse a non-negative integer quantity, decimal or `0x` hex.
pub fn parse_quantity(raw: &str) -> Option<BigDecimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if digits.is_empty() {
            return Some(BigDecimal::from(0));
        }
        let value = U256::from_str_radix(digits, 16).ok()?;
        return BigDecimal::from_str(&value.to_string()).ok();
    }

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigDecimal::from_str(raw).ok()
}

/// Convert a raw integer amount to human-readable units.
pub fn raw_to_human(amount: &BigDecimal, decimals: u32) -> f64 {
    let divisor = BigDecimal::from(10u64.pow(decimals));
    let result = amount / &divisor;
    result.to_f64().unwrap_or(0.0)
}

/// Convert an ETH amount (as configured) to wei for exact comparisons.
pub fn eth_to_wei(eth: f64) -> BigDecimal {
    let eth = BigDecimal::from_f64(eth).unwrap_or_default();
    eth * BigDecimal::from(10u64.pow(WEI_DECIMALS))
}

/// Stable sort, newest first. Transactions sharing a timestamp keep feed order.
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

pub mod engine;
pub mod gas;
pub mod realtime;
pub mod recommend;
pub mod rules;
pub mod stats;
pub mod types;

pub use engine::RiskEngine;
pub use types::{BehavioralFlag, FlagType, RiskAnalysisResult, RiskTier, StatisticalScores};

#[cfg(test)]
pub(crate) mod test_support {
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    use crate::feed::types::eth_to_wei;
    use crate::feed::Transaction;

    pub const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
    pub const BOB: &str = "0xb0b0000000000000000000000000000000000002";
    pub const CAROL: &str = "0xca40100000000000000000000000000000000003";
    pub const DAVE: &str = "0xda7e000000000000000000000000000000000004";

    pub struct TxBuilder(Transaction);

    pub fn tx(from: &str, to: &str) -> TxBuilder {
        TxBuilder(Transaction {
            hash: "0xabc0000000000000000000000000000000000000000000000000000000000000".to_string(),
            block_number: 1,
            from: from.to_ascii_lowercase(),
            to: to.to_ascii_lowercase(),
            value_wei: BigDecimal::from(0),
            gas_price: BigDecimal::from(0),
            gas_used: BigDecimal::from(21_000),
            gas_limit: BigDecimal::from(21_000),
            timestamp: 1_600_000_000,
            is_error: false,
            input_data: "0x".to_string(),
            contract_address_created: None,
        })
    }

    impl TxBuilder {
        pub fn hash(mut self, hash: &str) -> Self {
            self.0.hash = hash.to_string();
            self
        }

        pub fn timestamp(mut self, ts: i64) -> Self {
            self.0.timestamp = ts;
            self
        }

        pub fn value_eth(mut self, eth: f64) -> Self {
            self.0.value_wei = eth_to_wei(eth);
            self
        }

        pub fn value_wei(mut self, wei: &str) -> Self {
            self.0.value_wei = BigDecimal::from_str(wei).unwrap();
            self
        }

        pub fn gas_price(mut self, wei: u64) -> Self {
            self.0.gas_price = BigDecimal::from(wei);
            self
        }

        pub fn input(mut self, input: &str) -> Self {
            self.0.input_data = input.to_ascii_lowercase();
            self
        }

        pub fn failed(mut self) -> Self {
            self.0.is_error = true;
            self
        }

        pub fn created(mut self, contract: &str) -> Self {
            self.0.contract_address_created = Some(contract.to_ascii_lowercase());
            self
        }

        pub fn build(self) -> Transaction {
            self.0
        }
    }
}

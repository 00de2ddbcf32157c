#![allow(dead_code)]

use bigdecimal::BigDecimal;
use std::collections::VecDeque;
use std::sync::Mutex;

use wallet_risk_engine::feed::types::eth_to_wei;
use wallet_risk_engine::feed::{FeedError, Transaction, TransactionFeed};

pub const SUBJECT: &str = "0x5eb7ec7000000000000000000000000000000001";
pub const PEER: &str = "0x9ee9000000000000000000000000000000000002";
pub const HACKER: &str = "0x098b716b8aaf21512996dc57eb0615e2383e2f96";
pub const MIXER: &str = "0x722122df12d4e14e13ac3b6895a86e84145b6967";

pub fn transfer(hash: &str, from: &str, to: &str, timestamp: i64, value_eth: f64) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        block_number: 1,
        from: from.to_string(),
        to: to.to_string(),
        value_wei: eth_to_wei(value_eth),
        gas_price: BigDecimal::from(20_000_000_000u64),
        gas_used: BigDecimal::from(21_000),
        gas_limit: BigDecimal::from(21_000),
        timestamp,
        is_error: false,
        input_data: "0x".to_string(),
        contract_address_created: None,
    }
}

/// Returns one scripted response per call; repeats the last one when exhausted.
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<Vec<Transaction>, FeedError>>>,
    last: Mutex<Option<Vec<Transaction>>>,
}

impl ScriptedFeed {
    pub fn new(responses: Vec<Result<Vec<Transaction>, FeedError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(None),
        }
    }

    pub fn fixed(transactions: Vec<Transaction>) -> Self {
        Self::new(vec![Ok(transactions)])
    }

    pub fn failing(error: FeedError) -> Self {
        Self::new(vec![Err(error)])
    }

    fn next(&self) -> Result<Vec<Transaction>, FeedError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(txs)) => {
                *self.last.lock().unwrap() = Some(txs.clone());
                Ok(txs)
            }
            Some(Err(e)) => Err(e),
            None => match self.last.lock().unwrap().clone() {
                Some(txs) => Ok(txs),
                None => Err(FeedError::Unavailable("script exhausted".to_string())),
            },
        }
    }
}

impl TransactionFeed for ScriptedFeed {
    async fn fetch(&self, _address: &str) -> Result<Vec<Transaction>, FeedError> {
        self.next()
    }
}

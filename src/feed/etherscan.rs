use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::FeedConfig;

use super::error::FeedError;
use super::types::{RawTransaction, Transaction};
use super::TransactionFeed;

/// `txlist` response envelope. `result` is an array on success and a
/// message string on failure.
#[derive(Debug, Deserialize)]
pub struct TxListResponse {
    pub status: String,
    pub message: String,
    pub result: serde_json::Value,
}

impl TxListResponse {
    /// Interpret the envelope. "No transactions found" is an empty history, not a failure.
    pub fn into_transactions(self) -> Result<Vec<Transaction>, FeedError> {
        if self.status == "1" {
            let raw: Vec<RawTransaction> = serde_json::from_value(self.result)
                .map_err(|e| FeedError::Decode(e.to_string()))?;
            return Ok(raw.iter().map(RawTransaction::normalize).collect());
        }

        let detail = self.result.as_str().unwrap_or_default().to_string();
        if self.message.starts_with("No transactions found") {
            return Ok(Vec::new());
        }
        if detail.to_ascii_lowercase().contains("rate limit") {
            return Err(FeedError::RateLimited);
        }

        Err(FeedError::Api {
            status: 200,
            message: if detail.is_empty() {
                self.message
            } else {
                format!("{}: {}", self.message, detail)
            },
        })
    }
}

/// Single-page Etherscan-compatible `txlist` client.
pub struct EtherscanFeed {
    client: Client,
    api_url: String,
    api_key: String,
    page_size: u32,
    timeout: Duration,
}

impl EtherscanFeed {
    pub fn new(config: &FeedConfig) -> eyre::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.resolved_api_key().unwrap_or_default(),
            page_size: config.page_size,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl TransactionFeed for EtherscanFeed {
    async fn fetch(&self, address: &str) -> Result<Vec<Transaction>, FeedError> {
        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("module", "account"),
                ("action", "txlist"),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("page", "1"),
                ("offset", page_size.as_str()),
                ("sort", "desc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout {
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    FeedError::from(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FeedError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: TxListResponse = response.json().await?;
        let transactions = envelope.into_transactions()?;

        tracing::debug!(
            address,
            count = transactions.len(),
            "Fetched transaction history"
        );
        Ok(transactions)
    }
}

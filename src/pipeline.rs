use alloy::primitives::Address;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::entity::AddressKnowledgeBase;
use crate::feed::{self, FeedError, Transaction, TransactionFeed};
use crate::risk::{RiskAnalysisResult, RiskEngine};

/// Flags at or above this severity are logged individually.
const WARN_SEVERITY: f64 = 0.85;

/// Validate a 20-byte hex address and return it lower-cased.
pub fn normalize_address(raw: &str) -> eyre::Result<String> {
    let address = Address::from_str(raw.trim())
        .map_err(|e| eyre::eyre!("Invalid address '{}': {}", raw, e))?;
    Ok(address.to_string().to_ascii_lowercase())
}

/// Wires the feed boundary to the scoring engine:
/// 1. Fetch history (single attempt, caller timeout)
/// 2. Score it against the knowledge base
/// 3. Log the outcome
#[derive(Clone)]
pub struct RiskPipeline {
    engine: RiskEngine,
    knowledge_base: Arc<AddressKnowledgeBase>,
}

impl RiskPipeline {
    pub fn new(engine: RiskEngine, knowledge_base: Arc<AddressKnowledgeBase>) -> Self {
        Self {
            engine,
            knowledge_base,
        }
    }

    /// Build the engine from config and load the knowledge base if one is configured.
    pub fn init(config: &Config) -> Self {
        let knowledge_base = match &config.knowledge_base.path {
            Some(path) => AddressKnowledgeBase::load_from_file(path),
            None => {
                tracing::info!("No knowledge base configured, address labels disabled");
                AddressKnowledgeBase::empty()
            }
        };

        Self::new(
            RiskEngine::new(config.thresholds.clone()),
            Arc::new(knowledge_base),
        )
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    pub fn knowledge_base(&self) -> &AddressKnowledgeBase {
        &self.knowledge_base
    }

    /// Fetch and score one address. Only the fetch can fail.
    pub async fn analyze_address<F: TransactionFeed>(
        &self,
        feed: &F,
        address: &str,
        timeout: Duration,
    ) -> Result<RiskAnalysisResult, FeedError> {
        let transactions = feed::fetch_with_timeout(feed, address, timeout)
            .await
            .inspect_err(|e| {
                tracing::error!(address, error = %e, "Transaction fetch failed");
            })?;

        tracing::debug!(address, count = transactions.len(), "Fetched transaction history");

        Ok(self.analyze_transactions(address, &transactions, &[], chrono::Utc::now().timestamp()))
    }

    /// Score an already-fetched history.
    pub fn analyze_transactions(
        &self,
        address: &str,
        transactions: &[Transaction],
        extra_flags: &[String],
        now: i64,
    ) -> RiskAnalysisResult {
        let result = self
            .engine
            .analyze(address, transactions, &self.knowledge_base, extra_flags, now);

        tracing::info!(
            address = %result.address,
            transactions = transactions.len(),
            risk_score = result.risk_score,
            confidence = result.confidence,
            tier = result.risk_tier.as_str(),
            flags = result.behavioral_flags.len(),
            real_time_flags = result.real_time_flags.len(),
            "Risk analysis complete"
        );

        for flag in result
            .behavioral_flags
            .iter()
            .filter(|f| f.severity >= WARN_SEVERITY)
        {
            tracing::warn!(
                address = %result.address,
                flag_type = flag.flag_type.as_str(),
                severity = flag.severity,
                description = %flag.description,
                "HIGH-SEVERITY FLAG"
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address() {
        let addr = normalize_address(" 0x28C6c06298d514Db089934071355E5743bf21d60 ").unwrap();
        assert_eq!(addr, "0x28c6c06298d514db089934071355e5743bf21d60");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_address("0x1234").is_err());
        assert!(normalize_address("not an address").is_err());
    }

    #[test]
    fn test_init_without_knowledge_base() {
        let pipeline = RiskPipeline::init(&Config::default());
        assert!(pipeline.knowledge_base().is_empty());
        assert_eq!(pipeline.engine().thresholds().velocity_threshold_tx_per_hour, 20);
    }
}

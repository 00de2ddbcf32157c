use bigdecimal::{BigDecimal, FromPrimitive};
use std::collections::HashMap;

use crate::config::RiskThresholds;
use crate::entity::AddressKnowledgeBase;
use crate::feed::types::{eth_to_wei, raw_to_human, GWEI_DECIMALS, WEI_DECIMALS};
use crate::feed::Transaction;
use crate::graph::{self, TransferGraph};

use super::stats::timestamp_gaps;
use super::types::{BehavioralFlag, FlagType};

/// Method selectors associated with fund extraction or flash-loan driven exploits.
pub const SUSPICIOUS_METHODS: &[(&str, &str)] = &[
    ("0x3ccfd60b", "withdraw() - potential reentrancy"),
    ("0x2e1a7d4d", "withdraw(uint256) - potential reentrancy"),
    ("0x853828b6", "withdrawAll() - mass withdrawal"),
    ("0x5cffe9de", "flashLoan() - ERC-3156 flash loan"),
    ("0xab9c4b5d", "flashLoan() - Aave V2 flash loan"),
    ("0x42b0b77c", "flashLoanSimple() - Aave V3 flash loan"),
    ("0x490e6cbc", "flash() - Uniswap V3 flash swap"),
    ("0x5c38449e", "flashLoan() - Balancer flash loan"),
];

/// Known MEV searcher and builder addresses.
pub const MEV_BOTS: &[(&str, &str)] = &[
    ("0xa69babef1ca67a37ffaf7a485dfff3382056e78c", "Flashbots Builder"),
];

pub fn suspicious_method(selector: &str) -> Option<&'static str> {
    SUSPICIOUS_METHODS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(selector))
        .map(|(_, desc)| *desc)
}

/// Flag the busiest single clock hour when it exceeds the configured rate.
pub fn check_velocity(
    transactions: &[Transaction],
    thresholds: &RiskThresholds,
) -> Option<BehavioralFlag> {
    if transactions.len() < 2 {
        return None;
    }

    let mut per_hour: HashMap<i64, u32> = HashMap::new();
    for tx in transactions.iter().filter(|tx| tx.timestamp > 0) {
        *per_hour.entry(tx.timestamp / 3600).or_insert(0) += 1;
    }

    let max_per_hour = per_hour.values().copied().max().unwrap_or(0);
    let threshold = thresholds.velocity_threshold_tx_per_hour;
    if max_per_hour <= threshold {
        return None;
    }

    Some(BehavioralFlag::new(
        FlagType::HighVelocity,
        max_per_hour as f64 / threshold as f64,
        format!(
            "Detected {} transactions in one hour (threshold: {})",
            max_per_hour, threshold
        ),
        serde_json::json!({
            "max_tx_per_hour": max_per_hour,
            "threshold": threshold,
        }),
    ))
}

/// Large outgoing value across the five most recent transactions.
pub fn check_rapid_drainage(
    address: &str,
    transactions: &[Transaction],
    thresholds: &RiskThresholds,
) -> Option<BehavioralFlag> {
    if transactions.len() < 5 {
        return None;
    }

    let recent_outgoing: BigDecimal = transactions[..5]
        .iter()
        .filter(|tx| tx.is_outgoing(address))
        .map(|tx| &tx.value_wei)
        .sum();

    if recent_outgoing <= eth_to_wei(thresholds.high_value_threshold_eth) {
        return None;
    }

    let eth = raw_to_human(&recent_outgoing, WEI_DECIMALS);
    Some(BehavioralFlag::new(
        FlagType::RapidDrainage,
        0.90,
        format!(
            "Rapid outgoing transfers detected: {:.2} ETH in recent transactions",
            eth
        ),
        serde_json::json!({
            "recent_outgoing_eth": eth,
            "transaction_count": 5,
        }),
    ))
}

/// A young address (by its oldest transaction) already moving large value.
pub fn check_new_address_high_value(
    transactions: &[Transaction],
    thresholds: &RiskThresholds,
    now: i64,
) -> Option<BehavioralFlag> {
    let oldest = transactions
        .iter()
        .map(|tx| tx.timestamp)
        .filter(|ts| *ts > 0)
        .min()?;

    let age_secs = now - oldest;
    let max_age_secs = thresholds.new_address_age_minutes as i64 * 60;
    if age_secs >= max_age_secs {
        return None;
    }

    let total: BigDecimal = transactions.iter().map(|tx| &tx.value_wei).sum();
    if total <= eth_to_wei(thresholds.high_value_threshold_eth) {
        return None;
    }

    let age_minutes = age_secs.max(0) / 60;
    let eth = raw_to_human(&total, WEI_DECIMALS);
    Some(BehavioralFlag::new(
        FlagType::NewAddressHighValue,
        0.85,
        format!(
            "New address (age: {} minutes) transacting {:.2} ETH",
            age_minutes, eth
        ),
        serde_json::json!({
            "address_age_minutes": age_minutes,
            "total_value_eth": eth,
        }),
    ))
}

/// One flag per transaction priced above mean × multiplier.
pub fn check_gas_anomalies(
    transactions: &[Transaction],
    thresholds: &RiskThresholds,
) -> Vec<BehavioralFlag> {
    let mut flags = Vec::new();
    if transactions.len() < 3 {
        return flags;
    }

    let priced: Vec<&BigDecimal> = transactions
        .iter()
        .filter(|tx| tx.has_gas_price())
        .map(|tx| &tx.gas_price)
        .collect();
    if priced.is_empty() {
        return flags;
    }

    let total: BigDecimal = priced.iter().copied().sum();
    let mean = total / BigDecimal::from(priced.len() as u64);
    let multiplier = BigDecimal::from_f64(thresholds.gas_anomaly_multiplier).unwrap_or_default();
    let threshold = &mean * multiplier;
    let mean_gwei = raw_to_human(&mean, GWEI_DECIMALS);

    for tx in transactions {
        if tx.gas_price > threshold {
            let gwei = tx.gas_price_gwei();
            flags.push(BehavioralFlag::new(
                FlagType::GasAnomaly,
                0.70,
                format!(
                    "Transaction {} used abnormally high gas: {:.2} Gwei",
                    short_hash(&tx.hash),
                    gwei
                ),
                serde_json::json!({
                    "tx_hash": tx.hash,
                    "gas_price_gwei": gwei,
                    "avg_gas_gwei": mean_gwei,
                }),
            ));
        }
    }

    flags
}

/// Mixer counterparties, suspicious method calls and circular fund flows.
pub fn check_interaction_patterns(
    address: &str,
    transactions: &[Transaction],
    knowledge_base: &AddressKnowledgeBase,
) -> Vec<BehavioralFlag> {
    let mut flags = Vec::new();

    // Counterparties in discovery order with interaction counts
    let mut counterparties: Vec<&str> = Vec::new();
    let mut interactions: HashMap<&str, u32> = HashMap::new();

    for tx in transactions {
        let other = tx.counterparty(address);
        if !other.is_empty() {
            let count = interactions.entry(other).or_insert(0);
            if *count == 0 {
                counterparties.push(other);
            }
            *count += 1;
        }

        if let Some(selector) = tx.method_selector() {
            if let Some(desc) = suspicious_method(&selector) {
                flags.push(BehavioralFlag::new(
                    FlagType::SuspiciousMethod,
                    0.80,
                    format!("Called suspicious method: {}", desc),
                    serde_json::json!({
                        "method_id": selector,
                        "tx_hash": tx.hash,
                    }),
                ));
            }
        }
    }

    for other in counterparties {
        if let Some(mixer_name) = knowledge_base.mixer(other) {
            flags.push(BehavioralFlag::new(
                FlagType::MixerInteraction,
                0.85,
                format!("Interacted with known mixer: {}", mixer_name),
                serde_json::json!({
                    "mixer_address": other,
                    "mixer_name": mixer_name,
                    "interactions": interactions.get(other).copied().unwrap_or(0),
                }),
            ));
        }
    }

    let transfer_graph = TransferGraph::from_transactions(transactions);
    if graph::has_cycle(&transfer_graph) {
        flags.push(BehavioralFlag::new(
            FlagType::CircularPattern,
            0.75,
            "Detected circular transaction pattern (possible money laundering)",
            serde_json::json!({
                "pattern": "circular_transfers",
                "graph_nodes": transfer_graph.node_count(),
            }),
        ));
    }

    flags
}

/// Clockwork timing and bursts of sub-minute gaps.
pub fn check_time_patterns(transactions: &[Transaction]) -> Vec<BehavioralFlag> {
    let mut flags = Vec::new();
    if transactions.len() < 3 {
        return flags;
    }

    let gaps = timestamp_gaps(transactions);
    if gaps.is_empty() {
        return flags;
    }

    if gaps.len() >= 5 {
        let variance = population_variance(&gaps);
        if variance < 10.0 {
            flags.push(BehavioralFlag::new(
                FlagType::AutomatedBehavior,
                0.60,
                "Transaction timing suggests automated/bot behavior",
                serde_json::json!({
                    "timing_variance": variance,
                    "sample_size": gaps.len(),
                }),
            ));
        }
    }

    let burst_count = gaps.iter().filter(|gap| **gap < 60).count();
    let burst_ratio = burst_count as f64 / gaps.len() as f64;
    if burst_ratio > 0.5 {
        flags.push(BehavioralFlag::new(
            FlagType::BurstPattern,
            0.70,
            "Detected burst transaction pattern",
            serde_json::json!({
                "burst_ratio": burst_ratio,
                "burst_count": burst_count,
            }),
        ));
    }

    flags
}

/// Transactions sent by known MEV bots.
pub fn check_mev_activity(transactions: &[Transaction]) -> Vec<BehavioralFlag> {
    transactions
        .iter()
        .filter_map(|tx| {
            let (bot, name) = MEV_BOTS
                .iter()
                .find(|(bot, _)| bot.eq_ignore_ascii_case(&tx.from))?;
            Some(BehavioralFlag::new(
                FlagType::MevActivity,
                0.70,
                format!("Transaction from known MEV bot: {}", name),
                serde_json::json!({
                    "bot_address": bot,
                    "bot_name": name,
                    "tx_hash": tx.hash,
                }),
            ))
        })
        .collect()
}

pub(crate) fn population_variance(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|v| (*v as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}

pub(crate) fn short_hash(hash: &str) -> String {
    match hash.get(..10) {
        Some(prefix) if hash.len() > 10 => format!("{}...", prefix),
        _ => hash.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::AddressKnowledgeBase;
    use crate::risk::test_support::{tx, ALICE, BOB, CAROL};

    fn thresholds() -> RiskThresholds {
        RiskThresholds::default()
    }

    #[test]
    fn test_velocity_flag_over_threshold() {
        // 25 transactions inside one clock hour
        let base = 1_700_000_000 / 3600 * 3600;
        let txs: Vec<_> = (0..25)
            .map(|i| tx(ALICE, BOB).timestamp(base + i * 60).build())
            .collect();

        let flag = check_velocity(&txs, &thresholds()).unwrap();
        assert_eq!(flag.flag_type, FlagType::HighVelocity);
        assert_eq!(flag.severity, 1.0);
        assert_eq!(flag.evidence["max_tx_per_hour"], 25);
    }

    #[test]
    fn test_velocity_under_threshold() {
        let txs: Vec<_> = (0..20)
            .map(|i| tx(ALICE, BOB).timestamp(1_700_000_000 + i * 7200).build())
            .collect();
        assert!(check_velocity(&txs, &thresholds()).is_none());
    }

    #[test]
    fn test_rapid_drainage_counts_only_outgoing() {
        let mut txs: Vec<_> = (0..4)
            .map(|_| tx(ALICE, BOB).value_eth(3.0).build())
            .collect();
        txs.push(tx(BOB, ALICE).value_eth(100.0).build());

        let flag = check_rapid_drainage(ALICE, &txs, &thresholds()).unwrap();
        assert_eq!(flag.severity, 0.90);
        assert!((flag.evidence["recent_outgoing_eth"].as_f64().unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_rapid_drainage_needs_five_transactions() {
        let txs: Vec<_> = (0..4)
            .map(|_| tx(ALICE, BOB).value_eth(50.0).build())
            .collect();
        assert!(check_rapid_drainage(ALICE, &txs, &thresholds()).is_none());
    }

    #[test]
    fn test_new_address_high_value() {
        let now = 1_700_000_000;
        let txs = vec![
            tx(BOB, ALICE).timestamp(now - 600).value_eth(8.0).build(),
            tx(BOB, ALICE).timestamp(now - 1200).value_eth(8.0).build(),
        ];
        let flag = check_new_address_high_value(&txs, &thresholds(), now).unwrap();
        assert_eq!(flag.evidence["address_age_minutes"], 20);

        // Same value but the oldest record is two hours old
        let mut old = txs.clone();
        old.push(tx(BOB, ALICE).timestamp(now - 7200).build());
        assert!(check_new_address_high_value(&old, &thresholds(), now).is_none());
    }

    #[test]
    fn test_single_gas_outlier_flagged_once() {
        let mut txs: Vec<_> = (0..10)
            .map(|i| tx(ALICE, BOB).hash(&format!("0xnormal{}", i)).gas_price(50).build())
            .collect();
        txs.push(tx(ALICE, BOB).hash("0xoutlier").gas_price(200).build());

        let flags = check_gas_anomalies(&txs, &thresholds());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].evidence["tx_hash"], "0xoutlier");
    }

    #[test]
    fn test_cycle_flag_emitted_once() {
        let txs = vec![
            tx(ALICE, BOB).build(),
            tx(BOB, CAROL).build(),
            tx(CAROL, ALICE).build(),
        ];
        let flags = check_interaction_patterns(ALICE, &txs, &AddressKnowledgeBase::empty());
        let cycles = flags
            .iter()
            .filter(|f| f.flag_type == FlagType::CircularPattern)
            .count();
        assert_eq!(cycles, 1);
    }

    #[test]
    fn test_mixer_flag_once_per_counterparty() {
        let mut kb = AddressKnowledgeBase::empty();
        kb.insert_mixer(CAROL, "Tornado Cash");
        let txs = vec![
            tx(ALICE, CAROL).build(),
            tx(ALICE, CAROL).build(),
            tx(ALICE, BOB).build(),
        ];

        let flags = check_interaction_patterns(ALICE, &txs, &kb);
        let mixers: Vec<_> = flags
            .iter()
            .filter(|f| f.flag_type == FlagType::MixerInteraction)
            .collect();
        assert_eq!(mixers.len(), 1);
        assert_eq!(mixers[0].evidence["interactions"], 2);
    }

    #[test]
    fn test_suspicious_method_per_transaction() {
        let txs = vec![
            tx(ALICE, BOB).input("0x2e1a7d4d0000000000000000000000000000000000000000000000000de0b6b3a7640000").build(),
            tx(ALICE, BOB).input("0xa9059cbb").build(),
        ];
        let flags = check_interaction_patterns(ALICE, &txs, &AddressKnowledgeBase::empty());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::SuspiciousMethod);
        assert_eq!(flags[0].evidence["method_id"], "0x2e1a7d4d");
    }

    #[test]
    fn test_automated_and_burst_patterns() {
        // Newest first, exactly 30s apart
        let txs: Vec<_> = (0..8)
            .map(|i| tx(ALICE, BOB).timestamp(1_700_000_000 - i * 30).build())
            .collect();
        let flags = check_time_patterns(&txs);
        let types: Vec<_> = flags.iter().map(|f| f.flag_type).collect();
        assert_eq!(types, vec![FlagType::AutomatedBehavior, FlagType::BurstPattern]);
    }

    #[test]
    fn test_time_patterns_skip_bad_timestamps() {
        let txs = vec![
            tx(ALICE, BOB).timestamp(0).build(),
            tx(ALICE, BOB).timestamp(0).build(),
            tx(ALICE, BOB).timestamp(0).build(),
        ];
        assert!(check_time_patterns(&txs).is_empty());
    }

    #[test]
    fn test_self_send_is_circular() {
        let txs = vec![tx(ALICE, ALICE).build(), tx(ALICE, BOB).build()];
        let flags = check_interaction_patterns(ALICE, &txs, &AddressKnowledgeBase::empty());
        assert!(flags.iter().any(|f| f.flag_type == FlagType::CircularPattern));
    }

    #[test]
    fn test_mev_table_holds_valid_addresses() {
        use alloy::primitives::Address;
        use std::str::FromStr;

        for (bot, _) in MEV_BOTS {
            assert!(Address::from_str(bot).is_ok(), "malformed bot address {}", bot);
        }
    }

    #[test]
    fn test_mev_bot_sender() {
        let txs = vec![tx("0xa69babef1ca67a37ffaf7a485dfff3382056e78c", ALICE).build()];
        let flags = check_mev_activity(&txs);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].evidence["bot_name"], "Flashbots Builder");
    }
}

use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::feed::types::{eth_to_wei, raw_to_human, GWEI_DECIMALS};
use crate::feed::Transaction;

use super::rules::short_hash;
use super::types::{BehavioralFlag, FlagType};

/// DEX routers commonly targeted by front-runners.
pub const DEX_ROUTERS: &[(&str, &str)] = &[
    ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", "Uniswap V2 Router"),
    ("0xe592427a0aece92de3edee1f18e0157c05861564", "Uniswap V3 Router"),
    ("0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f", "SushiSwap Router"),
];

/// Gas price percentiles over transactions with a positive gas price.
#[derive(Debug, Clone)]
pub struct GasProfile {
    pub sorted: Vec<BigDecimal>,
    pub p50: BigDecimal,
    pub p90: BigDecimal,
    pub p99: BigDecimal,
}

impl GasProfile {
    pub fn from_transactions(transactions: &[Transaction]) -> Option<Self> {
        let mut sorted: Vec<BigDecimal> = transactions
            .iter()
            .filter(|tx| tx.has_gas_price())
            .map(|tx| tx.gas_price.clone())
            .collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort();

        let n = sorted.len();
        let p50 = sorted[n / 2].clone();
        let p90 = sorted[n * 9 / 10].clone();
        let p99 = sorted[n * 99 / 100].clone();

        Some(Self {
            sorted,
            p50,
            p90,
            p99,
        })
    }
}

fn times(value: &BigDecimal, factor: u32) -> BigDecimal {
    value * BigDecimal::from(factor)
}

fn gwei(value: &BigDecimal) -> f64 {
    raw_to_human(value, GWEI_DECIMALS)
}

fn dex_router(address: &str) -> Option<&'static str> {
    DEX_ROUTERS
        .iter()
        .find(|(router, _)| router.eq_ignore_ascii_case(address))
        .map(|(_, name)| *name)
}

/// Run every gas-based attack detector over the history.
pub fn check_gas_attack_patterns(transactions: &[Transaction]) -> Vec<BehavioralFlag> {
    if transactions.len() < 3 {
        return Vec::new();
    }
    let Some(profile) = GasProfile::from_transactions(transactions) else {
        return Vec::new();
    };

    let mut flags = Vec::new();
    flags.extend(detect_front_running(transactions, &profile));
    flags.extend(detect_sandwich_attacks(transactions, &profile));
    flags.extend(detect_gas_wars(transactions, &profile));
    flags.extend(detect_exploit_execution(transactions, &profile));
    flags.extend(detect_censorship_evasion(&profile));
    flags
}

/// Gas far above p90, aimed at a DEX router or next to a cheaper transaction.
pub fn detect_front_running(transactions: &[Transaction], profile: &GasProfile) -> Vec<BehavioralFlag> {
    let limit = times(&profile.p90, 10);
    let mut flags = Vec::new();

    for (i, tx) in transactions.iter().enumerate() {
        if tx.gas_price <= limit {
            continue;
        }

        let router = dex_router(&tx.to);
        let prev = i.checked_sub(1).and_then(|j| transactions.get(j));
        let next = transactions.get(i + 1);
        let victim_nearby = prev
            .into_iter()
            .chain(next)
            .any(|neighbor| {
                neighbor.has_gas_price() && neighbor.gas_price < profile.p90
            });

        if router.is_some() || victim_nearby {
            let gas_gwei = tx.gas_price_gwei();
            flags.push(BehavioralFlag::new(
                FlagType::FrontRunning,
                0.85,
                format!(
                    "Potential front-running: {} used {:.0} Gwei gas",
                    short_hash(&tx.hash),
                    gas_gwei
                ),
                serde_json::json!({
                    "tx_hash": tx.hash,
                    "gas_price_gwei": gas_gwei,
                    "p90_gwei": gwei(&profile.p90),
                    "target_is_dex": router.is_some(),
                    "dex_router": router,
                    "victim_nearby": victim_nearby,
                }),
            ));
        }
    }

    flags
}

/// Expensive-cheap-expensive triples from one sender against one contract.
pub fn detect_sandwich_attacks(transactions: &[Transaction], profile: &GasProfile) -> Vec<BehavioralFlag> {
    let high = times(&profile.p90, 5);
    let normal = times(&profile.p90, 2);
    let mut flags = Vec::new();

    for window in transactions.windows(3) {
        let (front, victim, back) = (&window[0], &window[1], &window[2]);

        let gas_shape = front.gas_price > high
            && back.gas_price > high
            && victim.has_gas_price()
            && victim.gas_price < normal;
        let same_sender = front.from.eq_ignore_ascii_case(&back.from);
        let same_target = front.to.eq_ignore_ascii_case(&victim.to)
            && victim.to.eq_ignore_ascii_case(&back.to);

        if gas_shape && same_sender && same_target {
            let victim_gwei = victim.gas_price_gwei();
            let gas_multiple = if victim_gwei > 0.0 {
                front.gas_price_gwei() / victim_gwei
            } else {
                0.0
            };
            flags.push(BehavioralFlag::new(
                FlagType::SandwichAttack,
                0.90,
                "Sandwich attack pattern detected",
                serde_json::json!({
                    "front_tx": front.hash,
                    "victim_tx": victim.hash,
                    "back_tx": back.hash,
                    "target": front.to,
                    "gas_multiple": gas_multiple,
                }),
            ));
        }
    }

    flags
}

/// Same-timestamp buckets with strictly escalating gas, reported once per bucket.
pub fn detect_gas_wars(transactions: &[Transaction], profile: &GasProfile) -> Vec<BehavioralFlag> {
    let high = times(&profile.p50, 5);

    // Buckets in discovery order
    let mut order: Vec<i64> = Vec::new();
    let mut buckets: HashMap<i64, Vec<&Transaction>> = HashMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.has_gas_price() && tx.timestamp > 0)
    {
        let bucket = buckets.entry(tx.timestamp).or_default();
        if bucket.is_empty() {
            order.push(tx.timestamp);
        }
        bucket.push(tx);
    }

    let mut flags = Vec::new();
    for timestamp in order {
        let Some(bucket) = buckets.get(&timestamp) else {
            continue;
        };
        if bucket.len() < 3 {
            continue;
        }

        let escalating = bucket
            .windows(2)
            .all(|pair| pair[1].gas_price > pair[0].gas_price);
        let high_count = bucket.iter().filter(|tx| tx.gas_price > high).count();

        if escalating && high_count >= 2 {
            let first = &bucket[0].gas_price;
            let last = &bucket[bucket.len() - 1].gas_price;
            let first_gwei = gwei(first);
            let escalation_ratio = if first_gwei > 0.0 {
                gwei(last) / first_gwei
            } else {
                0.0
            };
            flags.push(BehavioralFlag::new(
                FlagType::GasWar,
                0.70,
                format!("Gas war detected: {} competing transactions", bucket.len()),
                serde_json::json!({
                    "block_timestamp": timestamp,
                    "competing_txs": bucket.len(),
                    "max_gas_gwei": gwei(last),
                    "escalation_ratio": escalation_ratio,
                }),
            ));
        }
    }

    flags
}

/// Extreme gas, large value and heavy call data in a single transaction.
pub fn detect_exploit_execution(transactions: &[Transaction], profile: &GasProfile) -> Vec<BehavioralFlag> {
    let limit = times(&profile.p99, 20);
    let min_value = eth_to_wei(10.0);

    transactions
        .iter()
        .filter(|tx| tx.gas_price > limit && tx.value_wei > min_value && tx.input_len() > 1000)
        .map(|tx| {
            let value_eth = tx.value_eth();
            BehavioralFlag::new(
                FlagType::ExploitExecution,
                0.95,
                format!(
                    "Potential exploit: high gas with large extraction ({:.2} ETH)",
                    value_eth
                ),
                serde_json::json!({
                    "tx_hash": tx.hash,
                    "gas_price_gwei": tx.gas_price_gwei(),
                    "value_eth": value_eth,
                    "input_size": tx.input_len(),
                    "contract_address": tx.to,
                }),
            )
        })
        .collect()
}

/// Most of the history paying well above the median gas price.
///
/// Never fires: the median is `sorted[n / 2]` of the same prices, so fewer
/// than half of them can exceed 3x the median and the ratio stays below 0.6.
pub fn detect_censorship_evasion(profile: &GasProfile) -> Option<BehavioralFlag> {
    let high = times(&profile.p50, 3);
    let above: Vec<&BigDecimal> = profile.sorted.iter().filter(|g| **g > high).collect();
    let ratio = above.len() as f64 / profile.sorted.len() as f64;
    if ratio <= 0.6 {
        return None;
    }

    let avg_high: BigDecimal =
        above.iter().copied().sum::<BigDecimal>() / BigDecimal::from(above.len() as u64);

    Some(BehavioralFlag::new(
        FlagType::CensorshipEvasion,
        0.80,
        "Consistent high gas usage suggests censorship evasion",
        serde_json::json!({
            "high_gas_ratio": ratio,
            "avg_high_gas_gwei": gwei(&avg_high),
            "median_gas_gwei": gwei(&profile.p50),
        }),
    ))
}

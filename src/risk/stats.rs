use bigdecimal::{BigDecimal, Zero};
use std::collections::BTreeMap;

use crate::config::RiskThresholds;
use crate::feed::Transaction;
use crate::graph::{self, TransferGraph};

use super::types::StatisticalScores;

/// Expected first-digit frequencies for digits 1 through 9.
pub const BENFORD_EXPECTED: [f64; 9] = [0.301, 0.176, 0.125, 0.097, 0.079, 0.067, 0.058, 0.051, 0.046];

/// Positive gaps in seconds between feed-adjacent transactions.
/// Records without a valid timestamp are skipped.
pub fn timestamp_gaps(transactions: &[Transaction]) -> Vec<i64> {
    let stamps: Vec<i64> = transactions
        .iter()
        .map(|tx| tx.timestamp)
        .filter(|ts| *ts > 0)
        .collect();

    stamps
        .windows(2)
        .map(|pair| (pair[0] - pair[1]).abs())
        .filter(|gap| *gap > 0)
        .collect()
}

pub fn compute_scores(
    address: &str,
    transactions: &[Transaction],
    thresholds: &RiskThresholds,
) -> StatisticalScores {
    StatisticalScores {
        benford: benford_score(transactions, thresholds.benford_deviation_limit),
        velocity: velocity_score(transactions),
        entropy: entropy_score(address, transactions),
        clustering: clustering_score(transactions),
        temporal_anomaly: temporal_anomaly_score(transactions),
    }
    .clamped()
}

/// Chi-square distance of leading digits from Benford's distribution,
/// scaled by `deviation_limit`.
pub fn benford_score(transactions: &[Transaction], deviation_limit: f64) -> f64 {
    let mut digit_counts = [0u32; 9];
    let mut total = 0u32;

    for tx in transactions {
        if let Some(digit) = leading_digit(&tx.value_wei) {
            digit_counts[(digit - 1) as usize] += 1;
            total += 1;
        }
    }

    if total < 10 || deviation_limit <= 0.0 {
        return 0.0;
    }

    let chi_square: f64 = digit_counts
        .iter()
        .zip(BENFORD_EXPECTED.iter())
        .map(|(count, expected)| {
            let observed = *count as f64 / total as f64;
            (observed - expected).powi(2) / expected
        })
        .sum();

    (chi_square / deviation_limit).min(1.0)
}

fn leading_digit(value: &BigDecimal) -> Option<u32> {
    if value.is_zero() {
        return None;
    }
    let (digits, _) = value.as_bigint_and_exponent();
    digits
        .to_string()
        .chars()
        .find(|c| c.is_ascii_digit() && *c != '0')
        .and_then(|c| c.to_digit(10))
}

/// Peak transactions-per-hour implied by sub-hour gaps, 20/hour = 1.0.
pub fn velocity_score(transactions: &[Transaction]) -> f64 {
    if transactions.len() < 2 {
        return 0.0;
    }

    let peak = timestamp_gaps(transactions)
        .into_iter()
        .filter(|gap| *gap < 3600)
        .map(|gap| 3600.0 / gap as f64)
        .fold(0.0_f64, f64::max);

    (peak / 20.0).min(1.0)
}

/// Normalized Shannon entropy of the counterparty distribution.
pub fn entropy_score(address: &str, transactions: &[Transaction]) -> f64 {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    let mut total = 0u32;

    for tx in transactions {
        let other = tx.counterparty(address);
        if !other.is_empty() {
            *counts.entry(other).or_insert(0) += 1;
            total += 1;
        }
    }

    if counts.len() < 2 {
        return 0.0;
    }

    let entropy: f64 = counts
        .values()
        .map(|count| {
            let p = *count as f64 / total as f64;
            -p * p.log2()
        })
        .sum();

    entropy / (counts.len() as f64).log2()
}

pub fn clustering_score(transactions: &[Transaction]) -> f64 {
    graph::clustering_coefficient(&TransferGraph::from_transactions(transactions))
}

/// Share of gaps deviating from the mean gap by more than two standard deviations.
pub fn temporal_anomaly_score(transactions: &[Transaction]) -> f64 {
    if transactions.len() < 3 {
        return 0.0;
    }

    let gaps: Vec<f64> = timestamp_gaps(transactions)
        .into_iter()
        .map(|g| g as f64)
        .collect();
    if gaps.len() < 2 {
        return 0.0;
    }

    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<f64>() / n;
    let std_dev = (gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n).sqrt();

    let anomalies = gaps
        .iter()
        .filter(|g| (*g - mean).abs() > 2.0 * std_dev)
        .count();

    anomalies as f64 / n
}

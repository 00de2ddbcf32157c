use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::config::RiskThresholds;
use crate::entity::AddressKnowledgeBase;
use crate::feed::types::{raw_to_human, sort_newest_first, WEI_DECIMALS};
use crate::feed::Transaction;

use super::types::{clamp_unit, BehavioralFlag, RiskAnalysisResult, RiskTier, StatisticalScores};
use super::{gas, realtime, recommend, rules, stats};

const STAT_WEIGHT_BENFORD: f64 = 0.7;
const STAT_WEIGHT_VELOCITY: f64 = 0.8;
const STAT_WEIGHT_ENTROPY: f64 = 0.5;
const STAT_WEIGHT_CLUSTERING: f64 = 0.6;
const STAT_WEIGHT_TEMPORAL: f64 = 0.7;

const REAL_TIME_INCREMENT: f64 = 0.2;
const REAL_TIME_WEIGHT: f64 = 0.9;

const EMPTY_HISTORY_SCORE: f64 = 0.1;
const EMPTY_HISTORY_CONFIDENCE: f64 = 0.1;

/// The scoring engine. Runs every extractor and analyzer against one history.
///
/// Pure: no I/O, no shared state, and no error path.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    thresholds: RiskThresholds,
}

impl RiskEngine {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    /// Analyze one address. `extra_flags` are caller-supplied real-time
    /// observations; `now` is Unix seconds used for address age.
    pub fn analyze(
        &self,
        address: &str,
        transactions: &[Transaction],
        knowledge_base: &AddressKnowledgeBase,
        extra_flags: &[String],
        now: i64,
    ) -> RiskAnalysisResult {
        let address = address.trim().to_ascii_lowercase();

        if transactions.is_empty() {
            return self.empty_result(address, extra_flags);
        }

        let mut txs = transactions.to_vec();
        sort_newest_first(&mut txs);

        let flags = self.behavioral_flags(&address, &txs, knowledge_base, now);
        let scores = stats::compute_scores(&address, &txs, &self.thresholds);

        let mut real_time = realtime::real_time_flags(&address, &txs, knowledge_base);
        real_time.extend(extra_flags.iter().cloned());

        let risk_score = aggregate(&flags, &scores, real_time.len());
        let confidence = confidence(flags.len(), txs.len());
        let risk_tier = RiskTier::from_score(risk_score);
        let recommendations = recommend::recommendations(risk_tier, &flags);
        let detailed_analysis = detailed_analysis(&address, &txs, risk_tier);

        RiskAnalysisResult {
            address,
            risk_score,
            confidence,
            risk_tier,
            behavioral_flags: flags,
            statistical_scores: scores,
            real_time_flags: real_time,
            recommendations,
            detailed_analysis,
        }
    }

    /// All behavioral flags, most severe first. Ties keep extractor order.
    pub fn behavioral_flags(
        &self,
        address: &str,
        transactions: &[Transaction],
        knowledge_base: &AddressKnowledgeBase,
        now: i64,
    ) -> Vec<BehavioralFlag> {
        let t = &self.thresholds;
        let mut flags = Vec::new();

        flags.extend(rules::check_velocity(transactions, t));
        flags.extend(rules::check_rapid_drainage(address, transactions, t));
        flags.extend(rules::check_new_address_high_value(transactions, t, now));
        flags.extend(rules::check_gas_anomalies(transactions, t));
        flags.extend(rules::check_interaction_patterns(
            address,
            transactions,
            knowledge_base,
        ));
        flags.extend(rules::check_time_patterns(transactions));
        flags.extend(gas::check_gas_attack_patterns(transactions));
        flags.extend(rules::check_mev_activity(transactions));

        flags.sort_by(|a, b| b.severity.total_cmp(&a.severity));
        flags
    }

    fn empty_result(&self, address: String, extra_flags: &[String]) -> RiskAnalysisResult {
        let mut real_time = vec![realtime::NO_HISTORY.to_string()];
        real_time.extend(extra_flags.iter().cloned());

        RiskAnalysisResult {
            detailed_analysis: detailed_analysis(&address, &[], RiskTier::Minimal),
            address,
            risk_score: EMPTY_HISTORY_SCORE,
            confidence: EMPTY_HISTORY_CONFIDENCE,
            risk_tier: RiskTier::Minimal,
            behavioral_flags: Vec::new(),
            statistical_scores: StatisticalScores::default(),
            real_time_flags: real_time,
            recommendations: recommend::recommendations(RiskTier::Minimal, &[]),
        }
    }
}

/// Severity-weighted average of flags, statistical scores and real-time flags.
pub fn aggregate(flags: &[BehavioralFlag], scores: &StatisticalScores, real_time_count: usize) -> f64 {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for flag in flags {
        let severity = clamp_unit(flag.severity);
        total_score += severity * severity;
        total_weight += severity;
    }

    let scores = scores.clamped();
    for (score, weight) in [
        (scores.benford, STAT_WEIGHT_BENFORD),
        (scores.velocity, STAT_WEIGHT_VELOCITY),
        (scores.entropy, STAT_WEIGHT_ENTROPY),
        (scores.clustering, STAT_WEIGHT_CLUSTERING),
        (scores.temporal_anomaly, STAT_WEIGHT_TEMPORAL),
    ] {
        total_score += score * weight;
        total_weight += weight;
    }

    if real_time_count > 0 {
        total_score += real_time_count as f64 * REAL_TIME_INCREMENT * REAL_TIME_WEIGHT;
        total_weight += REAL_TIME_WEIGHT;
    }

    if total_weight > 0.0 {
        clamp_unit(total_score / total_weight)
    } else {
        0.0
    }
}

pub fn confidence(flag_count: usize, transaction_count: usize) -> f64 {
    let evidence = (flag_count as f64 / 5.0).min(1.0);
    let sample = (transaction_count as f64 / 50.0).min(1.0);
    clamp_unit(0.5 * evidence + 0.5 * sample)
}

fn format_time(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn detailed_analysis(address: &str, transactions: &[Transaction], tier: RiskTier) -> serde_json::Value {
    let valid_times = || transactions.iter().map(|tx| tx.timestamp).filter(|ts| *ts > 0);

    let unique: HashSet<&str> = transactions
        .iter()
        .map(|tx| tx.counterparty(address))
        .filter(|other| !other.is_empty())
        .collect();

    let total_volume: BigDecimal = transactions.iter().map(|tx| &tx.value_wei).sum();
    let failed = transactions.iter().filter(|tx| tx.is_error).count();

    serde_json::json!({
        "transaction_count": transactions.len(),
        "first_tx_time": format_time(valid_times().min()),
        "last_tx_time": format_time(valid_times().max()),
        "unique_interactions": unique.len(),
        "total_volume_eth": raw_to_human(&total_volume, WEI_DECIMALS),
        "failed_transactions": failed,
        "risk_tier": tier.as_str(),
    })
}

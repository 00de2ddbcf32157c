use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::{MonitorConfig, RiskThresholds};
use crate::entity::AddressKnowledgeBase;
use crate::feed::types::{eth_to_wei, GWEI_DECIMALS};
use crate::feed::{self, FeedError, Transaction, TransactionFeed};
use crate::pipeline::RiskPipeline;
use crate::risk::rules::suspicious_method;
use crate::risk::types::clamp_unit;

/// Gas price above which a single transaction counts as expensive.
const HIGH_GAS_GWEI: u64 = 200;

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub address: String,
    pub risk_score: f64,
    pub alert_type: String,
    pub description: String,
    pub tx_hash: String,
    pub value_eth: f64,
}

/// Local risk of one transaction, scored in isolation.
#[derive(Debug, Clone)]
pub struct TransactionRisk {
    pub score: f64,
    pub alert_type: &'static str,
    pub factors: Vec<String>,
}

/// Score a single transaction from its value, status, counterparty and call data.
pub fn score_transaction(
    address: &str,
    tx: &Transaction,
    thresholds: &RiskThresholds,
    knowledge_base: &AddressKnowledgeBase,
) -> TransactionRisk {
    // (alert type, weight, factor description)
    let mut hits: Vec<(&'static str, f64, String)> = Vec::new();

    if tx.value_wei > eth_to_wei(thresholds.high_value_threshold_eth) {
        hits.push(("high_value", 0.3, format!("High value: {:.2} ETH", tx.value_eth())));
    }

    if tx.is_error {
        hits.push(("failed_transaction", 0.2, "Failed transaction".to_string()));
    }

    let other = tx.counterparty(address);
    if let Some(mixer) = knowledge_base.mixer(other) {
        hits.push(("mixer_interaction", 0.5, format!("Mixer interaction: {}", mixer)));
    }
    if let Some(hacker) = knowledge_base.hacker(other) {
        hits.push(("hacker_interaction", 0.8, format!("Known hacker: {}", hacker.name)));
    }

    if let Some(desc) = tx.method_selector().and_then(|s| suspicious_method(&s)) {
        hits.push(("suspicious_method", 0.8, format!("Suspicious method: {}", desc)));
    }

    let high_gas = bigdecimal::BigDecimal::from(HIGH_GAS_GWEI * 10u64.pow(GWEI_DECIMALS));
    if tx.gas_price > high_gas {
        hits.push(("high_gas", 0.2, format!("High gas: {:.0} Gwei", tx.gas_price_gwei())));
    }

    let score = clamp_unit(hits.iter().map(|(_, w, _)| w).sum());

    // First factor with the largest weight names the alert
    let mut alert_type = "normal";
    let mut best = 0.0;
    for (kind, weight, _) in &hits {
        if *weight > best {
            best = *weight;
            alert_type = *kind;
        }
    }

    TransactionRisk {
        score,
        alert_type,
        factors: hits.into_iter().map(|(_, _, f)| f).collect(),
    }
}

/// Outcome of one polling tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub baseline: bool,
    pub new_transactions: usize,
    pub alerts: Vec<Alert>,
    pub risk_score: f64,
    pub previous_score: Option<f64>,
    pub score_delta: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitorSummary {
    pub address: String,
    pub ticks: u64,
    pub alert_count: usize,
    pub alerts_by_type: BTreeMap<String, usize>,
    pub peak_alert: Option<Alert>,
    pub final_score: Option<f64>,
    pub duration_secs: u64,
}

/// Re-runs the pipeline on each tick over the page the feed returned and
/// raises alerts for risky transactions seen for the first time. Memory is
/// bounded by the feed page size.
pub struct Monitor<F: TransactionFeed> {
    address: String,
    feed: F,
    pipeline: RiskPipeline,
    alert_threshold: f64,
    poll_interval: Duration,
    fetch_timeout: Duration,
    seen: HashSet<String>,
    window: Vec<Transaction>,
    previous_score: Option<f64>,
    alerts: Vec<Alert>,
    ticks: u64,
    started: Instant,
}

impl<F: TransactionFeed> Monitor<F> {
    pub fn new(
        address: &str,
        feed: F,
        pipeline: RiskPipeline,
        config: &MonitorConfig,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            address: address.trim().to_ascii_lowercase(),
            feed,
            pipeline,
            alert_threshold: config.alert_threshold,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            fetch_timeout,
            seen: HashSet::new(),
            window: Vec::new(),
            previous_score: None,
            alerts: Vec::new(),
            ticks: 0,
            started: Instant::now(),
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Transactions scored on the last successful tick.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// One poll: fetch, alert on unseen transactions, re-score the fetched page.
    /// The first successful tick only establishes the baseline.
    pub async fn tick(&mut self, now: i64) -> Result<TickReport, FeedError> {
        self.ticks += 1;
        let fetched = feed::fetch_with_timeout(&self.feed, &self.address, self.fetch_timeout).await?;

        let baseline = self.previous_score.is_none();

        // Only hashes on the current page stay tracked
        let mut current: HashSet<String> = HashSet::with_capacity(fetched.len());
        let mut fresh: Vec<&Transaction> = Vec::new();
        for tx in &fetched {
            if current.insert(tx.hash.clone()) && !self.seen.contains(&tx.hash) {
                fresh.push(tx);
            }
        }

        let mut alerts = Vec::new();
        if !baseline {
            let timestamp = DateTime::<Utc>::from_timestamp(now, 0).unwrap_or_default();
            for tx in fresh.iter().copied() {
                let risk = score_transaction(
                    &self.address,
                    tx,
                    self.pipeline.engine().thresholds(),
                    self.pipeline.knowledge_base(),
                );
                if risk.score >= self.alert_threshold {
                    let alert = Alert {
                        timestamp,
                        address: self.address.clone(),
                        risk_score: risk.score,
                        alert_type: risk.alert_type.to_string(),
                        description: risk.factors.join("; "),
                        tx_hash: tx.hash.clone(),
                        value_eth: tx.value_eth(),
                    };
                    tracing::warn!(
                        address = %self.address,
                        tx_hash = %alert.tx_hash,
                        alert_type = %alert.alert_type,
                        risk_score = alert.risk_score,
                        description = %alert.description,
                        "ALERT"
                    );
                    alerts.push(alert);
                }
            }
        }

        let new_transactions = fresh.len();
        self.seen = current;
        self.window = fetched;

        let result = self
            .pipeline
            .analyze_transactions(&self.address, &self.window, &[], now);
        let previous_score = self.previous_score;
        let score_delta = previous_score.map_or(0.0, |prev| result.risk_score - prev);
        self.previous_score = Some(result.risk_score);
        self.alerts.extend(alerts.iter().cloned());

        Ok(TickReport {
            baseline,
            new_transactions,
            alerts,
            risk_score: result.risk_score,
            previous_score,
            score_delta,
        })
    }

    /// Poll until `shutdown` is cancelled, then return the run summary.
    pub async fn run(&mut self, shutdown: CancellationToken) -> MonitorSummary {
        tracing::info!(
            address = %self.address,
            alert_threshold = self.alert_threshold,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Monitoring started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!(address = %self.address, "Shutdown received, stopping monitor");
                    break;
                }
                _ = interval.tick() => {}
            }

            match self.tick(Utc::now().timestamp()).await {
                Ok(report) if report.baseline => {
                    tracing::info!(
                        address = %self.address,
                        transactions = report.new_transactions,
                        risk_score = report.risk_score,
                        "Baseline established"
                    );
                }
                Ok(report) if report.new_transactions > 0 => {
                    tracing::info!(
                        address = %self.address,
                        new_transactions = report.new_transactions,
                        alerts = report.alerts.len(),
                        risk_score = report.risk_score,
                        score_delta = report.score_delta,
                        "New activity"
                    );
                }
                Ok(_) => {
                    tracing::debug!(address = %self.address, "No new activity");
                }
                Err(e) => {
                    tracing::error!(address = %self.address, error = %e, "Poll failed, skipping tick");
                }
            }
        }

        let summary = self.summary();
        tracing::info!(
            address = %summary.address,
            ticks = summary.ticks,
            alert_count = summary.alert_count,
            alerts_by_type = ?summary.alerts_by_type,
            final_score = ?summary.final_score,
            duration_secs = summary.duration_secs,
            "Monitoring summary"
        );
        summary
    }

    pub fn summary(&self) -> MonitorSummary {
        let mut alerts_by_type = BTreeMap::new();
        for alert in &self.alerts {
            *alerts_by_type.entry(alert.alert_type.clone()).or_insert(0) += 1;
        }

        let mut peak_alert: Option<&Alert> = None;
        for alert in &self.alerts {
            match peak_alert {
                Some(peak) if alert.risk_score <= peak.risk_score => {}
                _ => peak_alert = Some(alert),
            }
        }

        MonitorSummary {
            address: self.address.clone(),
            ticks: self.ticks,
            alert_count: self.alerts.len(),
            alerts_by_type,
            peak_alert: peak_alert.cloned(),
            final_score: self.previous_score,
            duration_secs: self.started.elapsed().as_secs(),
        }
    }
}

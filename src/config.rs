use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub thresholds: RiskThresholds,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============================================================
// Risk Thresholds
// ============================================================

/// Thresholds injected into every extractor.
#[derive(Debug, Deserialize, Clone)]
pub struct RiskThresholds {
    #[serde(default = "default_high_value_threshold_eth")]
    pub high_value_threshold_eth: f64,
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold_tx_per_hour: u32,
    #[serde(default = "default_gas_anomaly_multiplier")]
    pub gas_anomaly_multiplier: f64,
    #[serde(default = "default_new_address_age_minutes")]
    pub new_address_age_minutes: u64,
    #[serde(default = "default_benford_deviation_limit")]
    pub benford_deviation_limit: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_value_threshold_eth: 10.0,
            velocity_threshold_tx_per_hour: 20,
            gas_anomaly_multiplier: 3.0,
            new_address_age_minutes: 60,
            benford_deviation_limit: 0.15,
        }
    }
}

fn default_high_value_threshold_eth() -> f64 {
    10.0
}

fn default_velocity_threshold() -> u32 {
    20
}

fn default_gas_anomaly_multiplier() -> f64 {
    3.0
}

fn default_new_address_age_minutes() -> u64 {
    60
}

fn default_benford_deviation_limit() -> f64 {
    0.15
}

// ============================================================
// Monitor Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 0.6,
            poll_interval_secs: 30,
        }
    }
}

fn default_alert_threshold() -> f64 {
    0.6
}

fn default_poll_interval_secs() -> u64 {
    30
}

// ============================================================
// Feed Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Read history from an explorer-shaped JSON file instead of the API.
    pub source_file: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            timeout_secs: 15,
            page_size: 10_000,
            source_file: None,
        }
    }
}

impl FeedConfig {
    /// API key from config, falling back to `ETHERSCAN_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("ETHERSCAN_API_KEY").ok())
    }
}

fn default_api_url() -> String {
    "https://api.etherscan.io/api".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> u32 {
    10_000
}

// ============================================================
// Knowledge Base / API / Logging
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct KnowledgeBaseConfig {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        let t = &self.thresholds;
        if t.high_value_threshold_eth <= 0.0 {
            return Err(eyre::eyre!("high_value_threshold_eth must be positive"));
        }
        if t.velocity_threshold_tx_per_hour == 0 {
            return Err(eyre::eyre!("velocity_threshold_tx_per_hour must be positive"));
        }
        if t.gas_anomaly_multiplier <= 0.0 {
            return Err(eyre::eyre!("gas_anomaly_multiplier must be positive"));
        }
        if t.benford_deviation_limit <= 0.0 {
            return Err(eyre::eyre!("benford_deviation_limit must be positive"));
        }
        if !(self.monitor.alert_threshold > 0.0 && self.monitor.alert_threshold <= 1.0) {
            return Err(eyre::eyre!(
                "alert_threshold must be in (0, 1], got {}",
                self.monitor.alert_threshold
            ));
        }
        if self.monitor.poll_interval_secs == 0 {
            return Err(eyre::eyre!("poll_interval_secs must be at least 1"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(eyre::eyre!("feed timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

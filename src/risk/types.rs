use serde::Serialize;
use serde_json::Value as JsonValue;

/// Types of behavioral findings the extractors can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    HighVelocity,
    RapidDrainage,
    NewAddressHighValue,
    GasAnomaly,
    MixerInteraction,
    SuspiciousMethod,
    CircularPattern,
    AutomatedBehavior,
    BurstPattern,
    #[serde(rename = "front_running_suspected")]
    FrontRunning,
    SandwichAttack,
    GasWar,
    ExploitExecution,
    CensorshipEvasion,
    MevActivity,
}

impl FlagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighVelocity => "high_velocity",
            Self::RapidDrainage => "rapid_drainage",
            Self::NewAddressHighValue => "new_address_high_value",
            Self::GasAnomaly => "gas_anomaly",
            Self::MixerInteraction => "mixer_interaction",
            Self::SuspiciousMethod => "suspicious_method",
            Self::CircularPattern => "circular_pattern",
            Self::AutomatedBehavior => "automated_behavior",
            Self::BurstPattern => "burst_pattern",
            Self::FrontRunning => "front_running_suspected",
            Self::SandwichAttack => "sandwich_attack",
            Self::GasWar => "gas_war",
            Self::ExploitExecution => "exploit_execution",
            Self::CensorshipEvasion => "censorship_evasion",
            Self::MevActivity => "mev_activity",
        }
    }
}

/// A single typed finding. Severity is clamped to [0, 1] at construction.
#[derive(Debug, Clone, Serialize)]
pub struct BehavioralFlag {
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub severity: f64,
    pub description: String,
    pub evidence: JsonValue,
}

impl BehavioralFlag {
    pub fn new(
        flag_type: FlagType,
        severity: f64,
        description: impl Into<String>,
        evidence: JsonValue,
    ) -> Self {
        Self {
            flag_type,
            severity: clamp_unit(severity),
            description: description.into(),
            evidence,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatisticalScores {
    pub benford: f64,
    pub velocity: f64,
    pub entropy: f64,
    pub clustering: f64,
    pub temporal_anomaly: f64,
}

impl StatisticalScores {
    pub fn clamped(self) -> Self {
        Self {
            benford: clamp_unit(self.benford),
            velocity: clamp_unit(self.velocity),
            entropy: clamp_unit(self.entropy),
            clustering: clamp_unit(self.clustering),
            temporal_anomaly: clamp_unit(self.temporal_anomaly),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::Minimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
        }
    }
}

/// Complete output of one analysis. Built once, never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAnalysisResult {
    pub address: String,
    pub risk_score: f64,
    pub confidence: f64,
    pub risk_tier: RiskTier,
    pub behavioral_flags: Vec<BehavioralFlag>,
    pub statistical_scores: StatisticalScores,
    pub real_time_flags: Vec<String>,
    pub recommendations: Vec<String>,
    pub detailed_analysis: JsonValue,
}

impl RiskAnalysisResult {
    pub fn flag_count(&self, flag_type: FlagType) -> usize {
        self.behavioral_flags
            .iter()
            .filter(|f| f.flag_type == flag_type)
            .count()
    }

    pub fn has_flag(&self, flag_type: FlagType) -> bool {
        self.flag_count(flag_type) > 0
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(0.8), RiskTier::Critical);
        assert_eq!(RiskTier::from_score(0.79), RiskTier::High);
        assert_eq!(RiskTier::from_score(0.6), RiskTier::High);
        assert_eq!(RiskTier::from_score(0.4), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.2), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.19), RiskTier::Minimal);
    }

    #[test]
    fn test_flag_severity_clamped() {
        let flag = BehavioralFlag::new(FlagType::HighVelocity, 2.5, "x", JsonValue::Null);
        assert_eq!(flag.severity, 1.0);
        let flag = BehavioralFlag::new(FlagType::HighVelocity, f64::NAN, "x", JsonValue::Null);
        assert_eq!(flag.severity, 0.0);
    }

    #[test]
    fn test_flag_serializes_type_tag() {
        let flag = BehavioralFlag::new(FlagType::FrontRunning, 0.85, "x", JsonValue::Null);
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["type"], "front_running_suspected");
        assert_eq!(json["type"], FlagType::FrontRunning.as_str());
    }
}

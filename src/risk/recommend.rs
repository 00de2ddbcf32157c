use std::collections::HashSet;

use super::types::{BehavioralFlag, FlagType, RiskTier};

fn tier_message(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical => {
            "CRITICAL: This address shows multiple high-risk indicators. Avoid interaction."
        }
        RiskTier::High => "HIGH RISK: Exercise extreme caution with this address.",
        RiskTier::Medium => "MEDIUM RISK: Some suspicious patterns detected. Monitor this address closely.",
        RiskTier::Low => "LOW RISK: Minor anomalies detected. Maintain standard precautions.",
        RiskTier::Minimal => "MINIMAL RISK: No significant suspicious patterns detected.",
    }
}

fn flag_message(flag_type: FlagType) -> Option<&'static str> {
    match flag_type {
        FlagType::MixerInteraction => {
            Some("Consider blockchain analysis tools to trace fund origins.")
        }
        FlagType::HighVelocity => Some("Monitor for potential automated attack patterns."),
        FlagType::NewAddressHighValue => {
            Some("Verify the legitimacy of this newly active address.")
        }
        _ => None,
    }
}

/// Tier message first, then one follow-up per distinct flag type in flag order.
pub fn recommendations(tier: RiskTier, flags: &[BehavioralFlag]) -> Vec<String> {
    let mut out = vec![tier_message(tier).to_string()];
    let mut seen: HashSet<FlagType> = HashSet::new();

    for flag in flags {
        if !seen.insert(flag.flag_type) {
            continue;
        }
        if let Some(message) = flag_message(flag.flag_type) {
            out.push(message.to_string());
        }
    }

    out
}

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Attribution details for an address tied to a known exploit.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HackerInfo {
    pub name: String,
    #[serde(default)]
    pub amount_stolen: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub hack_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Exchange,
    Mixer,
    Hacker,
    Contract,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exchange => "Exchange",
            Self::Mixer => "Mixer",
            Self::Hacker => "Known Hacker",
            Self::Contract => "Contract",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressLabel {
    pub kind: LabelKind,
    pub name: String,
}

impl fmt::Display for AddressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.name)
    }
}

/// On-disk `known_addresses.json` layout.
#[derive(Debug, Default, Deserialize)]
struct KnowledgeBaseFile {
    #[serde(default)]
    exchanges: HashMap<String, String>,
    #[serde(default)]
    mixers: HashMap<String, String>,
    #[serde(default)]
    hackers: HashMap<String, HackerInfo>,
    #[serde(default)]
    contracts: HashMap<String, String>,
}

/// Read-only address attribution tables keyed by lower-cased address.
/// Constructed explicitly and passed into each analysis.
#[derive(Debug, Clone, Default)]
pub struct AddressKnowledgeBase {
    exchanges: HashMap<String, String>,
    mixers: HashMap<String, String>,
    hackers: HashMap<String, HackerInfo>,
    contracts: HashMap<String, String>,
}

impl AddressKnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a JSON file. Any failure degrades to an empty knowledge base.
    pub fn load_from_file(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path, error = %e, "Knowledge base file unavailable, continuing without");
                return Self::empty();
            }
        };

        match Self::from_json(&content) {
            Ok(kb) => {
                tracing::info!(
                    path,
                    exchanges = kb.exchanges.len(),
                    mixers = kb.mixers.len(),
                    hackers = kb.hackers.len(),
                    contracts = kb.contracts.len(),
                    "Loaded address knowledge base"
                );
                kb
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Failed to parse knowledge base, continuing without");
                Self::empty()
            }
        }
    }

    pub fn from_json(content: &str) -> eyre::Result<Self> {
        let file: KnowledgeBaseFile = serde_json::from_str(content)
            .map_err(|e| eyre::eyre!("Failed to parse knowledge base JSON: {}", e))?;

        Ok(Self {
            exchanges: normalize_keys(file.exchanges, "exchanges"),
            mixers: normalize_keys(file.mixers, "mixers"),
            hackers: normalize_keys(file.hackers, "hackers"),
            contracts: normalize_keys(file.contracts, "contracts"),
        })
    }

    pub fn insert_exchange(&mut self, address: &str, name: &str) {
        self.exchanges
            .insert(address.to_ascii_lowercase(), name.to_string());
    }

    pub fn insert_mixer(&mut self, address: &str, name: &str) {
        self.mixers
            .insert(address.to_ascii_lowercase(), name.to_string());
    }

    pub fn insert_hacker(&mut self, address: &str, info: HackerInfo) {
        self.hackers.insert(address.to_ascii_lowercase(), info);
    }

    pub fn insert_contract(&mut self, address: &str, label: &str) {
        self.contracts
            .insert(address.to_ascii_lowercase(), label.to_string());
    }

    /// First matching label, checked exchange, mixer, hacker, contract.
    pub fn classify(&self, address: &str) -> Option<AddressLabel> {
        let key = address.to_ascii_lowercase();
        if let Some(name) = self.exchanges.get(&key) {
            return Some(AddressLabel {
                kind: LabelKind::Exchange,
                name: name.clone(),
            });
        }
        if let Some(name) = self.mixers.get(&key) {
            return Some(AddressLabel {
                kind: LabelKind::Mixer,
                name: name.clone(),
            });
        }
        if let Some(info) = self.hackers.get(&key) {
            return Some(AddressLabel {
                kind: LabelKind::Hacker,
                name: info.name.clone(),
            });
        }
        self.contracts.get(&key).map(|label| AddressLabel {
            kind: LabelKind::Contract,
            name: label.clone(),
        })
    }

    pub fn mixer(&self, address: &str) -> Option<&str> {
        self.mixers
            .get(&address.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn hacker(&self, address: &str) -> Option<&HackerInfo> {
        self.hackers.get(&address.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.exchanges.len() + self.mixers.len() + self.hackers.len() + self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lower-case keys, dropping entries that are not valid addresses.
fn normalize_keys<V>(table: HashMap<String, V>, table_name: &str) -> HashMap<String, V> {
    let mut out = HashMap::with_capacity(table.len());
    for (address, value) in table {
        match Address::from_str(address.trim()) {
            Ok(_) => {
                out.insert(address.trim().to_ascii_lowercase(), value);
            }
            Err(e) => {
                tracing::warn!(
                    table = table_name,
                    address = %address,
                    error = %e,
                    "Invalid address in knowledge base, skipping"
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TORNADO: &str = "0x722122dF12D4e14e13Ac3b6895a86e84145b6967";
    const BINANCE: &str = "0x28C6c06298d514Db089934071355E5743bf21d60";

    fn sample_json() -> String {
        format!(
            r#"{{
                "exchanges": {{ "{BINANCE}": "Binance 14" }},
                "mixers": {{ "{TORNADO}": "Tornado Cash Router", "not-an-address": "junk" }},
                "hackers": {{
                    "0x098b716b8aaf21512996dc57eb0615e2383e2f96": {{
                        "name": "Ronin Bridge Exploiter",
                        "amount_stolen": "173600 ETH",
                        "date": "2022-03-23",
                        "hack_type": "bridge"
                    }}
                }}
            }}"#
        )
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let kb = AddressKnowledgeBase::from_json(&sample_json()).unwrap();
        let label = kb.classify(&TORNADO.to_uppercase().replace("0X", "0x")).unwrap();
        assert_eq!(label.kind, LabelKind::Mixer);
        assert_eq!(label.to_string(), "Mixer: Tornado Cash Router");
        assert_eq!(kb.mixer(&TORNADO.to_ascii_lowercase()), Some("Tornado Cash Router"));
    }

    #[test]
    fn test_invalid_keys_are_skipped() {
        let kb = AddressKnowledgeBase::from_json(&sample_json()).unwrap();
        assert_eq!(kb.len(), 3);
        assert!(kb.classify("not-an-address").is_none());
    }

    #[test]
    fn test_hacker_lookup() {
        let kb = AddressKnowledgeBase::from_json(&sample_json()).unwrap();
        let info = kb
            .hacker("0x098B716B8Aaf21512996dC57EB0615e2383E2f96")
            .unwrap();
        assert_eq!(info.hack_type, "bridge");
        assert_eq!(
            kb.classify(BINANCE).map(|l| l.kind),
            Some(LabelKind::Exchange)
        );
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let kb = AddressKnowledgeBase::load_from_file("/nonexistent/known_addresses.json");
        assert!(kb.is_empty());
        assert!(kb.classify(TORNADO).is_none());
    }

    #[test]
    fn test_malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_addresses.json");
        std::fs::write(&path, "{ not json").unwrap();
        let kb = AddressKnowledgeBase::load_from_file(path.to_str().unwrap());
        assert!(kb.is_empty());
    }
}

use std::collections::HashSet;

use crate::entity::AddressKnowledgeBase;
use crate::feed::Transaction;

pub const NO_HISTORY: &str = "No transaction history found";

/// Observations from the knowledge base and the raw history that feed the
/// aggregator as plain strings.
pub fn real_time_flags(
    address: &str,
    transactions: &[Transaction],
    knowledge_base: &AddressKnowledgeBase,
) -> Vec<String> {
    let mut flags = Vec::new();

    if let Some(label) = knowledge_base.classify(address) {
        flags.push(format!("Known label: {}", label));
    }

    let failed = transactions.iter().filter(|tx| tx.is_error).count();
    if failed > transactions.len() / 4 {
        flags.push(format!(
            "High failure rate: {}/{} transactions failed",
            failed,
            transactions.len()
        ));
    }

    let created = transactions
        .iter()
        .filter(|tx| tx.contract_address_created.is_some())
        .count();
    if created > 0 {
        flags.push(format!("Created {} contracts", created));
    }

    let mut checked: HashSet<&str> = HashSet::new();
    for tx in transactions {
        let other = tx.counterparty(address);
        if other.is_empty() || !checked.insert(other) {
            continue;
        }
        if let Some(info) = knowledge_base.hacker(other) {
            let short = other.get(..10).unwrap_or(other);
            flags.push(format!(
                "Interacted with known hacker: {} ({}...)",
                info.name, short
            ));
        }
    }

    flags
}

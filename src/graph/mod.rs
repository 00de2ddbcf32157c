pub mod cluster;
pub mod cycle;

use crate::feed::Transaction;
use std::collections::{BTreeMap, BTreeSet};

pub use cluster::clustering_coefficient;
pub use cycle::has_cycle;

/// Directed transfer graph over the addresses in one history, with an
/// undirected view for neighborhood queries.
///
/// Transactions with an empty endpoint are ignored. A self-send is a
/// directed edge (a one-node cycle) but never its own neighbor.
#[derive(Debug, Default, Clone)]
pub struct TransferGraph {
    order: Vec<String>,
    successors: BTreeMap<String, Vec<String>>,
    neighbors: BTreeMap<String, BTreeSet<String>>,
}

impl TransferGraph {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut graph = Self::default();
        for tx in transactions {
            graph.add_edge(&tx.from, &tx.to);
        }
        graph
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from.is_empty() || to.is_empty() {
            return;
        }
        self.touch(from);
        self.touch(to);

        if let Some(succ) = self.successors.get_mut(from) {
            if !succ.iter().any(|s| s == to) {
                succ.push(to.to_string());
            }
        }
        if from == to {
            return;
        }
        if let Some(n) = self.neighbors.get_mut(from) {
            n.insert(to.to_string());
        }
        if let Some(n) = self.neighbors.get_mut(to) {
            n.insert(from.to_string());
        }
    }

    fn touch(&mut self, node: &str) {
        if !self.neighbors.contains_key(node) {
            self.order.push(node.to_string());
            self.neighbors.insert(node.to_string(), BTreeSet::new());
            self.successors.insert(node.to_string(), Vec::new());
        }
    }

    /// Nodes in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn successors(&self, node: &str) -> &[String] {
        self.successors
            .get(node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn neighbors(&self, node: &str) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.neighbors.get(node).unwrap_or(&EMPTY)
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }
}

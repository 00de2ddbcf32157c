use super::TransferGraph;
use std::collections::HashSet;

/// Whether the directed transfer graph contains a cycle.
///
/// Iterative DFS with an explicit recursion stack; roots are visited in
/// first-appearance order so results are stable for a given history.
pub fn has_cycle(graph: &TransferGraph) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    for root in graph.nodes() {
        if visited.contains(root) {
            continue;
        }

        // (node, index of next successor to explore)
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        visited.insert(root);
        on_stack.insert(root);

        while let Some(top) = stack.last_mut() {
            let (node, idx) = *top;
            top.1 += 1;
            match graph.successors(node).get(idx) {
                Some(succ) => {
                    let succ = succ.as_str();
                    if on_stack.contains(succ) {
                        return true;
                    }
                    if visited.insert(succ) {
                        on_stack.insert(succ);
                        stack.push((succ, 0));
                    }
                }
                None => {
                    on_stack.remove(node);
                    stack.pop();
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> TransferGraph {
        let mut g = TransferGraph::default();
        for (from, to) in edges {
            g.add_edge(from, to);
        }
        g
    }

    #[test]
    fn test_triangle_is_cycle() {
        assert!(has_cycle(&graph(&[("a", "b"), ("b", "c"), ("c", "a")])));
    }

    #[test]
    fn test_chain_is_not_cycle() {
        assert!(!has_cycle(&graph(&[("a", "b"), ("b", "c"), ("c", "d")])));
    }

    #[test]
    fn test_diamond_is_not_cycle() {
        // Two paths converging on the same node revisit it without a back edge.
        assert!(!has_cycle(&graph(&[
            ("a", "b"),
            ("a", "c"),
            ("b", "d"),
            ("c", "d"),
        ])));
    }

    #[test]
    fn test_two_node_round_trip_is_cycle() {
        assert!(has_cycle(&graph(&[("a", "b"), ("b", "a")])));
    }

    #[test]
    fn test_self_send_is_cycle() {
        assert!(has_cycle(&graph(&[("a", "b"), ("b", "b")])));
    }
}

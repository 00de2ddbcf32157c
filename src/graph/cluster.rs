use super::TransferGraph;

/// Average local clustering coefficient of the undirected interaction graph,
/// over nodes with at least two neighbors. Returns 0.0 when no node qualifies.
pub fn clustering_coefficient(graph: &TransferGraph) -> f64 {
    let mut total = 0.0;
    let mut counted = 0usize;

    for node in graph.nodes() {
        let neighbors: Vec<&String> = graph.neighbors(node).iter().collect();
        let k = neighbors.len();
        if k < 2 {
            continue;
        }

        let mut triangles = 0usize;
        for i in 0..k {
            for j in (i + 1)..k {
                if graph.neighbors(neighbors[i]).contains(neighbors[j]) {
                    triangles += 1;
                }
            }
        }

        let possible = k * (k - 1) / 2;
        total += triangles as f64 / possible as f64;
        counted += 1;
    }

    if counted == 0 {
        0.0
    } else {
        total / counted as f64
    }
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
    fn test_triangle_is_fully_clustered() {
        let g = graph(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert!((clustering_coefficient(&g) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_star_has_no_clustering() {
        let g = graph(&[("hub", "a"), ("hub", "b"), ("hub", "c")]);
        assert_eq!(clustering_coefficient(&g), 0.0);
    }

    #[test]
    fn test_single_edge_has_no_qualifying_nodes() {
        let g = graph(&[("a", "b")]);
        assert_eq!(clustering_coefficient(&g), 0.0);
    }

    #[test]
    fn test_partial_clustering() {
        // hub sees a, b, c with only a-b closed: hub = 1/3, a = 1, b = 1
        let g = graph(&[("hub", "a"), ("hub", "b"), ("hub", "c"), ("a", "b")]);
        let expected = (1.0 / 3.0 + 1.0 + 1.0) / 3.0;
        assert!((clustering_coefficient(&g) - expected).abs() < 1e-9);
    }
}

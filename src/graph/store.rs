//! Sparse directed link graph
//!
//! Each vertex owns an ascending list of destination vertices and a parallel
//! list of transition probabilities. Keeping the rows as separate vectors
//! (rather than one CSR block) lets [`LinkGraph::make_undirected`] insert
//! mirror edges in place.

use super::{VertexId, UNIFORM_TOLERANCE};
use crate::error::{Error, Result};

/// A directed graph with per-edge transition probabilities
///
/// The graph is immutable after construction apart from two explicit
/// operations: [`set_outbound_transitions`](Self::set_outbound_transitions)
/// and [`make_undirected`](Self::make_undirected). `Clone` gives a full
/// defensive copy.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkGraph {
    /// Destination vertices per vertex, sorted ascending
    outbound: Vec<Vec<VertexId>>,
    /// Transition probabilities, parallel to `outbound`
    transitions: Vec<Vec<f32>>,
    /// Total number of directed edges
    num_edges: usize,
    /// Whether every row is `1 / out_degree`
    uniform: bool,
    /// Cleared once the graph has been symmetrized
    directed: bool,
}

impl Default for LinkGraph {
    fn default() -> Self {
        Self {
            outbound: Vec::new(),
            transitions: Vec::new(),
            num_edges: 0,
            uniform: true,
            directed: true,
        }
    }
}

impl LinkGraph {
    /// Build a graph from raw adjacency and weight arrays.
    ///
    /// Weight arrays whose rows all have at most one entry are treated as
    /// degenerate: uniform `1 / out_degree` rows are derived instead and
    /// the graph is flagged uniform. Otherwise the stored weights are
    /// trusted and must match the adjacency shape.
    ///
    /// Unsorted adjacency rows are sorted together with their weights so
    /// that binary search over a row is always valid.
    pub fn from_parts(outbound: Vec<Vec<VertexId>>, transitions: Vec<Vec<f32>>) -> Result<Self> {
        let n = outbound.len();

        for (v, row) in outbound.iter().enumerate() {
            if let Some(&bad) = row.iter().find(|&&t| t as usize >= n) {
                return Err(Error::CorruptGraph(format!(
                    "vertex {v} links to {bad}, but the graph has only {n} vertices"
                )));
            }
        }

        let degenerate = transitions.iter().all(|row| row.len() <= 1);

        let mut graph = if degenerate {
            let transitions = outbound.iter().map(|row| uniform_row(row.len())).collect();
            Self {
                outbound,
                transitions,
                num_edges: 0,
                uniform: true,
                directed: true,
            }
        } else {
            if transitions.len() != n {
                return Err(Error::CorruptGraph(format!(
                    "{} weight rows for {n} adjacency rows",
                    transitions.len()
                )));
            }
            for (v, (links, weights)) in outbound.iter().zip(&transitions).enumerate() {
                if links.len() != weights.len() {
                    return Err(Error::CorruptGraph(format!(
                        "vertex {v} has {} links but {} weights",
                        links.len(),
                        weights.len()
                    )));
                }
            }
            Self {
                outbound,
                transitions,
                num_edges: 0,
                uniform: false,
                directed: true,
            }
        };

        graph.sort_rows();
        graph.num_edges = graph.count_edges();
        if !degenerate {
            graph.uniform = graph.detect_uniform();
        }
        Ok(graph)
    }

    /// Assemble a graph from rows that are already sorted and consistent.
    pub(crate) fn from_sorted_parts(
        outbound: Vec<Vec<VertexId>>,
        transitions: Vec<Vec<f32>>,
    ) -> Self {
        let mut graph = Self {
            outbound,
            transitions,
            num_edges: 0,
            uniform: false,
            directed: true,
        };
        graph.num_edges = graph.count_edges();
        graph.uniform = graph.detect_uniform();
        graph
    }

    /// Number of vertices
    pub fn num_vertices(&self) -> usize {
        self.outbound.len()
    }

    /// Number of directed edges
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Check if the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty()
    }

    /// Whether every vertex spreads its mass evenly over its out-links
    pub fn is_uniform_transition(&self) -> bool {
        self.uniform
    }

    /// False once [`make_undirected`](Self::make_undirected) has run
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Destination vertices of `v`; empty for sinks and out-of-range IDs
    pub fn outbound(&self, v: VertexId) -> &[VertexId] {
        self.outbound.get(v as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transition probabilities of `v`, parallel to [`outbound`](Self::outbound)
    pub fn transitions(&self, v: VertexId) -> &[f32] {
        self.transitions.get(v as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Out-degree of `v` (0 for out-of-range IDs)
    pub fn out_degree(&self, v: VertexId) -> usize {
        self.outbound(v).len()
    }

    /// Check if `v` is a sink (no outgoing edges)
    pub fn is_sink(&self, v: VertexId) -> bool {
        self.out_degree(v) == 0
    }

    /// Number of sink vertices
    pub fn num_sinks(&self) -> usize {
        self.outbound.iter().filter(|row| row.is_empty()).count()
    }

    /// Check if there is an edge `from -> to`
    pub fn has_edge(&self, from: VertexId, to: VertexId) -> bool {
        self.outbound(from).binary_search(&to).is_ok()
    }

    /// Whether every adjacency row is sorted ascending
    pub fn is_sorted(&self) -> bool {
        self.outbound
            .iter()
            .all(|row| row.windows(2).all(|pair| pair[0] <= pair[1]))
    }

    /// Replace the transition probabilities of one vertex.
    ///
    /// Used to inject externally computed weights (e.g. text similarity).
    /// The values must have exactly one entry per outbound link; otherwise
    /// the graph is left unchanged and an error is returned.
    pub fn set_outbound_transitions(&mut self, v: VertexId, values: Vec<f32>) -> Result<()> {
        let Some(links) = self.outbound.get(v as usize) else {
            tracing::warn!(vertex = v, "transition replacement for unknown vertex ignored");
            return Err(Error::VertexOutOfRange {
                vertex: v,
                num_vertices: self.num_vertices(),
            });
        };

        if links.len() != values.len() {
            tracing::warn!(
                vertex = v,
                expected = links.len(),
                actual = values.len(),
                "transition replacement has the wrong length, ignored"
            );
            return Err(Error::ShapeMismatch {
                vertex: v,
                expected: links.len(),
                actual: values.len(),
            });
        }

        self.transitions[v as usize] = values;
        self.uniform = self.detect_uniform();
        Ok(())
    }

    /// Symmetrize the graph in place.
    ///
    /// For every edge `u -> v` without a mirror `v -> u`, the mirror is
    /// inserted into `v`'s sorted row. All rows are then reset to uniform
    /// transitions. This cannot be undone.
    pub fn make_undirected(&mut self) {
        if !self.directed {
            return;
        }

        let mut missing: Vec<(VertexId, VertexId)> = Vec::new();
        for (u, row) in self.outbound.iter().enumerate() {
            let u = u as VertexId;
            for &v in row {
                if self.outbound[v as usize].binary_search(&u).is_err() {
                    missing.push((v, u));
                }
            }
        }

        let added = missing.len();
        for (v, u) in missing {
            let row = &mut self.outbound[v as usize];
            if let Err(pos) = row.binary_search(&u) {
                row.insert(pos, u);
            }
        }

        self.transitions = self.outbound.iter().map(|row| uniform_row(row.len())).collect();
        self.num_edges = self.count_edges();
        self.uniform = true;
        self.directed = false;

        tracing::debug!(mirrors = added, edges = self.num_edges, "graph symmetrized");
    }

    fn count_edges(&self) -> usize {
        self.outbound.iter().map(Vec::len).sum()
    }

    fn detect_uniform(&self) -> bool {
        self.transitions.iter().all(|row| row_is_uniform(row))
    }

    fn sort_rows(&mut self) {
        let mut repaired = 0usize;
        for (links, weights) in self.outbound.iter_mut().zip(self.transitions.iter_mut()) {
            if links.windows(2).all(|pair| pair[0] <= pair[1]) {
                continue;
            }
            let mut pairs: Vec<(VertexId, f32)> =
                links.iter().copied().zip(weights.iter().copied()).collect();
            pairs.sort_by_key(|&(t, _)| t);
            *links = pairs.iter().map(|&(t, _)| t).collect();
            *weights = pairs.iter().map(|&(_, w)| w).collect();
            repaired += 1;
        }
        if repaired > 0 {
            tracing::warn!(rows = repaired, "unsorted adjacency rows were sorted on load");
        }
    }
}

/// `1 / len` repeated `len` times
pub(crate) fn uniform_row(len: usize) -> Vec<f32> {
    if len == 0 {
        Vec::new()
    } else {
        vec![1.0 / len as f32; len]
    }
}

fn row_is_uniform(row: &[f32]) -> bool {
    if row.is_empty() {
        return true;
    }
    let expected = 1.0 / row.len() as f32;
    row.iter().all(|&w| (w - expected).abs() <= UNIFORM_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::toy_graph;

    #[test]
    fn test_basic_accessors() {
        let graph = toy_graph();

        assert_eq!(graph.num_vertices(), 6);
        assert_eq!(graph.num_edges(), 14);
        assert_eq!(graph.outbound(1), &[0, 2, 3, 5]);
        assert_eq!(graph.transitions(2), &[0.5, 0.5]);
        assert_eq!(graph.out_degree(5), 3);
        assert!(graph.is_directed());
        assert!(graph.has_edge(3, 4));
        assert!(!graph.has_edge(4, 0));
    }

    #[test]
    fn test_out_of_range_accessors_are_empty() {
        let graph = toy_graph();

        assert!(graph.outbound(6).is_empty());
        assert!(graph.transitions(100).is_empty());
        assert_eq!(graph.out_degree(u32::MAX), 0);
    }

    #[test]
    fn test_uniform_detection() {
        // 0.333/0.333/0.334 is not uniform within tolerance
        assert!(!toy_graph().is_uniform_transition());

        let graph = LinkGraph::from_parts(
            vec![vec![1, 2], vec![0], vec![]],
            vec![vec![0.5, 0.5], vec![1.0], vec![]],
        )
        .unwrap();
        assert!(graph.is_uniform_transition());
    }

    #[test]
    fn test_degenerate_weights_are_rederived() {
        let graph =
            LinkGraph::from_parts(vec![vec![1, 2, 3], vec![0], vec![], vec![0, 1]], vec![])
                .unwrap();

        assert!(graph.is_uniform_transition());
        assert_eq!(graph.transitions(0).len(), 3);
        assert!((graph.transitions(0)[0] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(graph.transitions(3), &[0.5, 0.5]);
        assert!(graph.transitions(2).is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_corrupt() {
        let result = LinkGraph::from_parts(
            vec![vec![1, 2], vec![0]],
            vec![vec![0.2, 0.3, 0.5], vec![1.0]],
        );
        assert!(matches!(result, Err(Error::CorruptGraph(_))));
    }

    #[test]
    fn test_dangling_destination_is_corrupt() {
        let result = LinkGraph::from_parts(vec![vec![5]], vec![]);
        assert!(matches!(result, Err(Error::CorruptGraph(_))));
    }

    #[test]
    fn test_unsorted_rows_are_sorted_with_weights() {
        let graph = LinkGraph::from_parts(
            vec![vec![2, 0, 1], vec![], vec![]],
            vec![vec![0.6, 0.1, 0.3], vec![], vec![]],
        )
        .unwrap();

        assert!(graph.is_sorted());
        assert_eq!(graph.outbound(0), &[0, 1, 2]);
        assert_eq!(graph.transitions(0), &[0.1, 0.3, 0.6]);
    }

    #[test]
    fn test_set_outbound_transitions() {
        let mut graph = toy_graph();

        graph.set_outbound_transitions(2, vec![0.9, 0.1]).unwrap();
        assert_eq!(graph.transitions(2), &[0.9, 0.1]);
    }

    #[test]
    fn test_set_outbound_transitions_rejects_wrong_length() {
        let mut graph = toy_graph();
        let before = graph.clone();

        let result = graph.set_outbound_transitions(1, vec![0.5, 0.5]);
        assert!(matches!(
            result,
            Err(Error::ShapeMismatch { vertex: 1, expected: 4, actual: 2 })
        ));
        assert_eq!(graph, before);

        let result = graph.set_outbound_transitions(99, vec![]);
        assert!(matches!(result, Err(Error::VertexOutOfRange { .. })));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_make_undirected() {
        let mut graph = toy_graph();
        graph.make_undirected();

        assert!(!graph.is_directed());
        assert!(graph.is_uniform_transition());
        assert!(graph.is_sorted());

        for u in 0..graph.num_vertices() as VertexId {
            for &v in graph.outbound(u) {
                assert!(graph.has_edge(v, u), "missing mirror {v} -> {u}");
            }
            let sum: f32 = graph.transitions(u).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }

        // 0->3/3->0, 1->2/2->1, 1->3 (3->1 added), 1->5/5->1, 2->3 (3->2 added),
        // 1->0 (0->1 added), 3->4/4->3, 4->1 (1->4 added), 5->2 (2->5 added),
        // 5->4 (4->5 added)
        assert_eq!(graph.num_edges(), 20);
        assert_eq!(graph.outbound(0), &[1, 3]);
    }

    #[test]
    fn test_make_undirected_is_one_way() {
        let mut graph = toy_graph();
        graph.make_undirected();
        let once = graph.clone();
        graph.make_undirected();
        assert_eq!(graph, once);
    }

    #[test]
    fn test_clone_is_independent() {
        let graph = toy_graph();
        let mut copy = graph.clone();
        copy.set_outbound_transitions(0, vec![1.0]).unwrap();
        copy.make_undirected();

        assert!(graph.is_directed());
        assert_eq!(graph.outbound(0), &[3]);
    }

    #[test]
    fn test_sinks() {
        let graph = LinkGraph::from_parts(vec![vec![1], vec![], vec![0, 1]], vec![]).unwrap();
        assert_eq!(graph.num_sinks(), 1);
        assert!(graph.is_sink(1));
        assert!(!graph.is_sink(2));
    }
}

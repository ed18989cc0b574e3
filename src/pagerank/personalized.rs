//! Personalized PageRank (PPR)
//!
//! PPR uses a seed-concentrated jump vector instead of uniform
//! teleportation. Unlike Sourced PageRank there is no baseline subtraction
//! and no log rescaling: the result is the stationary distribution of a
//! walk that keeps restarting at the seeds.

use serde::{Deserialize, Serialize};

use super::engine::{iterate, Damping, IterationParams, Teleport, Transitions};
use super::PageRankResult;
use crate::error::Result;
use crate::graph::store::LinkGraph;
use crate::seeds::SeedSet;

/// Jump-vector model for [`PersonalizedPageRank`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PprMode {
    /// `X' = alpha·(XP + D/N) + (1 − alpha)·w`
    ///
    /// Sink mass `D` is spread uniformly over the whole graph (the global
    /// random surfer), and the seeds receive the damped jump. Converges for
    /// any `alpha < 1`.
    #[default]
    Approximate,
    /// `X' = alpha·XP + (alpha·D + 1 − alpha)·w`
    ///
    /// No uniform redistribution at all: the jump vector is `w` and sink
    /// mass goes straight back to the seeds along with the jump mass. This
    /// is a restart chain, so it converges for any `alpha < 1` and keeps
    /// the total at one.
    Exact,
}

/// Personalized PageRank implementation
#[derive(Debug, Clone)]
pub struct PersonalizedPageRank {
    /// Propagation / jump split (propagation typically 0.85)
    pub damping: Damping,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// L1 convergence threshold
    pub threshold: f64,
    /// Jump-vector model
    pub mode: PprMode,
    /// Transition model used for propagation
    pub transitions: Transitions,
}

impl Default for PersonalizedPageRank {
    fn default() -> Self {
        Self {
            damping: Damping::default(),
            max_iterations: 500,
            threshold: 0.002,
            mode: PprMode::Approximate,
            transitions: Transitions::Weighted,
        }
    }
}

impl PersonalizedPageRank {
    /// Create a new PersonalizedPageRank with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the propagation weight
    pub fn with_damping(mut self, propagation: f64) -> Self {
        self.damping = Damping::from_propagation(propagation);
        self
    }

    /// Set the maximum iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the jump-vector model
    pub fn with_mode(mut self, mode: PprMode) -> Self {
        self.mode = mode;
        self
    }

    /// Choose the transition model
    pub fn with_transitions(mut self, transitions: Transitions) -> Self {
        self.transitions = transitions;
        self
    }

    /// Run Personalized PageRank from the given seeds
    pub fn run(&self, graph: &LinkGraph, seeds: &SeedSet) -> Result<PageRankResult> {
        let n = graph.num_vertices();
        seeds.check_bounds(n)?;
        if n == 0 {
            return Ok(PageRankResult::new(vec![], 0, 0.0, true));
        }

        let _span =
            tracing::debug_span!("personalized_pagerank", seeds = seeds.len(), mode = ?self.mode)
                .entered();

        let personalization = seeds.to_dense(n);
        let params = IterationParams {
            damping: self.damping,
            transitions: self.transitions,
            threshold: self.threshold,
            max_iterations: self.max_iterations,
            renormalize: false,
        };
        let teleport = match self.mode {
            PprMode::Approximate => Teleport::Fixed(&personalization),
            PprMode::Exact => Teleport::SeedRestart(&personalization),
        };

        Ok(iterate(graph, teleport, personalization.clone(), &params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::graph::builder::GraphBuilder;
    use crate::graph::toy_graph;
    use approx::assert_abs_diff_eq;

    fn build_line_graph() -> LinkGraph {
        // A -- B -- C, links in both directions
        GraphBuilder::from_edges([(0, 1, 1.0), (1, 0, 1.0), (1, 2, 1.0), (2, 1, 1.0)])
            .unwrap()
            .build()
    }

    #[test]
    fn test_uniform_seeds_equal_standard() {
        let graph = build_line_graph();

        let standard = crate::pagerank::standard::StandardPageRank::new()
            .with_threshold(1e-9)
            .run(&graph);
        let ppr = PersonalizedPageRank::new()
            .with_threshold(1e-9)
            .run(&graph, &SeedSet::uniform(&[0, 1, 2]).unwrap())
            .unwrap();

        for (s, p) in standard.scores.iter().zip(ppr.scores.iter()) {
            assert_abs_diff_eq!(s, p, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_seed_is_favoured() {
        let graph = build_line_graph();
        let result = PersonalizedPageRank::new()
            .run(&graph, &SeedSet::single(0))
            .unwrap();

        assert!(result.converged);
        assert!(result.scores[0] > result.scores[2]);
    }

    #[test]
    fn test_weighted_seeds() {
        let graph = build_line_graph();
        let result = PersonalizedPageRank::new()
            .run(&graph, &SeedSet::weighted(&[0, 2], &[0.2, 0.8]).unwrap())
            .unwrap();

        assert!(result.scores[2] > result.scores[0]);
    }

    #[test]
    fn test_approximate_keeps_unit_mass() {
        let graph = toy_graph();
        let result = PersonalizedPageRank::new()
            .run(&graph, &SeedSet::single(1))
            .unwrap();

        assert_abs_diff_eq!(result.total(), 1.0, epsilon = 1e-9);
        assert!(result.scores.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_modes_differ_only_with_sinks() {
        // No sinks in the toy graph: both models coincide
        let graph = toy_graph();
        let seeds = SeedSet::single(1);
        let approx = PersonalizedPageRank::new().run(&graph, &seeds).unwrap();
        let exact = PersonalizedPageRank::new()
            .with_mode(PprMode::Exact)
            .run(&graph, &seeds)
            .unwrap();
        assert_eq!(approx, exact);

        // 0 -> 1 -> 2, 2 is a sink; 3 is isolated
        let chain =
            LinkGraph::from_parts(vec![vec![1], vec![2], vec![], vec![]], vec![]).unwrap();

        let seeds = SeedSet::single(0);
        let approx = PersonalizedPageRank::new().run(&chain, &seeds).unwrap();
        let exact = PersonalizedPageRank::new()
            .with_mode(PprMode::Exact)
            .run(&chain, &seeds)
            .unwrap();

        // Exact never reaches vertices the seeds cannot reach
        assert_eq!(exact.scores[3], 0.0);
        assert!(approx.scores[3] > 0.0);
        assert!(exact.scores[0] > approx.scores[0]);
    }

    #[test]
    fn test_exact_converges_through_sinks() {
        // 0 -> 1 -> 2, 2 is a sink that restarts at the seed; 3 is isolated
        let chain =
            LinkGraph::from_parts(vec![vec![1], vec![2], vec![], vec![]], vec![]).unwrap();
        let alpha: f64 = 0.95;
        let result = PersonalizedPageRank::new()
            .with_mode(PprMode::Exact)
            .with_damping(alpha)
            .with_threshold(1e-10)
            .with_max_iterations(5000)
            .run(&chain, &SeedSet::single(0))
            .unwrap();

        assert!(result.converged);
        let x0 = (1.0 - alpha) / (1.0 - alpha.powi(3));
        assert_abs_diff_eq!(result.scores[0], x0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.scores[1], alpha * x0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.scores[2], alpha * alpha * x0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.total(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_seed() {
        let graph = build_line_graph();
        let result = PersonalizedPageRank::new().run(&graph, &SeedSet::single(3));
        assert!(matches!(result, Err(Error::VertexOutOfRange { .. })));
    }

    #[test]
    fn test_empty_graph() {
        let graph = LinkGraph::default();
        let result = PersonalizedPageRank::new().run(&graph, &SeedSet::single(0));
        assert!(matches!(result, Err(Error::VertexOutOfRange { .. })));
    }
}

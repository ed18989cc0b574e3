//! Global PageRank
//!
//! Power iteration with a uniform jump vector and proper handling of
//! sinks. The result is the baseline distribution that every source-biased
//! variant is measured against.

use super::engine::{iterate, Damping, IterationParams, Teleport, Transitions};
use super::PageRankResult;
use crate::graph::store::LinkGraph;

/// Global PageRank implementation
#[derive(Debug, Clone)]
pub struct StandardPageRank {
    /// Propagation / jump split (propagation typically 0.85)
    pub damping: Damping,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// L1 convergence threshold
    pub threshold: f64,
    /// Stored weights or uniform `1 / out_degree`
    pub transitions: Transitions,
}

impl Default for StandardPageRank {
    fn default() -> Self {
        Self {
            damping: Damping::default(),
            max_iterations: 500,
            threshold: 0.001,
            transitions: Transitions::Weighted,
        }
    }
}

impl StandardPageRank {
    /// Create a new StandardPageRank with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform-transition PageRank: every out-link of a vertex is equally
    /// likely, whatever weights the graph stores
    pub fn uniform() -> Self {
        Self::default().with_transitions(Transitions::Uniform)
    }

    /// Set the propagation weight (the classic damping factor)
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

    /// Choose the transition model
    pub fn with_transitions(mut self, transitions: Transitions) -> Self {
        self.transitions = transitions;
        self
    }

    /// Run PageRank on a graph
    ///
    /// Returns the result even if convergence wasn't achieved, with `converged=false`.
    pub fn run(&self, graph: &LinkGraph) -> PageRankResult {
        let n = graph.num_vertices();
        if n == 0 {
            return PageRankResult::new(vec![], 0, 0.0, true);
        }

        let _span = tracing::info_span!("global_pagerank", transitions = ?self.transitions).entered();

        let uniform = vec![1.0 / n as f64; n];
        let params = IterationParams {
            damping: self.damping,
            transitions: self.transitions,
            threshold: self.threshold,
            max_iterations: self.max_iterations,
            renormalize: true,
        };

        iterate(graph, Teleport::Fixed(&uniform), uniform.clone(), &params)
    }

    /// Run PageRank ignoring stored edge weights
    pub fn run_uniform(&self, graph: &LinkGraph) -> PageRankResult {
        self.clone().with_transitions(Transitions::Uniform).run(graph)
    }
}

//! Sourced PageRank (SPR)
//!
//! A relatedness distribution relative to one or more seed vertices. The
//! walk mixes three forces every step: link propagation (weight `alpha`),
//! a uniform random surfer (weight `1 − alpha`, carrying the current total
//! mass), and the source vector `S = seeds − PR` scaled by `beta`.
//!
//! Because `S` sums to zero the iterate keeps unit mass, and the fixed point
//! is the global baseline `PR` shifted by `beta` times the damped Green
//! function of the seeds. The converged mass is finally rescaled by
//! `log10(1 / PR[j])`, which rewards globally rare vertices and suppresses
//! generically popular ones.
//!
//! The decoupled variant propagates with uniform `1 / out_degree`
//! transitions while the baseline may come from weighted transitions, so the
//! two stages can use different edge weightings.

use super::engine::{iterate, Damping, IterationParams, Teleport, Transitions};
use super::{rescale_by_baseline, PageRankResult};
use crate::error::{Error, Result};
use crate::graph::store::LinkGraph;
use crate::seeds::SeedSet;

/// Sourced PageRank implementation
#[derive(Debug, Clone)]
pub struct SourcedPageRank {
    /// Propagation / jump split (propagation typically 0.85)
    pub damping: Damping,
    /// Weight of the source vector
    pub beta: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// L1 convergence threshold
    pub threshold: f64,
    /// Transition model used for propagation
    pub transitions: Transitions,
}

impl Default for SourcedPageRank {
    fn default() -> Self {
        Self {
            damping: Damping::default(),
            beta: 0.5,
            max_iterations: 500,
            threshold: 0.002,
            transitions: Transitions::Weighted,
        }
    }
}

impl SourcedPageRank {
    /// Create a new SourcedPageRank with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoupled SPR: propagate with uniform transitions regardless of the
    /// weights the baseline was computed with
    pub fn decoupled() -> Self {
        Self {
            transitions: Transitions::Uniform,
            ..Self::default()
        }
    }

    /// Set the propagation weight
    pub fn with_damping(mut self, propagation: f64) -> Self {
        self.damping = Damping::from_propagation(propagation);
        self
    }

    /// Set the source-vector weight
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
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

    /// Whether propagation ignores stored weights
    pub fn is_decoupled(&self) -> bool {
        self.transitions == Transitions::Uniform
    }

    /// Converged sourced mass, before the baseline rescaling.
    ///
    /// With normalized seeds and a baseline summing to one, the entries sum
    /// to one (up to the convergence threshold). Otherwise the total still
    /// settles, at `1 + beta·ΣS / (1 − alpha)` where `S` is seeds minus
    /// baseline. This is the input of the restriction pass.
    pub fn run_mass(
        &self,
        graph: &LinkGraph,
        baseline: &[f64],
        seeds: &SeedSet,
    ) -> Result<PageRankResult> {
        let n = graph.num_vertices();
        if baseline.len() != n {
            return Err(Error::BaselineMismatch {
                expected: n,
                actual: baseline.len(),
            });
        }
        seeds.check_bounds(n)?;
        if n == 0 {
            return Ok(PageRankResult::new(vec![], 0, 0.0, true));
        }

        let _span = tracing::debug_span!(
            "sourced_pagerank",
            seeds = seeds.len(),
            decoupled = self.is_decoupled()
        )
        .entered();

        let mut source = seeds.to_dense(n);
        for (s, &pr) in source.iter_mut().zip(baseline) {
            *s -= pr;
        }

        let params = IterationParams {
            damping: self.damping,
            transitions: self.transitions,
            threshold: self.threshold,
            max_iterations: self.max_iterations,
            renormalize: false,
        };
        let teleport = Teleport::Sourced {
            source: &source,
            beta: self.beta,
        };

        Ok(iterate(graph, teleport, baseline.to_vec(), &params))
    }

    /// Relatedness of every vertex to the seeds
    ///
    /// `result.scores[j] = mass[j] · log10(1 / baseline[j])`. The seeds
    /// themselves go through the same formula as any other vertex.
    pub fn run(
        &self,
        graph: &LinkGraph,
        baseline: &[f64],
        seeds: &SeedSet,
    ) -> Result<PageRankResult> {
        let mut result = self.run_mass(graph, baseline, seeds)?;
        rescale_by_baseline(&mut result.scores, baseline);
        Ok(result)
    }
}

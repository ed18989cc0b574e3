//! Relatedness queries
//!
//! [`Relatedness`] is the surface consumed by term/vertex mapping layers.
//! [`RelatednessEngine`] implements it on top of a shared [`LinkGraph`] and
//! a baseline PageRank computed once at construction.
//!
//! The engine is immutable after construction. Every query allocates its
//! own iteration buffers, so one engine (typically behind an `Arc`) can
//! serve concurrent queries from any number of threads.

use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{EngineConfig, Variant};
use crate::error::{Error, Result};
use crate::graph::store::LinkGraph;
use crate::graph::VertexId;
use crate::pagerank::engine::{Damping, Transitions};
use crate::pagerank::personalized::{PersonalizedPageRank, PprMode};
use crate::pagerank::restrict::{restrict, RestrictedDistribution, VertexMask};
use crate::pagerank::sourced::SourcedPageRank;
use crate::pagerank::standard::StandardPageRank;
use crate::pagerank::{rescale_by_baseline, PageRankResult};
use crate::seeds::SeedSet;

/// Relatedness of graph vertices to one or more seed vertices
///
/// Only [`relatedness_from`](Self::relatedness_from) is required; the other
/// query forms reduce to it, so `relatedness_between(a, b)` is always
/// `relatedness(a)?.score(b)` and `relatedness_set(&[v])` is always
/// `relatedness(v)`.
pub trait Relatedness {
    /// Number of vertices in the underlying graph
    fn num_vertices(&self) -> usize;

    /// Relatedness distribution for an arbitrary seed set
    fn relatedness_from(&self, seeds: &SeedSet) -> Result<PageRankResult>;

    /// Relatedness distribution for a single seed
    fn relatedness(&self, seed: VertexId) -> Result<PageRankResult> {
        self.relatedness_from(&SeedSet::single(seed))
    }

    /// Relatedness of `target` to `seed` (0.0 if `target` is out of range)
    fn relatedness_between(&self, seed: VertexId, target: VertexId) -> Result<f64> {
        Ok(self.relatedness(seed)?.score(target))
    }

    /// Relatedness to a set of equally weighted seeds
    fn relatedness_set(&self, seeds: &[VertexId]) -> Result<PageRankResult> {
        self.relatedness_from(&SeedSet::uniform(seeds)?)
    }

    /// Relatedness to seeds with explicit weights (normalized to sum to one)
    fn relatedness_weighted(&self, seeds: &[VertexId], weights: &[f32]) -> Result<PageRankResult> {
        self.relatedness_from(&SeedSet::weighted(seeds, weights)?)
    }
}

/// A graph, its cached baseline and the configured relatedness variant
#[derive(Debug, Clone)]
pub struct RelatednessEngine {
    graph: Arc<LinkGraph>,
    baseline: Arc<PageRankResult>,
    config: EngineConfig,
}

impl RelatednessEngine {
    /// Validate `config` and compute the global baseline for `graph`.
    pub fn new(graph: LinkGraph, config: EngineConfig) -> Result<Self> {
        Self::with_shared_graph(Arc::new(graph), config)
    }

    /// Like [`new`](Self::new), for a graph already shared with others.
    pub fn with_shared_graph(graph: Arc<LinkGraph>, config: EngineConfig) -> Result<Self> {
        config.check()?;

        let baseline = StandardPageRank::new()
            .with_damping(config.alpha)
            .with_threshold(config.pagerank_threshold)
            .with_max_iterations(config.max_iterations)
            .with_transitions(config.baseline_transitions)
            .run(&graph)
            .ensure_converged()?;

        tracing::info!(
            vertices = graph.num_vertices(),
            iterations = baseline.iterations,
            variant = config.variant.as_str(),
            "baseline pagerank ready"
        );

        Ok(Self {
            graph,
            baseline: Arc::new(baseline),
            config,
        })
    }

    /// Reuse a baseline computed elsewhere (e.g. by another engine over the
    /// same graph).
    pub fn with_baseline(
        graph: Arc<LinkGraph>,
        baseline: PageRankResult,
        config: EngineConfig,
    ) -> Result<Self> {
        config.check()?;
        if baseline.len() != graph.num_vertices() {
            return Err(Error::BaselineMismatch {
                expected: graph.num_vertices(),
                actual: baseline.len(),
            });
        }
        Ok(Self {
            graph,
            baseline: Arc::new(baseline),
            config,
        })
    }

    /// The shared graph
    pub fn graph(&self) -> &Arc<LinkGraph> {
        &self.graph
    }

    /// The cached global PageRank
    pub fn baseline(&self) -> &PageRankResult {
        &self.baseline
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Destination vertices of `v` (empty when out of range)
    pub fn outbound(&self, v: VertexId) -> &[VertexId] {
        self.graph.outbound(v)
    }

    /// Transition probabilities of `v` (empty when out of range)
    pub fn transitions(&self, v: VertexId) -> &[f32] {
        self.graph.transitions(v)
    }

    /// Run many single-seed queries in parallel on the rayon pool.
    ///
    /// Results come back in input order; each query fails or succeeds on
    /// its own.
    pub fn relatedness_batch(&self, seeds: &[VertexId]) -> Vec<Result<PageRankResult>> {
        let _span = tracing::info_span!("relatedness_batch", queries = seeds.len()).entered();
        seeds.par_iter().map(|&seed| self.relatedness(seed)).collect()
    }

    /// Relatedness confined to the valid vertices of `mask`
    pub fn restricted_relatedness(
        &self,
        seeds: &SeedSet,
        mask: &VertexMask,
    ) -> Result<RestrictedDistribution> {
        let mass = self.run_mass(seeds)?;
        restrict(&self.graph, &mass.scores, mask, &self.baseline.scores)
    }

    /// Converged, un-rescaled mass of the configured variant
    fn run_mass(&self, seeds: &SeedSet) -> Result<PageRankResult> {
        let damping = Damping::from_propagation(self.config.alpha);
        let baseline = &self.baseline.scores;

        let result = match self.config.variant {
            Variant::Sourced | Variant::DecoupledSourced => {
                let spr = if self.config.variant == Variant::DecoupledSourced {
                    SourcedPageRank::decoupled()
                } else {
                    SourcedPageRank::new()
                };
                SourcedPageRank {
                    damping,
                    beta: self.config.beta,
                    threshold: self.config.sourced_threshold,
                    max_iterations: self.config.max_iterations,
                    ..spr
                }
                .run_mass(&self.graph, baseline, seeds)?
            }
            Variant::PersonalizedApproximate | Variant::PersonalizedExact => {
                let mode = if self.config.variant == Variant::PersonalizedExact {
                    PprMode::Exact
                } else {
                    PprMode::Approximate
                };
                PersonalizedPageRank {
                    damping,
                    threshold: self.config.sourced_threshold,
                    max_iterations: self.config.max_iterations,
                    mode,
                    transitions: Transitions::Weighted,
                }
                .run(&self.graph, seeds)?
            }
        };

        result.ensure_converged()
    }
}

impl Relatedness for RelatednessEngine {
    fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    fn relatedness_from(&self, seeds: &SeedSet) -> Result<PageRankResult> {
        let mut result = self.run_mass(seeds)?;
        if self.config.variant.is_sourced() {
            rescale_by_baseline(&mut result.scores, &self.baseline.scores);
        }
        Ok(result)
    }
}

//! Power-iteration engine
//!
//! Every PageRank variant in this crate is one instantiation of the same
//! fixed-point loop:
//!
//! 1. propagate the current mass `X` along out-edges into `Y`;
//! 2. collect the mass sitting on sinks (it would otherwise leak out);
//! 3. mix propagation, sink mass and the variant's [`Teleport`] term;
//! 4. stop once `‖X − X'‖₁` falls below the threshold, or the cap is hit.
//!
//! The engine holds no state between calls: buffers are allocated per run,
//! so one graph can serve any number of concurrent runs.

use serde::{Deserialize, Serialize};

use super::PageRankResult;
use crate::error::{Error, Result};
use crate::graph::store::LinkGraph;
use crate::graph::VertexId;

/// Split between following links and jumping
///
/// `propagation + jump == 1` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damping {
    propagation: f64,
    jump: f64,
}

impl Damping {
    /// Build from the propagation weight (the classic damping factor),
    /// clamped into `[0, 1]`
    pub fn from_propagation(propagation: f64) -> Self {
        let propagation = if propagation.is_nan() {
            0.0
        } else {
            propagation.clamp(0.0, 1.0)
        };
        Self {
            propagation,
            jump: 1.0 - propagation,
        }
    }

    /// Weight on mass following out-links (and sink redistribution)
    pub fn propagation(&self) -> f64 {
        self.propagation
    }

    /// Weight on the jump vector
    pub fn jump(&self) -> f64 {
        self.jump
    }
}

impl Default for Damping {
    fn default() -> Self {
        Self::from_propagation(0.85)
    }
}

/// Which transition probabilities drive propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transitions {
    /// The graph's stored per-edge probabilities
    #[default]
    Weighted,
    /// `1 / out_degree` for every edge, whatever is stored
    Uniform,
}

/// The per-iteration additive term that distinguishes the variants
#[derive(Debug, Clone, Copy)]
pub enum Teleport<'a> {
    /// `X'[x] = p·(Y[x] + rs) + j·J[x]`
    ///
    /// Global PageRank (uniform `J`) and approximate personalized PageRank
    /// (seed-concentrated `J`).
    Fixed(&'a [f64]),
    /// `X'[x] = p·(Y[x] + rs) + j / N + beta·S[x]`
    ///
    /// Sourced PageRank: a constant uniform jump, while `S` (seed weights
    /// minus the baseline) pulls the distribution toward the seeds. The
    /// total settles at `1 + beta·ΣS / j`.
    Sourced { source: &'a [f64], beta: f64 },
    /// `X'[x] = p·Y[x] + (p·D + j)·w[x]`, `D` the total sink mass
    ///
    /// Exact personalized PageRank: sink mass returns to the seeds instead
    /// of being spread uniformly.
    SeedRestart(&'a [f64]),
}

/// Knobs shared by all runs
#[derive(Debug, Clone, Copy)]
pub struct IterationParams {
    pub damping: Damping,
    pub transitions: Transitions,
    /// L1 convergence threshold
    pub threshold: f64,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Divide by the total after every iteration to cancel drift
    pub renormalize: bool,
}

impl Teleport<'_> {
    fn vector(&self) -> &[f64] {
        match self {
            Self::Fixed(v) | Self::SeedRestart(v) => *v,
            Self::Sourced { source, .. } => *source,
        }
    }
}

/// Run the power iteration from `initial` until convergence or the cap.
///
/// Returns the last iterate either way; `converged` tells them apart.
/// `initial` and the vector inside `teleport` must have one entry per
/// vertex, otherwise [`Error::BaselineMismatch`] is returned.
pub fn power_iterate(
    graph: &LinkGraph,
    teleport: Teleport<'_>,
    initial: Vec<f64>,
    params: &IterationParams,
) -> Result<PageRankResult> {
    let n = graph.num_vertices();
    for actual in [initial.len(), teleport.vector().len()] {
        if actual != n {
            return Err(Error::BaselineMismatch { expected: n, actual });
        }
    }
    Ok(iterate(graph, teleport, initial, params))
}

/// [`power_iterate`] for callers that sized every vector from the graph
pub(crate) fn iterate(
    graph: &LinkGraph,
    teleport: Teleport<'_>,
    initial: Vec<f64>,
    params: &IterationParams,
) -> PageRankResult {
    let n = graph.num_vertices();
    if n == 0 {
        return PageRankResult::new(vec![], 0, 0.0, true);
    }

    let _span = tracing::debug_span!("power_iteration", vertices = n).entered();

    let n_f64 = n as f64;
    let p = params.damping.propagation();
    let j = params.damping.jump();

    let mut scores = initial;
    let mut new_scores = vec![0.0; n];
    let mut iterations = 0;
    let mut delta = f64::MAX;

    while iterations < params.max_iterations && delta > params.threshold {
        iterations += 1;

        let sink_mass = propagate(graph, params.transitions, &scores, &mut new_scores);
        let random_surfer = sink_mass / n_f64;

        match teleport {
            Teleport::Fixed(jump) => {
                for (x, value) in new_scores.iter_mut().enumerate() {
                    *value = p * (*value + random_surfer) + j * jump[x];
                }
            }
            Teleport::Sourced { source, beta } => {
                let uniform = j / n_f64;
                for (x, value) in new_scores.iter_mut().enumerate() {
                    *value = p * (*value + random_surfer) + uniform + beta * source[x];
                }
            }
            Teleport::SeedRestart(seeds) => {
                let restart = p * sink_mass + j;
                for (x, value) in new_scores.iter_mut().enumerate() {
                    *value = p * *value + restart * seeds[x];
                }
            }
        }

        if params.renormalize {
            let sum: f64 = new_scores.iter().sum();
            if sum > 0.0 {
                for value in &mut new_scores {
                    *value /= sum;
                }
            }
        }

        delta = l1_distance(&scores, &new_scores);
        std::mem::swap(&mut scores, &mut new_scores);
    }

    let converged = delta <= params.threshold;
    if converged {
        tracing::debug!(iterations, delta, "power iteration converged");
    } else {
        tracing::warn!(iterations, delta, "power iteration hit its iteration cap");
    }

    PageRankResult::new(scores, iterations, delta, converged)
}

/// Push `scores` along every out-edge into `out` (overwritten).
///
/// Returns the total mass held by sinks.
pub(crate) fn propagate(
    graph: &LinkGraph,
    transitions: Transitions,
    scores: &[f64],
    out: &mut [f64],
) -> f64 {
    out.fill(0.0);
    let mut sink_mass = 0.0;

    for (v, &mass) in scores.iter().enumerate() {
        let links = graph.outbound(v as VertexId);
        if links.is_empty() {
            sink_mass += mass;
            continue;
        }

        match transitions {
            Transitions::Weighted => {
                for (&dest, &w) in links.iter().zip(graph.transitions(v as VertexId)) {
                    out[dest as usize] += mass * w as f64;
                }
            }
            Transitions::Uniform => {
                let share = mass / links.len() as f64;
                for &dest in links {
                    out[dest as usize] += share;
                }
            }
        }
    }

    sink_mass
}

/// `Σ |a[i] − b[i]|`
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use approx::assert_abs_diff_eq;

    fn params(propagation: f64) -> IterationParams {
        IterationParams {
            damping: Damping::from_propagation(propagation),
            transitions: Transitions::Weighted,
            threshold: 1e-9,
            max_iterations: 1000,
            renormalize: false,
        }
    }

    #[test]
    fn test_damping_sums_to_one() {
        let d = Damping::from_propagation(0.85);
        assert_abs_diff_eq!(d.propagation() + d.jump(), 1.0);
        assert_abs_diff_eq!(d.jump(), 0.15, epsilon = 1e-12);

        assert_eq!(Damping::from_propagation(1.7).propagation(), 1.0);
        assert_eq!(Damping::from_propagation(-0.2).jump(), 1.0);
    }

    #[test]
    fn test_sink_mass_spreads_uniformly() {
        // 0 -> 1, 1 and 2 are sinks
        let graph = LinkGraph::from_parts(vec![vec![1], vec![], vec![]], vec![]).unwrap();

        let scores = [0.3, 0.6, 0.1];
        let mut out = vec![0.0; 3];
        let sink_mass = propagate(&graph, Transitions::Weighted, &scores, &mut out);

        assert_abs_diff_eq!(sink_mass, 0.7, epsilon = 1e-12);
        assert_eq!(out, vec![0.0, 0.3, 0.0]);

        // With no jump at all, one step adds sink_mass / N to every vertex
        let zero = [0.0; 3];
        let result = power_iterate(
            &graph,
            Teleport::Fixed(&zero),
            scores.to_vec(),
            &IterationParams {
                max_iterations: 1,
                ..params(1.0)
            },
        )
        .unwrap();
        let rs = 0.7 / 3.0;
        assert_abs_diff_eq!(result.scores[0], rs, epsilon = 1e-12);
        assert_abs_diff_eq!(result.scores[1], 0.3 + rs, epsilon = 1e-12);
        assert_abs_diff_eq!(result.scores[2], rs, epsilon = 1e-12);
        assert_abs_diff_eq!(result.total(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_transitions_ignore_stored_weights() {
        let graph = GraphBuilder::from_edges([(0, 1, 9.0), (0, 2, 1.0)]).unwrap().build();
        let mut weighted = vec![0.0; 3];
        let mut uniform = vec![0.0; 3];

        propagate(&graph, Transitions::Weighted, &[1.0, 0.0, 0.0], &mut weighted);
        propagate(&graph, Transitions::Uniform, &[1.0, 0.0, 0.0], &mut uniform);

        assert_abs_diff_eq!(weighted[1], 0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(uniform[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(uniform[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let graph = crate::graph::toy_graph();
        let uniform = vec![1.0 / 6.0; 6];
        let result = power_iterate(
            &graph,
            Teleport::Fixed(&uniform),
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            &IterationParams {
                threshold: 0.0,
                max_iterations: 3,
                ..params(0.85)
            },
        )
        .unwrap();

        assert_eq!(result.iterations, 3);
        assert!(!result.converged);
        assert!(result.ensure_converged().is_err());
    }

    #[test]
    fn test_seed_restart_returns_sink_mass_to_seeds() {
        // 0 -> 1, 1 is a sink; seed is 0
        let graph = LinkGraph::from_parts(vec![vec![1], vec![]], vec![]).unwrap();
        let seeds = [1.0, 0.0];
        let result = power_iterate(
            &graph,
            Teleport::SeedRestart(&seeds),
            vec![1.0, 0.0],
            &params(0.5),
        )
        .unwrap();

        // Fixed point: x0 = 0.5*x1 + 0.5, x1 = 0.5*x0 => x0 = 2/3, x1 = 1/3
        assert!(result.converged);
        assert_abs_diff_eq!(result.scores[0], 2.0 / 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.scores[1], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_graph() {
        let graph = LinkGraph::default();
        let result = power_iterate(&graph, Teleport::Fixed(&[]), vec![], &params(0.85)).unwrap();
        assert!(result.converged);
        assert!(result.is_empty());
    }

    #[test]
    fn test_short_vectors_rejected() {
        let graph = crate::graph::toy_graph();
        let uniform = vec![1.0 / 6.0; 6];

        let short_jump = power_iterate(
            &graph,
            Teleport::Fixed(&[0.5, 0.5]),
            uniform.clone(),
            &params(0.85),
        );
        assert!(matches!(
            short_jump,
            Err(Error::BaselineMismatch { expected: 6, actual: 2 })
        ));

        let short_start = power_iterate(
            &graph,
            Teleport::Sourced {
                source: &uniform,
                beta: 0.5,
            },
            vec![1.0],
            &params(0.85),
        );
        assert!(matches!(
            short_start,
            Err(Error::BaselineMismatch { expected: 6, actual: 1 })
        ));

        let short_seeds = power_iterate(
            &graph,
            Teleport::SeedRestart(&[1.0; 3]),
            uniform,
            &params(0.85),
        );
        assert!(short_seeds.is_err());
    }
}

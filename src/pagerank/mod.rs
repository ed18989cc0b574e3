//! PageRank algorithms
//!
//! This module provides the shared power-iteration primitive and the
//! PageRank family built on it: global PageRank, Sourced PageRank (plain
//! and decoupled), Personalized PageRank and the valid-vertex restriction
//! pass.

pub mod engine;
pub mod personalized;
pub mod restrict;
pub mod sourced;
pub mod standard;

use crate::error::{Error, Result};
use crate::graph::VertexId;

/// Result of a PageRank computation
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankResult {
    /// Scores for each vertex (indexed by vertex ID)
    pub scores: Vec<f64>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final convergence delta (L1)
    pub delta: f64,
    /// Whether the algorithm converged
    pub converged: bool,
}

impl PageRankResult {
    /// Create a new PageRank result
    pub fn new(scores: Vec<f64>, iterations: usize, delta: f64, converged: bool) -> Self {
        Self {
            scores,
            iterations,
            delta,
            converged,
        }
    }

    /// Get top N vertices by score
    pub fn top_n(&self, n: usize) -> Vec<(VertexId, f64)> {
        top_n(&self.scores, n)
    }

    /// Get the score for a specific vertex (0.0 when out of range)
    pub fn score(&self, vertex: VertexId) -> f64 {
        self.scores.get(vertex as usize).copied().unwrap_or(0.0)
    }

    /// Sum of all scores
    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check if the distribution is empty
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Turn a run that hit its iteration cap into [`Error::NotConverged`]
    pub fn ensure_converged(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(Error::NotConverged {
                iterations: self.iterations,
                delta: self.delta,
            })
        }
    }
}

/// Highest-scoring `n` entries of a score vector, best first
pub(crate) fn top_n(scores: &[f64], n: usize) -> Vec<(VertexId, f64)> {
    let mut indexed: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as VertexId, s))
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    indexed.truncate(n);
    indexed
}

/// Rescale a sourced distribution against the global baseline:
/// `score[j] *= log10(1 / baseline[j])`.
///
/// Vertices the baseline never visits get a score of zero.
pub fn rescale_by_baseline(scores: &mut [f64], baseline: &[f64]) {
    for (score, &pr) in scores.iter_mut().zip(baseline) {
        *score = if pr > 0.0 {
            *score * (1.0 / pr).log10()
        } else {
            0.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_orders_by_score() {
        let result = PageRankResult::new(vec![0.1, 0.5, 0.2, 0.2], 3, 0.0, true);
        let top = result.top_n(3);

        assert_eq!(top[0].0, 1);
        // ties broken by vertex ID
        assert_eq!(top[1].0, 2);
        assert_eq!(top[2].0, 3);
    }

    #[test]
    fn test_score_out_of_range() {
        let result = PageRankResult::new(vec![0.3, 0.7], 1, 0.0, true);
        assert_eq!(result.score(1), 0.7);
        assert_eq!(result.score(2), 0.0);
    }

    #[test]
    fn test_ensure_converged() {
        let ok = PageRankResult::new(vec![1.0], 2, 0.0001, true);
        assert!(ok.ensure_converged().is_ok());

        let stuck = PageRankResult::new(vec![1.0], 500, 0.3, false);
        assert!(matches!(
            stuck.ensure_converged(),
            Err(Error::NotConverged { iterations: 500, .. })
        ));
    }

    #[test]
    fn test_rescale_by_baseline() {
        let mut scores = vec![0.5, 0.5, 0.2];
        rescale_by_baseline(&mut scores, &[0.1, 0.01, 0.0]);

        assert!((scores[0] - 0.5).abs() < 1e-12);
        assert!((scores[1] - 1.0).abs() < 1e-12);
        assert_eq!(scores[2], 0.0);
    }
}

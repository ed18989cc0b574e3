//! Valid-vertex restriction pass
//!
//! Confines a converged sourced distribution to an allowed subset of
//! vertices (for Wikipedia: real articles, not categories, redirects or
//! templates). One extra propagation step moves each invalid vertex's mass
//! onto its valid out-neighbors; mass with nowhere valid to go is pooled and
//! spread evenly over all valid vertices. The surviving mass is normalized
//! and rescaled against the baseline like any sourced result.

use super::{rescale_by_baseline, top_n};
use crate::error::{Error, Result};
use crate::graph::store::LinkGraph;
use crate::graph::VertexId;

/// Which vertices may carry relatedness mass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexMask {
    valid: Vec<bool>,
}

impl VertexMask {
    /// Every vertex valid
    pub fn all_valid(num_vertices: usize) -> Self {
        Self {
            valid: vec![true; num_vertices],
        }
    }

    /// Build from one flag per vertex
    pub fn from_flags(valid: Vec<bool>) -> Self {
        Self { valid }
    }

    /// Only the listed vertices are valid; out-of-range IDs are ignored
    pub fn from_valid(num_vertices: usize, vertices: impl IntoIterator<Item = VertexId>) -> Self {
        let mut valid = vec![false; num_vertices];
        for v in vertices {
            if let Some(flag) = valid.get_mut(v as usize) {
                *flag = true;
            }
        }
        Self { valid }
    }

    /// Mark `vertex` invalid
    pub fn exclude(mut self, vertex: VertexId) -> Self {
        if let Some(flag) = self.valid.get_mut(vertex as usize) {
            *flag = false;
        }
        self
    }

    /// Whether `vertex` is valid (false when out of range)
    pub fn is_valid(&self, vertex: VertexId) -> bool {
        self.valid.get(vertex as usize).copied().unwrap_or(false)
    }

    /// Number of valid vertices
    pub fn num_valid(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Number of vertices covered by the mask
    pub fn len(&self) -> usize {
        self.valid.len()
    }

    /// Check if the mask covers no vertices
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Output of the restriction pass
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictedDistribution {
    /// Normalized mass: zero on invalid vertices, summing to one over the
    /// valid ones (all zero if no valid vertex holds mass)
    pub mass: Vec<f64>,
    /// `mass[j] · log10(1 / baseline[j])`
    pub scores: Vec<f64>,
}

impl RestrictedDistribution {
    /// Relatedness score of `vertex` (0.0 when out of range)
    pub fn score(&self, vertex: VertexId) -> f64 {
        self.scores.get(vertex as usize).copied().unwrap_or(0.0)
    }

    /// Get top N vertices by score
    pub fn top_n(&self, n: usize) -> Vec<(VertexId, f64)> {
        top_n(&self.scores, n)
    }
}

/// Restrict a converged sourced mass vector to the valid vertices of `mask`
pub fn restrict(
    graph: &LinkGraph,
    mass: &[f64],
    mask: &VertexMask,
    baseline: &[f64],
) -> Result<RestrictedDistribution> {
    let n = graph.num_vertices();
    if mass.len() != n || baseline.len() != n {
        return Err(Error::BaselineMismatch {
            expected: n,
            actual: if mass.len() != n {
                mass.len()
            } else {
                baseline.len()
            },
        });
    }
    if mask.len() != n {
        return Err(Error::MaskMismatch {
            expected: n,
            actual: mask.len(),
        });
    }

    let mut restricted = mass.to_vec();
    let mut pool = 0.0;

    for (v, &m) in mass.iter().enumerate() {
        let v = v as VertexId;
        if mask.is_valid(v) {
            continue;
        }

        let valid_neighbors = graph
            .outbound(v)
            .iter()
            .filter(|&&t| mask.is_valid(t))
            .count();
        if valid_neighbors == 0 {
            pool += m;
        } else {
            let share = m / valid_neighbors as f64;
            for &t in graph.outbound(v).iter().filter(|&&t| mask.is_valid(t)) {
                restricted[t as usize] += share;
            }
        }
    }

    let num_valid = mask.num_valid();
    let pool_share = if num_valid > 0 {
        pool / num_valid as f64
    } else {
        0.0
    };
    for (v, value) in restricted.iter_mut().enumerate() {
        if mask.is_valid(v as VertexId) {
            *value += pool_share;
        } else {
            *value = 0.0;
        }
    }

    let total: f64 = restricted.iter().sum();
    if total > 0.0 {
        for value in &mut restricted {
            *value /= total;
        }
    } else {
        tracing::warn!(total, "restricted distribution has no positive mass, left unnormalized");
    }

    let mut scores = restricted.clone();
    rescale_by_baseline(&mut scores, baseline);

    Ok(RestrictedDistribution {
        mass: restricted,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::toy_graph;
    use crate::pagerank::sourced::SourcedPageRank;
    use crate::pagerank::standard::StandardPageRank;
    use crate::seeds::SeedSet;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_excluded_vertex_loses_all_mass() {
        let graph = toy_graph();
        let pr = StandardPageRank::new().run(&graph).scores;
        let mass = SourcedPageRank::new()
            .run_mass(&graph, &pr, &SeedSet::single(1))
            .unwrap();

        let mask = VertexMask::all_valid(6).exclude(4);
        let result = restrict(&graph, &mass.scores, &mask, &pr).unwrap();

        assert_eq!(result.mass[4], 0.0);
        assert_eq!(result.scores[4], 0.0);
        assert_abs_diff_eq!(result.mass.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mass_moves_to_valid_neighbors() {
        // 4 -> {1, 3}: its mass is split evenly between them
        let graph = toy_graph();
        let mass = vec![0.1, 0.1, 0.1, 0.1, 0.5, 0.1];
        let pr = vec![1.0 / 6.0; 6];

        let mask = VertexMask::all_valid(6).exclude(4);
        let result = restrict(&graph, &mass, &mask, &pr).unwrap();

        assert_abs_diff_eq!(result.mass[1], 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(result.mass[3], 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(result.mass[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(result.scores[1], 0.35 * 6f64.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_stranded_mass_is_pooled() {
        // 0 -> 3 only; with 3 invalid too, 0's mass has no valid neighbor
        let graph = toy_graph();
        let mass = vec![0.3, 0.1, 0.1, 0.2, 0.2, 0.1];
        let pr = vec![1.0 / 6.0; 6];

        let mask = VertexMask::all_valid(6).exclude(0).exclude(3);
        let result = restrict(&graph, &mass, &mask, &pr).unwrap();

        // 3 -> {0, 4}: all of 3's mass goes to 4. 0's mass is pooled over
        // the four valid vertices.
        assert_abs_diff_eq!(result.mass[4], 0.2 + 0.2 + 0.075, epsilon = 1e-12);
        assert_abs_diff_eq!(result.mass[1], 0.1 + 0.075, epsilon = 1e-12);
        assert_eq!(result.mass[0], 0.0);
        assert_eq!(result.mass[3], 0.0);
    }

    #[test]
    fn test_all_valid_is_identity_on_mass() {
        let graph = toy_graph();
        let mass = vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.1];
        let pr = vec![1.0 / 6.0; 6];

        let result = restrict(&graph, &mass, &VertexMask::all_valid(6), &pr).unwrap();
        for (a, b) in result.mass.iter().zip(&mass) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mask_length_checked() {
        let graph = toy_graph();
        let result = restrict(&graph, &[0.0; 6], &VertexMask::all_valid(3), &[0.1; 6]);
        assert!(matches!(
            result,
            Err(Error::MaskMismatch { expected: 6, actual: 3 })
        ));
    }

    #[test]
    fn test_from_valid() {
        let mask = VertexMask::from_valid(4, [0, 2, 9]);
        assert!(mask.is_valid(0));
        assert!(!mask.is_valid(1));
        assert!(mask.is_valid(2));
        assert!(!mask.is_valid(9));
        assert_eq!(mask.num_valid(), 2);
    }
}

//! Seed sets for source-biased queries

use crate::error::{Error, Result};
use crate::graph::VertexId;

/// One or more seed vertices with non-negative weights summing to one
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSet {
    vertices: Vec<VertexId>,
    weights: Vec<f64>,
}

impl SeedSet {
    /// A single seed with weight 1
    pub fn single(vertex: VertexId) -> Self {
        Self {
            vertices: vec![vertex],
            weights: vec![1.0],
        }
    }

    /// Every seed weighted `1 / k`
    pub fn uniform(vertices: &[VertexId]) -> Result<Self> {
        if vertices.is_empty() {
            return Err(Error::InvalidSeeds("no seed vertices given".into()));
        }
        let w = 1.0 / vertices.len() as f64;
        Ok(Self {
            vertices: vertices.to_vec(),
            weights: vec![w; vertices.len()],
        })
    }

    /// Explicit per-seed weights, normalized to sum to one
    pub fn weighted(vertices: &[VertexId], weights: &[f32]) -> Result<Self> {
        if vertices.is_empty() {
            return Err(Error::InvalidSeeds("no seed vertices given".into()));
        }
        if vertices.len() != weights.len() {
            return Err(Error::InvalidSeeds(format!(
                "{} seeds but {} weights",
                vertices.len(),
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::InvalidSeeds(format!(
                "seed weights must be finite and non-negative, got {bad}"
            )));
        }
        let total: f64 = weights.iter().map(|&w| w as f64).sum();
        if total <= 0.0 {
            return Err(Error::InvalidSeeds("seed weights are all zero".into()));
        }
        Ok(Self {
            vertices: vertices.to_vec(),
            weights: weights.iter().map(|&w| w as f64 / total).collect(),
        })
    }

    /// Seed vertices, in the order given
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Seed weights, parallel to [`vertices`](Self::vertices)
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of seeds
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if there are no seeds (never true for a constructed set)
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check every seed lies inside a graph of `num_vertices` vertices
    pub fn check_bounds(&self, num_vertices: usize) -> Result<()> {
        match self.vertices.iter().find(|&&v| v as usize >= num_vertices) {
            Some(&vertex) => Err(Error::VertexOutOfRange {
                vertex,
                num_vertices,
            }),
            None => Ok(()),
        }
    }

    /// Dense vector of length `num_vertices` holding the seed weights
    ///
    /// Repeated seeds add up. Out-of-range seeds are skipped; call
    /// [`check_bounds`](Self::check_bounds) first to reject them.
    pub fn to_dense(&self, num_vertices: usize) -> Vec<f64> {
        let mut dense = vec![0.0; num_vertices];
        for (&v, &w) in self.vertices.iter().zip(&self.weights) {
            if let Some(slot) = dense.get_mut(v as usize) {
                *slot += w;
            }
        }
        dense
    }
}

impl From<VertexId> for SeedSet {
    fn from(vertex: VertexId) -> Self {
        Self::single(vertex)
    }
}

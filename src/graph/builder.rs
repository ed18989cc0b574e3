//! Graph builder with efficient edge handling
//!
//! This module provides a mutable builder that uses FxHashMap for O(1)
//! edge lookups while links are being collected, and freezes into a
//! [`LinkGraph`] with sorted rows and normalized transition weights.

use super::store::{uniform_row, LinkGraph};
use super::VertexId;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

/// Largest vertex count a builder grows to unless told otherwise
pub const DEFAULT_MAX_VERTICES: usize = 1 << 26;

/// A vertex in the graph builder
#[derive(Debug, Clone, Default)]
pub struct BuilderVertex {
    /// Adjacency list: destination vertex -> accumulated edge weight
    pub edges: FxHashMap<VertexId, f64>,
}

/// A mutable graph builder optimized for incremental construction
#[derive(Debug)]
pub struct GraphBuilder {
    vertices: Vec<BuilderVertex>,
    max_vertices: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            max_vertices: DEFAULT_MAX_VERTICES,
        }
    }
}

impl GraphBuilder {
    /// Create a new empty graph builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder that already holds `n` isolated vertices
    ///
    /// The vertex limit is raised to `n` if it was lower.
    pub fn with_vertices(n: usize) -> Self {
        Self {
            vertices: vec![BuilderVertex::default(); n],
            max_vertices: DEFAULT_MAX_VERTICES.max(n),
        }
    }

    /// Limit how far [`add_edge`](Self::add_edge) may grow the vertex set
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices.max(self.vertices.len());
        self
    }

    /// Append a new isolated vertex, returning its ID
    pub fn add_vertex(&mut self) -> VertexId {
        let id = self.vertices.len() as VertexId;
        self.vertices.push(BuilderVertex::default());
        id
    }

    /// Add weight to the directed edge `from -> to`
    ///
    /// Missing vertices are created on demand, up to the vertex limit; an
    /// endpoint past it fails with [`Error::VertexOutOfRange`] and leaves
    /// the builder untouched. Repeated edges accumulate their weights;
    /// negative and non-finite weights are ignored.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f64) -> Result<()> {
        let highest = from.max(to);
        if highest as usize >= self.max_vertices {
            return Err(Error::VertexOutOfRange {
                vertex: highest,
                num_vertices: self.max_vertices,
            });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Ok(());
        }

        let needed = highest as usize + 1;
        if self.vertices.len() < needed {
            self.vertices.resize_with(needed, BuilderVertex::default);
        }

        *self.vertices[from as usize].edges.entry(to).or_insert(0.0) += weight;
        Ok(())
    }

    /// Add an unweighted link (weight 1.0)
    pub fn add_link(&mut self, from: VertexId, to: VertexId) -> Result<()> {
        self.add_edge(from, to, 1.0)
    }

    /// Build a builder from `(from, to, weight)` triples
    pub fn from_edges<I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (VertexId, VertexId, f64)>,
    {
        let mut builder = Self::new();
        for (from, to, weight) in edges {
            builder.add_edge(from, to, weight)?;
        }
        Ok(builder)
    }

    /// Get the number of vertices
    pub fn node_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of distinct directed edges
    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(|v| v.edges.len()).sum()
    }

    /// Get a vertex by ID
    pub fn get_vertex(&self, id: VertexId) -> Option<&BuilderVertex> {
        self.vertices.get(id as usize)
    }

    /// Check if the builder is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Freeze into a [`LinkGraph`]
    ///
    /// Rows are sorted by destination and weights are normalized to sum to
    /// one per vertex. A vertex whose outgoing weights are all zero gets a
    /// uniform row.
    pub fn build(&self) -> LinkGraph {
        let mut outbound = Vec::with_capacity(self.vertices.len());
        let mut transitions = Vec::with_capacity(self.vertices.len());

        for vertex in &self.vertices {
            // Collect and sort edges for deterministic iteration
            let mut edges: Vec<_> = vertex.edges.iter().map(|(&k, &w)| (k, w)).collect();
            edges.sort_by_key(|(k, _)| *k);

            let total: f64 = edges.iter().map(|(_, w)| w).sum();
            let row: Vec<f32> = if total > 0.0 {
                edges.iter().map(|(_, w)| (w / total) as f32).collect()
            } else {
                uniform_row(edges.len())
            };

            outbound.push(edges.into_iter().map(|(k, _)| k).collect());
            transitions.push(row);
        }

        LinkGraph::from_sorted_parts(outbound, transitions)
    }
}

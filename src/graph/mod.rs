//! Graph storage and construction
//!
//! This module provides the sparse directed link graph that every
//! relatedness computation runs over, an incremental builder for it,
//! and the binary on-disk layout.

pub mod builder;
pub mod io;
pub mod store;

/// Dense, 0-based vertex identifier ("compressed" page ID)
pub type VertexId = u32;

/// Tolerance used when deciding whether a weight row is uniform
pub(crate) const UNIFORM_TOLERANCE: f32 = 1e-5;

/// Six-vertex graph shared by unit tests across the crate.
///
/// `0→3`, `1→{0,2,3,5}`, `2→{1,3}`, `3→{0,4}`, `4→{1,3}`, `5→{1,2,4}`.
#[cfg(test)]
pub(crate) fn toy_graph() -> store::LinkGraph {
    store::LinkGraph::from_parts(
        vec![
            vec![3],
            vec![0, 2, 3, 5],
            vec![1, 3],
            vec![0, 4],
            vec![1, 3],
            vec![1, 2, 4],
        ],
        vec![
            vec![1.0],
            vec![0.25, 0.25, 0.25, 0.25],
            vec![0.5, 0.5],
            vec![0.5, 0.5],
            vec![0.5, 0.5],
            vec![0.333, 0.333, 0.334],
        ],
    )
    .unwrap()
}

//! Error types
//!
//! Load errors are fatal for the graph being loaded; everything raised by a
//! query is recoverable and leaves the engine untouched.

use crate::graph::VertexId;

/// Errors produced by graph loading and relatedness queries
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The graph file could not be read or written
    #[error("graph I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The graph file was readable but its content is not a valid graph
    #[error("corrupt graph data: {0}")]
    CorruptGraph(String),

    /// A query referenced a vertex outside `0..num_vertices`
    #[error("vertex {vertex} out of range (graph has {num_vertices} vertices)")]
    VertexOutOfRange {
        vertex: VertexId,
        num_vertices: usize,
    },

    /// The seed set of a query is unusable
    #[error("invalid seed set: {0}")]
    InvalidSeeds(String),

    /// A transition replacement did not match the vertex's out-degree
    #[error("vertex {vertex} has {expected} outbound links but {actual} transitions were supplied")]
    ShapeMismatch {
        vertex: VertexId,
        expected: usize,
        actual: usize,
    },

    /// A power iteration hit its iteration cap before reaching the threshold
    #[error("no convergence after {iterations} iterations (L1 delta {delta:.6})")]
    NotConverged { iterations: usize, delta: f64 },

    /// A baseline distribution does not belong to the graph it is used with
    #[error("baseline has {actual} entries but the graph has {expected} vertices")]
    BaselineMismatch { expected: usize, actual: usize },

    /// A valid-vertex mask does not cover the graph's vertices
    #[error("mask has {actual} entries but the graph has {expected} vertices")]
    MaskMismatch { expected: usize, actual: usize },

    /// The engine configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

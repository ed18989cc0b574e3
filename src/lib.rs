//! # linkrank
//!
//! Semantic relatedness between concepts of a hyperlink graph (Wikipedia or
//! Wiktionary pages), computed with PageRank-family power iterations.
//!
//! Data flows one way:
//!
//! 1. [`LinkGraph`] holds the sparse adjacency and transition arrays.
//! 2. [`pagerank::standard::StandardPageRank`] produces the global baseline.
//! 3. [`pagerank::sourced::SourcedPageRank`] (and the personalized variants)
//!    bias the walk toward seed vertices and rescale against the baseline.
//! 4. [`pagerank::restrict`] optionally confines the result to a subset of
//!    "real" vertices.
//!
//! [`RelatednessEngine`] ties the steps together: it owns a shared graph and
//! the cached baseline, and answers queries with private per-call buffers, so
//! one engine can serve many threads at once.
//!
//! ```rust,ignore
//! use linkrank::{EngineConfig, LinkGraph, Relatedness, RelatednessEngine};
//!
//! let graph = LinkGraph::load("enwiki.wgp")?;
//! let engine = RelatednessEngine::new(graph, EngineConfig::default())?;
//! let related = engine.relatedness(42)?;
//! for (vertex, score) in related.top_n(10) {
//!     println!("{vertex}\t{score:.5}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod pagerank;
pub mod relatedness;
pub mod seeds;

pub use config::{EngineConfig, Variant};
pub use error::{Error, Result};
pub use graph::builder::GraphBuilder;
pub use graph::store::LinkGraph;
pub use graph::VertexId;
pub use pagerank::restrict::{RestrictedDistribution, VertexMask};
pub use pagerank::engine::{Damping, Transitions};
pub use pagerank::personalized::PprMode;
pub use pagerank::PageRankResult;
pub use relatedness::{Relatedness, RelatednessEngine};
pub use seeds::SeedSet;

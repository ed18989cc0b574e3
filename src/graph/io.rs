//! Binary graph layout (`.wgp`)
//!
//! Three sections, written back to back in big-endian order:
//!
//! 1. adjacency: `i32` row count, then per vertex an `i32` length followed
//!    by that many `i32` destination IDs;
//! 2. weights: `i32` row count, then per vertex an `i32` length followed by
//!    that many `f32` probabilities;
//! 3. an `i32` edge count.
//!
//! Readers accept a degenerate weight section (every row of length 0 or 1)
//! and re-derive uniform transitions from the adjacency.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::store::LinkGraph;
use super::VertexId;
use crate::error::{Error, Result};

/// Upper bound on speculative pre-allocation from an untrusted length field
const MAX_PREALLOC: usize = 1 << 20;

impl LinkGraph {
    /// Load a graph from a `.wgp` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let _span = tracing::info_span!("load_graph", path = %path.display()).entered();

        let file = File::open(path)?;
        let graph = read_graph(BufReader::new(file))?;

        tracing::info!(
            vertices = graph.num_vertices(),
            edges = graph.num_edges(),
            uniform = graph.is_uniform_transition(),
            "graph loaded"
        );
        Ok(graph)
    }

    /// Save the graph to a `.wgp` file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let _span = tracing::info_span!("save_graph", path = %path.display()).entered();

        let mut writer = BufWriter::new(File::create(path)?);
        write_graph(self, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Deserialize a graph from any reader
pub fn read_graph<R: Read>(mut reader: R) -> Result<LinkGraph> {
    let outbound = read_rows(&mut reader, "adjacency", |r| r.read_i32::<BigEndian>())?;
    let transitions = read_rows(&mut reader, "weight", |r| r.read_f32::<BigEndian>())?;
    let stored_edges = read_len(&mut reader, "edge count")?;

    let outbound = outbound
        .into_iter()
        .enumerate()
        .map(|(v, row)| {
            row.into_iter()
                .map(|id| {
                    VertexId::try_from(id).map_err(|_| {
                        Error::CorruptGraph(format!("vertex {v} links to negative id {id}"))
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let graph = LinkGraph::from_parts(outbound, transitions)?;

    if graph.num_edges() != stored_edges {
        tracing::warn!(
            stored = stored_edges,
            counted = graph.num_edges(),
            "stored edge count disagrees with adjacency, using counted value"
        );
    }
    Ok(graph)
}

/// Serialize a graph to any writer
pub fn write_graph<W: Write>(graph: &LinkGraph, mut writer: W) -> Result<()> {
    let n = graph.num_vertices();

    write_len(&mut writer, n)?;
    for v in 0..n as VertexId {
        let row = graph.outbound(v);
        write_len(&mut writer, row.len())?;
        for &dest in row {
            writer.write_i32::<BigEndian>(to_i32(dest as usize)?)?;
        }
    }

    write_len(&mut writer, n)?;
    for v in 0..n as VertexId {
        let row = graph.transitions(v);
        write_len(&mut writer, row.len())?;
        for &w in row {
            writer.write_f32::<BigEndian>(w)?;
        }
    }

    write_len(&mut writer, graph.num_edges())?;
    Ok(())
}

fn read_rows<R, T, F>(reader: &mut R, section: &str, mut read_item: F) -> Result<Vec<Vec<T>>>
where
    R: Read,
    F: FnMut(&mut R) -> io::Result<T>,
{
    let rows = read_len(reader, section)?;
    let mut out = Vec::with_capacity(rows.min(MAX_PREALLOC));
    for _ in 0..rows {
        let len = read_len(reader, section)?;
        let mut row = Vec::with_capacity(len.min(MAX_PREALLOC));
        for _ in 0..len {
            row.push(read_item(reader).map_err(|e| truncated(e, section))?);
        }
        out.push(row);
    }
    Ok(out)
}

fn read_len<R: Read>(reader: &mut R, section: &str) -> Result<usize> {
    let len = reader
        .read_i32::<BigEndian>()
        .map_err(|e| truncated(e, section))?;
    usize::try_from(len)
        .map_err(|_| Error::CorruptGraph(format!("negative length {len} in {section} section")))
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> Result<()> {
    writer.write_i32::<BigEndian>(to_i32(len)?)?;
    Ok(())
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| Error::CorruptGraph(format!("{value} does not fit the 32-bit layout")))
}

fn truncated(err: io::Error, section: &str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::CorruptGraph(format!("stream ends inside the {section} section"))
    } else {
        Error::Io(err)
    }
}

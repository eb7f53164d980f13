//! Graph-specific error types.

use mf_core::{MfError, NodeId};
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Flowsheet construction, lookup and mutation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A stream has no endpoints, so it cannot be placed in a graph.
    #[error("Stream {stream} does not have its endpoints set")]
    MissingEndpoints { stream: String },

    /// A stream starts and ends at the same node.
    #[error("Stream {stream} starts and ends at node {node}")]
    SelfLoop { stream: String, node: NodeId },

    /// Two streams connect the same ordered pair of nodes.
    #[error("Streams {first} and {second} both connect node {from} to node {to}")]
    ParallelStreams {
        first: String,
        second: String,
        from: NodeId,
        to: NodeId,
    },

    /// Two streams share a name.
    #[error("Stream name {name} is used more than once")]
    DuplicateStreamName { name: String },

    /// Stream row indexes cannot be combined.
    #[error("Stream indexes are not consistent: {what}")]
    IndexMismatch { what: String },

    #[error("Stream {name} is not found on the network")]
    StreamNotFound { name: String },

    #[error("Node {id} is not found on the network")]
    NodeNotFound { id: NodeId },

    /// An aggregate operation met a stream without rows.
    #[error("Cannot generate report on empty stream {stream}")]
    EmptyStream { stream: String },

    /// A filter names a dimension the stream is not indexed by.
    #[error("Stream {stream} has no dimension named {dimension}")]
    UnknownDimension { stream: String, dimension: String },

    /// Filtering along more than one dimension at once.
    #[error("Filtering is supported along a single dimension only (got {dimensions:?})")]
    UnsupportedDimension { dimensions: Vec<String> },

    /// A freshly issued identifier already names a node.
    #[error("Identifier {id} is already used by a node")]
    IdCollision { id: NodeId },

    /// Node input/output lists disagree with the edge set.
    #[error("Node {node} adjacency is inconsistent: {what}")]
    InconsistentAdjacency { node: NodeId, what: String },

    #[error("Table error: {0}")]
    Table(#[from] MfError),
}

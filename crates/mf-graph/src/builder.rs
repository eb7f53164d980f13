//! Flowsheet assembly from a collection of streams.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use mf_core::NodeId;

use crate::align;
use crate::error::{GraphError, GraphResult};
use crate::flowsheet::Flowsheet;
use crate::graph::{self, FlowGraph};
use crate::node::FlowNode;
use crate::options::FlowsheetOptions;
use crate::stream::{Endpoints, Stream};
use crate::validate;

/// Display metadata attached to a node by its pre-build identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
    pub name: Option<String>,
    pub subset: Option<String>,
}

/// Builder for assembling a flowsheet from streams.
///
/// Streams carry arbitrary node identifiers; `build()` renumbers them to a dense
/// `0..n` range in first-seen order, writes the new endpoints back onto every stream
/// and derives each node's input/output lists from the edges.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    name: String,
    options: FlowsheetOptions,
    streams: Vec<Stream>,
    node_meta: HashMap<NodeId, NodeMeta>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn options(mut self, options: FlowsheetOptions) -> Self {
        self.options = options;
        self
    }

    /// Add one stream.
    pub fn add_stream(&mut self, stream: Stream) -> &mut Self {
        self.streams.push(stream);
        self
    }

    /// Add several streams.
    pub fn add_streams<I>(&mut self, streams: I) -> &mut Self
    where
        I: IntoIterator<Item = Stream>,
    {
        self.streams.extend(streams);
        self
    }

    /// Name the node currently identified by `raw`.
    pub fn node_name(&mut self, raw: NodeId, name: impl Into<String>) -> &mut Self {
        self.node_meta.entry(raw).or_default().name = Some(name.into());
        self
    }

    /// Tag the node currently identified by `raw` with a subset label.
    pub fn node_subset(&mut self, raw: NodeId, subset: impl Into<String>) -> &mut Self {
        self.node_meta.entry(raw).or_default().subset = Some(subset.into());
        self
    }

    pub(crate) fn node_meta(&mut self, raw: NodeId, meta: NodeMeta) -> &mut Self {
        self.node_meta.insert(raw, meta);
        self
    }

    /// Validate the streams and assemble the flowsheet.
    pub fn build(self) -> GraphResult<Flowsheet> {
        let GraphBuilder {
            name,
            options,
            mut streams,
            node_meta,
        } = self;

        Self::check_streams(&streams)?;
        align::align_indexes(&mut streams)?;

        // Renumber raw ids densely, in first-seen order
        let mut relabel: HashMap<NodeId, NodeId> = HashMap::new();
        let mut order: Vec<NodeId> = Vec::new();
        for stream in &streams {
            let ends = stream.require_endpoints()?;
            for raw in [ends.from, ends.to] {
                relabel.entry(raw).or_insert_with(|| {
                    order.push(raw);
                    NodeId::from_index(order.len() as u64 - 1)
                });
            }
        }

        let mut graph = FlowGraph::with_capacity(order.len(), streams.len());
        for (i, raw) in order.iter().enumerate() {
            let mut node = FlowNode::new(NodeId::from_index(i as u64));
            if let Some(meta) = node_meta.get(raw) {
                node.name = meta.name.clone();
                node.subset = meta.subset.clone();
            }
            graph.add_node(node);
        }

        for mut stream in streams {
            let ends = stream.require_endpoints()?;
            let from = relabel[&ends.from];
            let to = relabel[&ends.to];
            stream.set_endpoints(from, to);
            graph.add_edge(graph::index_of(from), graph::index_of(to), Arc::new(stream));
        }

        graph::refresh_all(&mut graph);
        validate::validate_graph(&graph)?;

        tracing::debug!(
            flowsheet = %name,
            nodes = graph.node_count(),
            streams = graph.edge_count(),
            "built flowsheet graph"
        );

        Ok(Flowsheet {
            name,
            graph,
            options,
        })
    }

    /// Reject streams that cannot form a simple directed graph.
    fn check_streams(streams: &[Stream]) -> GraphResult<()> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut pairs: HashMap<Endpoints, &str> = HashMap::new();
        for stream in streams {
            let ends = stream.require_endpoints()?;
            if ends.from == ends.to {
                return Err(GraphError::SelfLoop {
                    stream: stream.name().to_string(),
                    node: ends.from,
                });
            }
            if !names.insert(stream.name()) {
                return Err(GraphError::DuplicateStreamName {
                    name: stream.name().to_string(),
                });
            }
            if let Some(first) = pairs.insert(ends, stream.name()) {
                return Err(GraphError::ParallelStreams {
                    first: first.to_string(),
                    second: stream.name().to_string(),
                    from: ends.from,
                    to: ends.to,
                });
            }
        }
        Ok(())
    }
}

//! The flowsheet engine: owns the graph and funnels every read and write through it.
//!
//! Adjacency changes never patch node input/output lists in place. The current streams
//! are copied, the copy is mutated, a new graph is built from it and only then swapped
//! in, so a failed mutation leaves the flowsheet untouched.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use mf_core::{IdSource, NodeId};
use petgraph::visit::EdgeRef;

use crate::align;
use crate::builder::{GraphBuilder, NodeMeta};
use crate::error::{GraphError, GraphResult};
use crate::filter::{self, DimensionFilter};
use crate::graph::{self, FlowGraph};
use crate::node::FlowNode;
use crate::options::FlowsheetOptions;
use crate::stream::Stream;

/// A directed network of streams between nodes.
#[derive(Debug, Clone)]
pub struct Flowsheet {
    pub(crate) name: String,
    pub(crate) graph: FlowGraph,
    pub(crate) options: FlowsheetOptions,
}

impl Flowsheet {
    /// Builder for a flowsheet called `name`.
    pub fn builder(name: impl Into<String>) -> GraphBuilder {
        GraphBuilder::new(name)
    }

    /// Assemble a flowsheet from connected streams with default options.
    pub fn from_streams<I>(name: impl Into<String>, streams: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = Stream>,
    {
        let mut b = GraphBuilder::new(name);
        b.add_streams(streams);
        b.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &FlowsheetOptions {
        &self.options
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn stream_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(graph::id_of)
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&FlowNode> {
        self.graph
            .node_weight(graph::index_of(id))
            .ok_or(GraphError::NodeNotFound { id })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FlowNode> + '_ {
        self.graph.node_weights()
    }

    /// Streams in edge insertion order.
    pub fn streams(&self) -> impl Iterator<Item = &Arc<Stream>> + '_ {
        self.graph.edge_weights()
    }

    pub fn stream_names(&self) -> Vec<&str> {
        self.streams().map(|s| s.name()).collect()
    }

    /// The stream called `name`.
    pub fn get_stream(&self, name: &str) -> GraphResult<&Arc<Stream>> {
        graph::find_edge(&self.graph, name)
            .map(|e| &self.graph[e])
            .ok_or_else(|| GraphError::StreamNotFound {
                name: name.to_string(),
            })
    }

    /// Input and output streams of one node.
    pub fn node_input_outputs(
        &self,
        id: NodeId,
    ) -> GraphResult<(&[Arc<Stream>], &[Arc<Stream>])> {
        let node = self.node(id)?;
        Ok((node.inputs(), node.outputs()))
    }

    pub fn degree(&self, id: NodeId) -> GraphResult<usize> {
        self.node(id)?;
        Ok(graph::degree(&self.graph, graph::index_of(id)))
    }

    /// An identifier source past every current node id.
    pub fn id_source(&self) -> IdSource {
        IdSource::after(self.node_ids())
    }

    /// True when every BALANCE node balances; boundary nodes are ignored.
    pub fn balanced(&self) -> bool {
        self.nodes()
            .filter_map(|n| n.balanced(&self.options))
            .all(|b| b)
    }

    /// Overall stream status plus the failing columns of every failing stream.
    pub fn edge_status(&self) -> (bool, BTreeMap<String, Vec<String>>) {
        let mut failing = BTreeMap::new();
        for s in self.streams() {
            let status = s.status(&self.options.basis, self.options.tolerances);
            if !status.ok {
                failing.insert(s.name().to_string(), status.failing_components);
            }
        }
        (failing.is_empty(), failing)
    }

    /// Streams leaving a degree-1 node.
    pub fn input_streams(&self) -> Vec<Arc<Stream>> {
        self.graph
            .edge_references()
            .filter(|e| graph::degree(&self.graph, e.source()) == 1)
            .map(|e| Arc::clone(e.weight()))
            .collect()
    }

    /// Streams entering a degree-1 node.
    pub fn output_streams(&self) -> Vec<Arc<Stream>> {
        self.graph
            .edge_references()
            .filter(|e| graph::degree(&self.graph, e.target()) == 1)
            .map(|e| Arc::clone(e.weight()))
            .collect()
    }

    /// Name to stream mapping; entries alias the flowsheet's streams.
    pub fn streams_to_map(&self) -> BTreeMap<String, Arc<Stream>> {
        self.streams()
            .map(|s| (s.name().to_string(), Arc::clone(s)))
            .collect()
    }

    pub fn nodes_to_map(&self) -> BTreeMap<NodeId, &FlowNode> {
        self.nodes().map(|n| (n.id(), n)).collect()
    }

    /// Filter one stream along a single dimension and restrict every other stream to the
    /// surviving index entries.
    ///
    /// An empty filter list returns an unfiltered copy.
    pub fn query(&self, name: &str, filters: &[DimensionFilter]) -> GraphResult<Flowsheet> {
        let reference = self.get_stream(name)?;
        let Some(dimension) = filter::single_dimension(filters)? else {
            return Ok(self.clone());
        };

        let check_dimension = |s: &Stream| -> GraphResult<()> {
            if s.data().index().name() == dimension {
                Ok(())
            } else {
                Err(GraphError::UnknownDimension {
                    stream: s.name().to_string(),
                    dimension: dimension.to_string(),
                })
            }
        };
        check_dimension(reference.as_ref())?;

        let kept = reference
            .data()
            .filter_index(|c| filters.iter().all(|f| f.matches(c)));
        let coords = kept.index().coords();

        let mut streams = self.current_streams();
        for s in &mut streams {
            if s.name() == name {
                s.set_data(kept.clone());
            } else if !s.data().is_empty() {
                check_dimension(&*s)?;
                s.set_data(s.data().retain_coords(&coords));
            }
        }
        tracing::debug!(stream = name, dimension, rows = coords.len(), "queried flowsheet");
        self.derive(streams)
    }

    /// Move a stream to new endpoints and rebuild.
    pub fn set_stream_endpoints(
        &mut self,
        name: &str,
        from: NodeId,
        to: NodeId,
    ) -> GraphResult<()> {
        self.rewire(name, |s| {
            s.set_endpoints(from, to);
            Ok(())
        })
    }

    /// Start stream `name` where stream `parent` ends, then rebuild.
    pub fn set_stream_parent(&mut self, name: &str, parent: &str) -> GraphResult<()> {
        let parent = Arc::clone(self.get_stream(parent)?);
        self.rewire(name, |s| s.set_parent(&parent))
    }

    /// End stream `name` where stream `child` starts, then rebuild.
    pub fn set_stream_child(&mut self, name: &str, child: &str) -> GraphResult<()> {
        let child = Arc::clone(self.get_stream(child)?);
        self.rewire(name, |s| s.set_child(&child))
    }

    /// Give one stream, or every stream, a pair of fresh endpoints drawn from `ids`.
    ///
    /// Fresh ids that already name a node fail with `IdCollision` before anything
    /// changes.
    pub fn reset_stream_endpoints(
        &mut self,
        name: Option<&str>,
        ids: &mut IdSource,
    ) -> GraphResult<()> {
        if let Some(name) = name {
            self.get_stream(name)?;
        }
        let mut draw = || -> GraphResult<NodeId> {
            let id = ids.next_id();
            if (id.index() as usize) < self.graph.node_count() {
                return Err(GraphError::IdCollision { id });
            }
            Ok(id)
        };

        let mut streams = self.current_streams();
        for s in &mut streams {
            if name.is_none_or(|n| n == s.name()) {
                let from = draw()?;
                let to = draw()?;
                s.set_endpoints(from, to);
            }
        }
        let next = self.derive(streams)?;
        *self = next;
        Ok(())
    }

    /// Swap the payload of stream `name` for that of `stream`.
    ///
    /// The edge keeps its endpoints, so only nodes whose incident payloads change are
    /// refreshed. The replacement may carry a new name as long as it stays unique. The
    /// new payload must fit the other streams' indexes the way a rebuild requires;
    /// coarse size fractions missing on either side are zero-filled.
    pub fn replace_stream_data(&mut self, name: &str, mut stream: Stream) -> GraphResult<()> {
        let edge = graph::find_edge(&self.graph, name).ok_or_else(|| {
            GraphError::StreamNotFound {
                name: name.to_string(),
            }
        })?;
        if stream.name() != name && graph::find_edge(&self.graph, stream.name()).is_some() {
            return Err(GraphError::DuplicateStreamName {
                name: stream.name().to_string(),
            });
        }
        let (source, target) = self
            .graph
            .edge_endpoints(edge)
            .ok_or(GraphError::StreamNotFound {
                name: name.to_string(),
            })?;
        stream.set_endpoints(graph::id_of(source), graph::id_of(target));

        let edges: Vec<_> = self.graph.edge_indices().collect();
        let mut candidate: Vec<Stream> = edges
            .iter()
            .map(|&e| {
                if e == edge {
                    stream.clone()
                } else {
                    (*self.graph[e]).clone()
                }
            })
            .collect();
        align::align_indexes(&mut candidate)?;

        tracing::info!(stream = name, "setting data on stream");
        let mut touched = Vec::new();
        for (e, aligned) in edges.into_iter().zip(candidate) {
            if e != edge && aligned.shares_data(&self.graph[e]) {
                continue;
            }
            if let Some((a, b)) = self.graph.edge_endpoints(e) {
                touched.extend([a, b]);
            }
            self.graph[e] = Arc::new(aligned);
        }
        touched.sort();
        touched.dedup();
        for ix in touched {
            graph::refresh_node(&mut self.graph, ix);
        }
        Ok(())
    }

    /// Set display names of nodes. Unknown ids fail before any name changes.
    pub fn rename_nodes<I, S>(&mut self, names: I) -> GraphResult<()>
    where
        I: IntoIterator<Item = (NodeId, S)>,
        S: Into<String>,
    {
        let names: Vec<(NodeId, String)> =
            names.into_iter().map(|(id, n)| (id, n.into())).collect();
        for (id, _) in &names {
            self.node(*id)?;
        }
        for (id, n) in names {
            self.graph[graph::index_of(id)].name = Some(n);
        }
        Ok(())
    }

    /// Collapse the network to its boundary streams around a single system node.
    ///
    /// The system node is named `node_name`, or after the flowsheet. Boundary streams
    /// keep their names and alias their original payloads.
    pub fn simplify(&self, node_name: Option<&str>) -> GraphResult<Flowsheet> {
        let system = IdSource::after(self.node_ids()).next_id();
        let metas = self.node_meta();

        let mut b = GraphBuilder::new(self.name.clone()).options(self.options.clone());
        b.node_meta(
            system,
            NodeMeta {
                name: Some(node_name.unwrap_or(&self.name).to_string()),
                subset: None,
            },
        );

        for e in self.graph.edge_references() {
            let from = graph::id_of(e.source());
            let to = graph::id_of(e.target());
            let ends = if graph::degree(&self.graph, e.source()) == 1 {
                (from, system)
            } else if graph::degree(&self.graph, e.target()) == 1 {
                (system, to)
            } else {
                continue;
            };
            let mut s = (**e.weight()).clone();
            s.set_endpoints(ends.0, ends.1);
            b.add_stream(s);
            for id in [from, to] {
                if let Some(meta) = metas.get(&id) {
                    b.node_meta(id, meta.clone());
                }
            }
        }

        let simple = b.build()?;
        tracing::debug!(
            flowsheet = %self.name,
            streams = simple.stream_count(),
            "simplified flowsheet"
        );
        Ok(simple)
    }

    /// Owned copies of the current streams; payloads stay shared.
    fn current_streams(&self) -> Vec<Stream> {
        self.streams().map(|s| (**s).clone()).collect()
    }

    /// Names and subsets of the nodes that carry any, keyed by current id.
    fn node_meta(&self) -> HashMap<NodeId, NodeMeta> {
        self.nodes()
            .filter(|n| n.name.is_some() || n.subset.is_some())
            .map(|n| {
                (
                    n.id,
                    NodeMeta {
                        name: n.name.clone(),
                        subset: n.subset.clone(),
                    },
                )
            })
            .collect()
    }

    /// A new flowsheet from `streams`, keeping this one's name, options and node metadata.
    fn derive(&self, streams: Vec<Stream>) -> GraphResult<Flowsheet> {
        let mut b = GraphBuilder::new(self.name.clone()).options(self.options.clone());
        for (id, meta) in self.node_meta() {
            b.node_meta(id, meta);
        }
        b.add_streams(streams);
        b.build()
    }

    /// Mutate a copy of stream `name`, rebuild and swap the result in.
    fn rewire<F>(&mut self, name: &str, f: F) -> GraphResult<()>
    where
        F: FnOnce(&mut Stream) -> GraphResult<()>,
    {
        let mut streams = self.current_streams();
        let target = streams
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| GraphError::StreamNotFound {
                name: name.to_string(),
            })?;
        f(target)?;
        tracing::debug!(stream = name, "rebuilding flowsheet after rewiring");
        let next = self.derive(streams)?;
        *self = next;
        Ok(())
    }
}

//! Core graph storage and adjacency helpers.
//!
//! Node `i` of the petgraph storage is always the flowsheet node with id `i`, so
//! ids stay dense and contiguous for the lifetime of a graph.

use std::sync::Arc;

use mf_core::NodeId;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::node::FlowNode;
use crate::stream::Stream;

/// Directed graph of nodes joined by streams.
pub(crate) type FlowGraph = DiGraph<FlowNode, Arc<Stream>>;

pub(crate) fn index_of(id: NodeId) -> NodeIndex {
    NodeIndex::new(id.index() as usize)
}

pub(crate) fn id_of(ix: NodeIndex) -> NodeId {
    NodeId::from_index(ix.index() as u64)
}

/// Streams on edges incident to `ix`, in edge insertion order.
pub(crate) fn incident(graph: &FlowGraph, ix: NodeIndex, dir: Direction) -> Vec<Arc<Stream>> {
    let mut edges: Vec<(EdgeIndex, Arc<Stream>)> = graph
        .edges_directed(ix, dir)
        .map(|e| (e.id(), Arc::clone(e.weight())))
        .collect();
    edges.sort_by_key(|(e, _)| e.index());
    edges.into_iter().map(|(_, s)| s).collect()
}

/// Recompute one node's input/output lists from the edge set.
pub(crate) fn refresh_node(graph: &mut FlowGraph, ix: NodeIndex) {
    let inputs = incident(graph, ix, Direction::Incoming);
    let outputs = incident(graph, ix, Direction::Outgoing);
    if let Some(node) = graph.node_weight_mut(ix) {
        node.inputs = inputs;
        node.outputs = outputs;
    }
}

/// Recompute every node's input/output lists.
pub(crate) fn refresh_all(graph: &mut FlowGraph) {
    for ix in graph.node_indices().collect::<Vec<_>>() {
        refresh_node(graph, ix);
    }
}

/// Total (in + out) degree of a node.
pub(crate) fn degree(graph: &FlowGraph, ix: NodeIndex) -> usize {
    graph.edges_directed(ix, Direction::Incoming).count()
        + graph.edges_directed(ix, Direction::Outgoing).count()
}

/// Edge carrying the stream called `name`.
pub(crate) fn find_edge(graph: &FlowGraph, name: &str) -> Option<EdgeIndex> {
    graph
        .edge_indices()
        .find(|&e| graph[e].name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::Table;

    #[test]
    fn index_and_id_agree() {
        for i in [0_u64, 1, 17] {
            let id = NodeId::from_index(i);
            assert_eq!(id_of(index_of(id)), id);
        }
    }

    #[test]
    fn refresh_follows_edges_in_insertion_order() {
        let mut g = FlowGraph::new();
        let a = g.add_node(FlowNode::new(NodeId::from_index(0)));
        let b = g.add_node(FlowNode::new(NodeId::from_index(1)));
        let s1 = Arc::new(Stream::new("s1", Table::empty(&["mass_dry"])));
        let s2 = Arc::new(Stream::new("s2", Table::empty(&["mass_dry"])));
        g.add_edge(a, b, s1);
        let c = g.add_node(FlowNode::new(NodeId::from_index(2)));
        g.add_edge(c, b, s2);

        refresh_all(&mut g);
        let names: Vec<&str> = g[b].inputs().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["s1", "s2"]);
        assert_eq!(degree(&g, b), 2);
        assert_eq!(degree(&g, a), 1);
        assert!(find_edge(&g, "s2").is_some());
        assert!(find_edge(&g, "nope").is_none());
    }
}

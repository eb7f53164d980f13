//! Graph validation logic.

use std::collections::HashSet;
use std::sync::Arc;

use petgraph::Direction;
use petgraph::visit::EdgeRef;

use crate::error::{GraphError, GraphResult};
use crate::graph::{self, FlowGraph};

/// Check that the graph's derived state agrees with its edge set.
///
/// Every stream's endpoints must name the nodes its edge joins, node ids must equal
/// their storage index, and each node's input/output lists must hold exactly the
/// streams of its incident edges, in edge order.
pub(crate) fn validate_graph(graph: &FlowGraph) -> GraphResult<()> {
    let mut names: HashSet<&str> = HashSet::with_capacity(graph.edge_count());

    for edge in graph.edge_references() {
        let stream = edge.weight();
        let from = graph::id_of(edge.source());
        let to = graph::id_of(edge.target());
        let ends = stream.require_endpoints()?;
        if ends.from != from || ends.to != to {
            return Err(GraphError::InconsistentAdjacency {
                node: from,
                what: format!(
                    "stream {} claims {} -> {} but joins {} -> {}",
                    stream.name(),
                    ends.from,
                    ends.to,
                    from,
                    to
                ),
            });
        }
        if !names.insert(stream.name()) {
            return Err(GraphError::DuplicateStreamName {
                name: stream.name().to_string(),
            });
        }
    }

    for ix in graph.node_indices() {
        let node = &graph[ix];
        let expected = graph::id_of(ix);
        if node.id != expected {
            return Err(GraphError::InconsistentAdjacency {
                node: node.id,
                what: format!("stored at position {expected}"),
            });
        }

        for (dir, held, label) in [
            (Direction::Incoming, node.inputs(), "inputs"),
            (Direction::Outgoing, node.outputs(), "outputs"),
        ] {
            let incident = graph::incident(graph, ix, dir);
            let same = incident.len() == held.len()
                && incident.iter().zip(held).all(|(a, b)| Arc::ptr_eq(a, b));
            if !same {
                return Err(GraphError::InconsistentAdjacency {
                    node: node.id,
                    what: format!("{label} do not match the incident streams"),
                });
            }
        }
    }

    Ok(())
}

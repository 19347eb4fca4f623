//! Graph validation logic.

use std::collections::HashSet;

use tg_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Layer, Node};

/// Validate the graph structure: ids are contiguous, references exist,
/// exactly one Source, and every edge steps to the next layer.
pub(crate) fn validate_structure(nodes: &[Node], edges: &[Edge]) -> GraphResult<()> {
    // Node IDs must match their positions
    for (i, node) in nodes.iter().enumerate() {
        if node.id.ix() != i {
            return Err(GraphError::Invariant {
                what: "node id does not match its position",
            });
        }
        if node.key.layer() != node.layer() {
            return Err(GraphError::Invariant {
                what: "node key layer differs from node kind",
            });
        }
    }

    let sources = nodes.iter().filter(|n| n.layer() == Layer::Source).count();
    if sources != 1 {
        return Err(GraphError::SourceCount { count: sources });
    }

    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::with_capacity(edges.len());
    for (i, edge) in edges.iter().enumerate() {
        if edge.id.ix() != i {
            return Err(GraphError::Invariant {
                what: "edge id does not match its position",
            });
        }

        let from = nodes.get(edge.from.ix()).ok_or(GraphError::InvalidNodeRef {
            edge: edge.id,
            node: edge.from,
        })?;
        let to = nodes.get(edge.to.ix()).ok_or(GraphError::InvalidNodeRef {
            edge: edge.id,
            node: edge.to,
        })?;

        // The fixed layer order is what makes the graph acyclic
        if from.layer().next() != Some(to.layer()) {
            return Err(GraphError::LayerViolation {
                edge: edge.id,
                from: from.layer(),
                to: to.layer(),
            });
        }

        if !seen.insert((edge.from, edge.to)) {
            return Err(GraphError::DuplicateEdge {
                from: edge.from,
                to: edge.to,
            });
        }
    }

    Ok(())
}

//! Graph-specific error types.

use tg_core::{EdgeId, NodeId};

use crate::graph::Layer;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A record lacks (or carries an unusable) field required by its layer.
    #[error("Malformed record #{index}: field '{field}' {reason}")]
    MalformedRecord {
        index: usize,
        field: &'static str,
        reason: String,
    },

    /// An edge refers to a node that doesn't exist.
    #[error("Edge {edge} refers to non-existent node {node}")]
    InvalidNodeRef { edge: EdgeId, node: NodeId },

    /// An edge skips a layer or points backwards.
    #[error("Edge {edge} connects layer {from} to layer {to}")]
    LayerViolation { edge: EdgeId, from: Layer, to: Layer },

    /// The same transition was recorded twice.
    #[error("Duplicate edge {from} -> {to}")]
    DuplicateEdge { from: NodeId, to: NodeId },

    /// The graph must hold exactly one Source node.
    #[error("Graph has {count} source nodes (expected 1)")]
    SourceCount { count: usize },

    /// Topological traversal could not visit every node.
    #[error("Cycle detected: topological order visited {visited} of {total} nodes")]
    Cycle { visited: usize, total: usize },

    /// ID or key not found in index.
    #[error("{what} not found in index")]
    IdNotFound { what: &'static str },

    /// Internal structure is inconsistent.
    #[error("Graph invariant violated: {what}")]
    Invariant { what: &'static str },

    /// More nodes or edges than an id can address.
    #[error("{what} capacity exceeded")]
    Capacity { what: &'static str },
}

impl GraphError {
    pub(crate) fn malformed(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        GraphError::MalformedRecord {
            index,
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_names_field() {
        let err = GraphError::malformed(3, "time", "is missing");
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("'time'"));
    }

    #[test]
    fn capacity_and_invariant_say_what_failed() {
        let err = GraphError::Capacity { what: "NodeId" };
        assert_eq!(err.to_string(), "NodeId capacity exceeded");
        let err = GraphError::Invariant { what: "edge id does not match its position" };
        assert!(err.to_string().starts_with("Graph invariant violated"));
    }
}

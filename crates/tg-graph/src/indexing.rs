//! Layer and key indexing.
//!
//! Provides O(1) lookup of nodes by layer, by `NodeKey` and by alloy name.

use std::collections::HashMap;

use tg_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Layer, Node, NodeKey};

/// Index built once from the frozen node list.
#[derive(Debug, Clone, Default)]
pub struct LayerIndex {
    /// Node IDs per layer, in creation order.
    by_layer: [Vec<NodeId>; 5],

    /// Reverse lookup: key -> node.
    by_key: HashMap<NodeKey, NodeId>,

    /// Alloy name -> Alloy node.
    by_alloy: HashMap<String, NodeId>,
}

impl LayerIndex {
    /// Build an index from a node list.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut index = Self::default();
        for node in nodes {
            index.by_layer[node.layer().index()].push(node.id);
            index.by_key.insert(node.key.clone(), node.id);
            if let NodeKey::Alloy { alloy } = &node.key {
                index.by_alloy.insert(alloy.clone(), node.id);
            }
        }
        index
    }

    /// Node IDs of one layer.
    pub fn layer(&self, layer: Layer) -> &[NodeId] {
        &self.by_layer[layer.index()]
    }

    /// Number of nodes per layer, in layer order.
    pub fn layer_sizes(&self) -> [usize; 5] {
        Layer::ALL.map(|l| self.by_layer[l.index()].len())
    }

    pub fn lookup(&self, key: &NodeKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// Like `lookup`, but a missing key is an error.
    pub fn require(&self, key: &NodeKey) -> GraphResult<NodeId> {
        self.lookup(key)
            .ok_or(GraphError::IdNotFound { what: "NodeKey" })
    }

    pub fn alloy(&self, name: &str) -> Option<NodeId> {
        self.by_alloy.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::record::TemperingRecord;
    use tg_core::canonical_bits;

    #[test]
    fn index_layers_and_keys() {
        let graph = build_graph(&[
            TemperingRecord::new("A", 30.0, 500.0, 52.0),
            TemperingRecord::new("A", 30.0, 550.0, 50.0),
        ])
        .unwrap();
        let index = graph.index();

        assert_eq!(index.layer_sizes(), [1, 1, 1, 2, 2]);

        let key = NodeKey::Temperature {
            alloy: "A".into(),
            time: canonical_bits(30.0),
            temperature: canonical_bits(550.0),
        };
        let id = index.require(&key).unwrap();
        assert_eq!(graph.node(id).unwrap().kind.value(), Some(550.0));
    }

    #[test]
    fn missing_key_is_error() {
        let graph = build_graph(&[TemperingRecord::new("A", 30.0, 500.0, 52.0)]).unwrap();
        let key = NodeKey::Alloy { alloy: "Z".into() };
        assert!(graph.index().require(&key).is_err());
        assert!(graph.alloy_by_name("Z").is_none());
    }
}

//! Core graph data structures.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use tg_core::{EdgeId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::indexing::LayerIndex;
use crate::record::normalize_attribute;

/// The five fixed layers, in edge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layer {
    Source,
    Alloy,
    Time,
    Temperature,
    Hardness,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Source,
        Layer::Alloy,
        Layer::Time,
        Layer::Temperature,
        Layer::Hardness,
    ];

    /// Position of the layer in the fixed order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The only layer this layer's edges may point into.
    pub fn next(self) -> Option<Layer> {
        Layer::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Source => "Source",
            Layer::Alloy => "Alloy",
            Layer::Time => "Time",
            Layer::Temperature => "Temperature",
            Layer::Hardness => "Hardness",
        };
        f.write_str(name)
    }
}

/// Alloy attributes carried by an Alloy node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlloyData {
    pub name: String,
    /// Composition keyed by normalized attribute name.
    pub composition: BTreeMap<String, f64>,
    /// Record sources that contributed observations for this alloy.
    pub sources: BTreeSet<String>,
}

impl AlloyData {
    /// Look up a composition attribute under any accepted spelling.
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.composition.get(&normalize_attribute(name)).copied()
    }
}

/// Node payload: a closed variant over the five layers.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Source,
    Alloy(AlloyData),
    /// Tempering time in seconds.
    Time(f64),
    /// Tempering temperature in °C.
    Temperature(f64),
    /// Final hardness in HRC.
    Hardness(f64),
}

impl NodeKind {
    pub fn layer(&self) -> Layer {
        match self {
            NodeKind::Source => Layer::Source,
            NodeKind::Alloy(_) => Layer::Alloy,
            NodeKind::Time(_) => Layer::Time,
            NodeKind::Temperature(_) => Layer::Temperature,
            NodeKind::Hardness(_) => Layer::Hardness,
        }
    }

    /// Numeric value of process and hardness nodes.
    pub fn value(&self) -> Option<f64> {
        match self {
            NodeKind::Time(v) | NodeKind::Temperature(v) | NodeKind::Hardness(v) => Some(*v),
            NodeKind::Source | NodeKind::Alloy(_) => None,
        }
    }
}

/// Identity of a node: kind, value and the upstream path that reached it.
///
/// Floats are keyed by canonical bit pattern (see `tg_core::canonical_bits`),
/// so `30.0` s under alloy A and `30.0` s under alloy B are distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Source,
    Alloy {
        alloy: String,
    },
    Time {
        alloy: String,
        time: u64,
    },
    Temperature {
        alloy: String,
        time: u64,
        temperature: u64,
    },
    Hardness {
        alloy: String,
        time: u64,
        temperature: u64,
        hardness: u64,
    },
}

impl NodeKey {
    pub fn layer(&self) -> Layer {
        match self {
            NodeKey::Source => Layer::Source,
            NodeKey::Alloy { .. } => Layer::Alloy,
            NodeKey::Time { .. } => Layer::Time,
            NodeKey::Temperature { .. } => Layer::Temperature,
            NodeKey::Hardness { .. } => Layer::Hardness,
        }
    }

    pub fn alloy(&self) -> Option<&str> {
        match self {
            NodeKey::Source => None,
            NodeKey::Alloy { alloy }
            | NodeKey::Time { alloy, .. }
            | NodeKey::Temperature { alloy, .. }
            | NodeKey::Hardness { alloy, .. } => Some(alloy),
        }
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub key: NodeKey,
    /// Alloy node this node descends from (itself for Alloy nodes, None for Source).
    pub alloy: Option<NodeId>,
}

impl Node {
    pub fn layer(&self) -> Layer {
        self.kind.layer()
    }

    /// Short human-readable label, e.g. `Time: 30 s`.
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Source => "Source".to_string(),
            NodeKind::Alloy(data) => format!("Alloy: {}", data.name),
            NodeKind::Time(v) => format!("Time: {v} s"),
            NodeKind::Temperature(v) => format!("Temperature: {v} °C"),
            NodeKind::Hardness(v) => format!("Hardness: {v} HRC"),
        }
    }
}

/// Raw metrics an edge contributes to costing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeMetrics {
    /// Δtime in seconds (Alloy → Time edges).
    pub time: Option<f64>,
    /// Tempering temperature in °C (Time → Temperature edges).
    pub temperature: Option<f64>,
}

/// A directed edge between adjacent layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub metrics: EdgeMetrics,
}

/// One observed (time, temperature, hardness) triple for an alloy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    pub time: f64,
    pub temperature: f64,
    pub hardness: f64,
    pub hardness_node: NodeId,
}

/// The tempering graph: a validated, immutable layered DAG.
///
/// The graph stores:
/// - All nodes and edges in vectors (indexed by their IDs).
/// - Compact CSR adjacency in both directions.
/// - A layer index for lookup by layer, key and alloy name.
///
/// A graph is built once per record set and shared read-only between queries.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,

    /// Node i's out-edges are in out_edges[out_offsets[i]..out_offsets[i+1]].
    pub(crate) out_offsets: Vec<usize>,
    pub(crate) out_edges: Vec<EdgeId>,

    /// Same layout for in-edges.
    pub(crate) in_offsets: Vec<usize>,
    pub(crate) in_edges: Vec<EdgeId>,

    pub(crate) index: LayerIndex,
    pub(crate) source: NodeId,
}

impl Graph {
    /// Return all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.ix())
    }

    /// Get an edge by ID (returns None if ID out of bounds).
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.ix())
    }

    /// The single Source node.
    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn index(&self) -> &LayerIndex {
        &self.index
    }

    /// Node IDs in the given layer, in creation order.
    pub fn layer(&self, layer: Layer) -> &[NodeId] {
        self.index.layer(layer)
    }

    /// Resolve a node key to its ID.
    pub fn lookup(&self, key: &NodeKey) -> Option<NodeId> {
        self.index.lookup(key)
    }

    /// Outgoing edge IDs of a node.
    pub fn out_edges(&self, node_id: NodeId) -> &[EdgeId] {
        Self::slice(&self.out_offsets, &self.out_edges, node_id)
    }

    /// Incoming edge IDs of a node.
    pub fn in_edges(&self, node_id: NodeId) -> &[EdgeId] {
        Self::slice(&self.in_offsets, &self.in_edges, node_id)
    }

    /// Direct successors of a node.
    pub fn successors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out_edges(node_id)
            .iter()
            .filter_map(|&e| self.edge(e).map(|edge| edge.to))
    }

    /// Direct predecessors of a node.
    pub fn predecessors(&self, node_id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges(node_id)
            .iter()
            .filter_map(|&e| self.edge(e).map(|edge| edge.from))
    }

    /// Alloy payload of the alloy a node descends from.
    pub fn alloy_of(&self, node_id: NodeId) -> Option<&AlloyData> {
        let alloy = self.node(node_id)?.alloy?;
        match &self.node(alloy)?.kind {
            NodeKind::Alloy(data) => Some(data),
            _ => None,
        }
    }

    /// Alloy node by exact alloy id.
    pub fn alloy_by_name(&self, name: &str) -> Option<NodeId> {
        self.index.alloy(name)
    }

    /// Iterate over all alloy nodes with their payloads.
    pub fn alloys(&self) -> impl Iterator<Item = (NodeId, &AlloyData)> + '_ {
        self.layer(Layer::Alloy)
            .iter()
            .filter_map(|&id| match &self.node(id)?.kind {
                NodeKind::Alloy(data) => Some((id, data)),
                _ => None,
            })
    }

    /// Every observed (time, temperature, hardness) for an alloy node.
    pub fn observations(&self, alloy: NodeId) -> Vec<Observation> {
        let mut out = Vec::new();
        for time_id in self.successors(alloy) {
            let Some(time) = self.node(time_id).and_then(|n| n.kind.value()) else {
                continue;
            };
            for temp_id in self.successors(time_id) {
                let Some(temperature) = self.node(temp_id).and_then(|n| n.kind.value()) else {
                    continue;
                };
                for hard_id in self.successors(temp_id) {
                    if let Some(hardness) = self.node(hard_id).and_then(|n| n.kind.value()) {
                        out.push(Observation {
                            time,
                            temperature,
                            hardness,
                            hardness_node: hard_id,
                        });
                    }
                }
            }
        }
        out
    }

    /// Kahn topological order; fails with `Cycle` if some node is never freed.
    ///
    /// Each node is visited exactly once; ties are released in ID order.
    pub fn topological_order(&self) -> GraphResult<Vec<NodeId>> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = (0..n)
            .map(|i| self.in_offsets[i + 1] - self.in_offsets[i])
            .collect();
        let mut queue: VecDeque<NodeId> = self
            .nodes
            .iter()
            .filter(|node| in_degree[node.id.ix()] == 0)
            .map(|node| node.id)
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &edge_id in self.out_edges(id) {
                let to = self.edges[edge_id.ix()].to;
                let deg = &mut in_degree[to.ix()];
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(to);
                }
            }
        }

        if order.len() != n {
            return Err(GraphError::Cycle {
                visited: order.len(),
                total: n,
            });
        }
        Ok(order)
    }

    fn slice<'a>(offsets: &[usize], flat: &'a [EdgeId], node_id: NodeId) -> &'a [EdgeId] {
        let idx = node_id.ix();
        if idx + 1 >= offsets.len() {
            return &[];
        }
        &flat[offsets[idx]..offsets[idx + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::record::TemperingRecord;

    #[test]
    fn layer_order_is_fixed() {
        assert_eq!(Layer::Source.next(), Some(Layer::Alloy));
        assert_eq!(Layer::Temperature.next(), Some(Layer::Hardness));
        assert_eq!(Layer::Hardness.next(), None);
        assert_eq!(Layer::Time.index(), 2);
    }

    #[test]
    fn node_labels() {
        let graph = build_graph(&[TemperingRecord::new("A", 30.0, 500.0, 52.0)]).unwrap();
        let labels: Vec<String> = graph.nodes().iter().map(Node::label).collect();
        assert_eq!(
            labels,
            vec![
                "Source",
                "Alloy: A",
                "Time: 30 s",
                "Temperature: 500 °C",
                "Hardness: 52 HRC"
            ]
        );
    }

    #[test]
    fn observations_walk_alloy_subtree() {
        let graph = build_graph(&[
            TemperingRecord::new("A", 30.0, 500.0, 52.0),
            TemperingRecord::new("A", 60.0, 500.0, 50.0),
            TemperingRecord::new("B", 30.0, 500.0, 40.0),
        ])
        .unwrap();
        let a = graph.alloy_by_name("A").unwrap();
        let mut obs = graph.observations(a);
        obs.sort_by(|x, y| x.time.total_cmp(&y.time));
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].hardness, 52.0);
        assert_eq!(obs[1].hardness, 50.0);
    }

    #[test]
    fn alloy_attribute_lookup_accepts_spellings() {
        let graph = build_graph(&[
            TemperingRecord::new("A", 30.0, 500.0, 52.0).with_component("C (%wt)", 0.45)
        ])
        .unwrap();
        let a = graph.alloy_by_name("A").unwrap();
        let data = graph.alloy_of(a).unwrap();
        assert_eq!(data.attribute("%C"), Some(0.45));
        assert_eq!(data.attribute("Cr"), None);
    }
}

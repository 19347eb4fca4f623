//! Topology builder: records in, layered graph out.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tg_core::{ABSOLUTE_ZERO_C, EdgeId, NodeId, Tolerances, canonical_bits, nearly_equal};
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::graph::{AlloyData, Edge, EdgeMetrics, Graph, Node, NodeKey, NodeKind};
use crate::indexing::LayerIndex;
use crate::record::{TemperingRecord, normalize_attribute};
use crate::validate;

/// Build a graph from a full record set.
///
/// Equivalent to feeding every record to a `GraphBuilder` and calling `build()`.
pub fn build_graph(records: &[TemperingRecord]) -> GraphResult<Graph> {
    let mut builder = GraphBuilder::new();
    for record in records {
        builder.add_record(record)?;
    }
    builder.build()
}

/// A record whose required fields have been checked.
struct CheckedRecord<'a> {
    alloy: &'a str,
    time: f64,
    temperature: f64,
    hardness: f64,
}

impl<'a> CheckedRecord<'a> {
    fn check(index: usize, record: &'a TemperingRecord) -> GraphResult<Self> {
        let alloy = record.alloy_id.trim();
        if alloy.is_empty() {
            return Err(GraphError::malformed(index, "alloy_id", "is blank"));
        }

        let time = Self::finite(index, "time", record.time)?;
        if time < 0.0 {
            return Err(GraphError::malformed(
                index,
                "time",
                format!("is negative ({time})"),
            ));
        }

        let temperature = Self::finite(index, "temperature", record.temperature)?;
        if temperature < ABSOLUTE_ZERO_C {
            return Err(GraphError::malformed(
                index,
                "temperature",
                format!("is below absolute zero ({temperature} °C)"),
            ));
        }

        let hardness = Self::finite(index, "hardness", record.hardness)?;

        if let Some((attr, value)) = record.composition.iter().find(|(_, v)| !v.is_finite()) {
            return Err(GraphError::malformed(
                index,
                "composition",
                format!("has non-finite value {value} for '{attr}'"),
            ));
        }

        Ok(Self {
            alloy,
            time,
            temperature,
            hardness,
        })
    }

    fn finite(index: usize, field: &'static str, value: Option<f64>) -> GraphResult<f64> {
        match value {
            None => Err(GraphError::malformed(index, field, "is missing")),
            Some(v) if !v.is_finite() => Err(GraphError::malformed(
                index,
                field,
                format!("is not finite ({v})"),
            )),
            Some(v) => Ok(v),
        }
    }
}

/// Builder for constructing a graph record by record.
///
/// Use `add_record` to grow the graph, then call `build()` to validate and
/// freeze it into an immutable `Graph`.
#[derive(Debug)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    keys: HashMap<NodeKey, NodeId>,
    transitions: HashSet<(NodeId, NodeId)>,
    records_seen: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Create a builder holding only the Source node.
    pub fn new() -> Self {
        let source = NodeId::from_index(0);
        let mut keys = HashMap::new();
        keys.insert(NodeKey::Source, source);
        Self {
            nodes: vec![Node {
                id: source,
                kind: NodeKind::Source,
                key: NodeKey::Source,
                alloy: None,
            }],
            edges: Vec::new(),
            keys,
            transitions: HashSet::new(),
            records_seen: 0,
        }
    }

    /// Number of records accepted so far.
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Add one observation, creating any missing nodes and edges along its path.
    ///
    /// Returns the Hardness node the record ends in.
    pub fn add_record(&mut self, record: &TemperingRecord) -> GraphResult<NodeId> {
        let index = self.records_seen;
        let row = CheckedRecord::check(index, record)?;

        let source = NodeId::from_index(0);
        let alloy_key = NodeKey::Alloy {
            alloy: row.alloy.to_string(),
        };
        let alloy_id = match self.keys.get(&alloy_key) {
            Some(&id) => {
                self.merge_alloy(id, record);
                id
            }
            None => {
                let data = AlloyData {
                    name: row.alloy.to_string(),
                    composition: record
                        .composition
                        .iter()
                        .map(|(k, &v)| (normalize_attribute(k), v))
                        .collect::<BTreeMap<_, _>>(),
                    sources: Self::sources_of(record),
                };
                let id = self.push_node(alloy_key, NodeKind::Alloy(data), None)?;
                self.connect(source, id, EdgeMetrics::default())?;
                id
            }
        };

        let t = canonical_bits(row.time);
        let temp = canonical_bits(row.temperature);
        let hard = canonical_bits(row.hardness);
        let alloy = row.alloy.to_string();

        let time_id = self.node_for(
            NodeKey::Time {
                alloy: alloy.clone(),
                time: t,
            },
            NodeKind::Time(row.time),
            alloy_id,
        )?;
        self.connect(
            alloy_id,
            time_id,
            EdgeMetrics {
                time: Some(row.time),
                temperature: None,
            },
        )?;

        let temp_id = self.node_for(
            NodeKey::Temperature {
                alloy: alloy.clone(),
                time: t,
                temperature: temp,
            },
            NodeKind::Temperature(row.temperature),
            alloy_id,
        )?;
        self.connect(
            time_id,
            temp_id,
            EdgeMetrics {
                time: None,
                temperature: Some(row.temperature),
            },
        )?;

        let hard_id = self.node_for(
            NodeKey::Hardness {
                alloy,
                time: t,
                temperature: temp,
                hardness: hard,
            },
            NodeKind::Hardness(row.hardness),
            alloy_id,
        )?;
        self.connect(temp_id, hard_id, EdgeMetrics::default())?;

        self.records_seen += 1;
        Ok(hard_id)
    }

    /// Build and validate the graph, returning an immutable `Graph`.
    ///
    /// This performs validation and constructs compact adjacency lists.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate_structure(&self.nodes, &self.edges)?;

        let (out_offsets, out_edges) = Self::build_adjacency(self.nodes.len(), &self.edges, |e| e.from);
        let (in_offsets, in_edges) = Self::build_adjacency(self.nodes.len(), &self.edges, |e| e.to);
        let index = LayerIndex::from_nodes(&self.nodes);

        let graph = Graph {
            nodes: self.nodes,
            edges: self.edges,
            out_offsets,
            out_edges,
            in_offsets,
            in_edges,
            index,
            source: NodeId::from_index(0),
        };

        // Layer checks already rule out cycles; the traversal makes it observable.
        graph.topological_order()?;

        debug!(
            records = self.records_seen,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            layers = ?graph.index().layer_sizes(),
            "tempering graph built"
        );
        Ok(graph)
    }

    fn node_for(&mut self, key: NodeKey, kind: NodeKind, alloy: NodeId) -> GraphResult<NodeId> {
        match self.keys.get(&key) {
            Some(&id) => Ok(id),
            None => self.push_node(key, kind, Some(alloy)),
        }
    }

    fn push_node(
        &mut self,
        key: NodeKey,
        kind: NodeKind,
        alloy: Option<NodeId>,
    ) -> GraphResult<NodeId> {
        let id = NodeId::try_from_usize(self.nodes.len())
            .ok_or(GraphError::Capacity { what: "NodeId" })?;
        // Alloy nodes are their own alloy.
        let alloy = alloy.or(Some(id));
        self.keys.insert(key.clone(), id);
        self.nodes.push(Node {
            id,
            kind,
            key,
            alloy,
        });
        Ok(id)
    }

    fn connect(&mut self, from: NodeId, to: NodeId, metrics: EdgeMetrics) -> GraphResult<()> {
        if !self.transitions.insert((from, to)) {
            return Ok(());
        }
        let id = EdgeId::try_from_usize(self.edges.len())
            .ok_or(GraphError::Capacity { what: "EdgeId" })?;
        self.edges.push(Edge {
            id,
            from,
            to,
            metrics,
        });
        Ok(())
    }

    /// Fold a repeated alloy's record into the existing node.
    ///
    /// The first record fixes the composition; conflicting values are logged.
    fn merge_alloy(&mut self, id: NodeId, record: &TemperingRecord) {
        let tol = Tolerances::default();
        let Some(NodeKind::Alloy(data)) = self.nodes.get_mut(id.ix()).map(|n| &mut n.kind) else {
            return;
        };
        for (raw, &value) in &record.composition {
            let attr = normalize_attribute(raw);
            match data.composition.get(&attr) {
                Some(&known) if !nearly_equal(known, value, tol) => {
                    warn!(
                        alloy = %data.name,
                        attribute = %attr,
                        kept = known,
                        ignored = value,
                        "conflicting composition value for alloy"
                    );
                }
                Some(_) => {}
                None => {
                    data.composition.insert(attr, value);
                }
            }
        }
        data.sources.extend(Self::sources_of(record));
    }

    fn sources_of(record: &TemperingRecord) -> BTreeSet<String> {
        let source = record.source.trim();
        if source.is_empty() {
            BTreeSet::new()
        } else {
            BTreeSet::from([source.to_string()])
        }
    }

    /// Build CSR adjacency keyed by `endpoint(edge)`; edge order is kept for determinism.
    fn build_adjacency(
        node_count: usize,
        edges: &[Edge],
        endpoint: impl Fn(&Edge) -> NodeId,
    ) -> (Vec<usize>, Vec<EdgeId>) {
        let mut counts = vec![0usize; node_count];
        for edge in edges {
            counts[endpoint(edge).ix()] += 1;
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        for c in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + c);
        }

        let mut cursor = offsets[..node_count].to_vec();
        let mut flat = vec![EdgeId::from_index(0); edges.len()];
        for edge in edges {
            let slot = &mut cursor[endpoint(edge).ix()];
            flat[*slot] = edge.id;
            *slot += 1;
        }

        (offsets, flat)
    }
}

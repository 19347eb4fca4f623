//! Single-source shortest paths over the live search space.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tg_core::{EdgeId, NodeId, Tolerances, nearly_equal};
use tg_graph::{Graph, NodeKind};

use crate::cost::EdgeWeights;
use crate::filter::SearchSpace;

/// Heap entry ordered so that `BinaryHeap` pops the cheapest node first.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Distances and predecessor edges from the Source.
///
/// `dist` is `f64::INFINITY` for nodes never reached.
#[derive(Debug, Clone)]
pub(crate) struct ShortestPaths {
    pub dist: Vec<f64>,
    pub pred: Vec<Option<EdgeId>>,
}

impl ShortestPaths {
    pub fn reached(&self, id: NodeId) -> bool {
        self.dist.get(id.ix()).is_some_and(|d| d.is_finite())
    }
}

/// Dijkstra with lazy deletion. Requires non-negative weights.
pub(crate) fn dijkstra(graph: &Graph, space: &SearchSpace, weights: &EdgeWeights) -> ShortestPaths {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut pred: Vec<Option<EdgeId>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    let source = graph.source();
    if space.is_live(source) {
        dist[source.ix()] = 0.0;
        heap.push(Frontier {
            cost: 0.0,
            node: source,
        });
    }

    while let Some(Frontier { cost, node }) = heap.pop() {
        if cost > dist[node.ix()] {
            continue;
        }
        for &edge_id in graph.out_edges(node) {
            let edge = &graph.edges()[edge_id.ix()];
            if !space.is_live(edge.to) {
                continue;
            }
            let w = weights.get(edge_id);
            debug_assert!(w >= 0.0, "negative edge weight {w}");
            let next = cost + w;
            if next < dist[edge.to.ix()] {
                dist[edge.to.ix()] = next;
                pred[edge.to.ix()] = Some(edge_id);
                heap.push(Frontier {
                    cost: next,
                    node: edge.to,
                });
            }
        }
    }

    ShortestPaths { dist, pred }
}

/// A reached target with the keys used to order routes.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'g> {
    pub node: NodeId,
    pub cost: f64,
    pub time: f64,
    pub temperature: f64,
    pub alloy: &'g str,
}

impl<'g> Candidate<'g> {
    /// Collect tie-break keys by walking the predecessor chain.
    pub fn new(graph: &'g Graph, paths: &ShortestPaths, node: NodeId) -> Self {
        let (mut time, mut temperature) = (0.0, 0.0);
        let mut cursor = node;
        while let Some(edge_id) = paths.pred[cursor.ix()] {
            let from = graph.edges()[edge_id.ix()].from;
            match graph.node(from).map(|n| &n.kind) {
                Some(NodeKind::Time(v)) => time = *v,
                Some(NodeKind::Temperature(v)) => temperature = *v,
                _ => {}
            }
            cursor = from;
        }
        let alloy = graph.alloy_of(node).map(|a| a.name.as_str()).unwrap_or("");
        Self {
            node,
            cost: paths.dist[node.ix()],
            time,
            temperature,
            alloy,
        }
    }

    /// Tie-break after cost: lower time, lower temperature, smaller alloy id,
    /// then lower node id.
    fn tie_break(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.temperature.total_cmp(&other.temperature))
            .then_with(|| self.alloy.cmp(other.alloy))
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Order candidates best-first.
///
/// Costs within `tol` of the cheapest remaining candidate form one tie group;
/// each group is then ordered by the tie-break keys. Grouping keeps the
/// comparison a total order even though float equality is tolerant.
pub(crate) fn rank(mut candidates: Vec<Candidate<'_>>, tol: Tolerances) -> Vec<Candidate<'_>> {
    candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost).then_with(|| a.node.cmp(&b.node)));

    let mut ranked = Vec::with_capacity(candidates.len());
    let mut rest = candidates.as_slice();
    while let Some(head) = rest.first() {
        let group_len = rest
            .iter()
            .take_while(|c| nearly_equal(c.cost, head.cost, tol))
            .count();
        let mut group = rest[..group_len].to_vec();
        group.sort_by(Candidate::tie_break);
        ranked.extend(group);
        rest = &rest[group_len..];
    }
    ranked
}

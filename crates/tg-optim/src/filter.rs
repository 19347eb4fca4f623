//! Filter engine: prune the graph to the query's search space.
//!
//! Pruning is structural. A node is live only if it is reachable from the
//! Source through nodes that pass their layer predicate AND it can reach an
//! in-range Hardness node the same way. Descendants of a pruned node are
//! therefore never offered to the search.

use std::collections::VecDeque;

use tg_core::NodeId;
use tg_graph::{Edge, Graph, Layer, NodeKind};
use tracing::debug;

use crate::error::{OptimError, OptimResult};
use crate::query::Query;

/// Live sub-graph for one query.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    live: Vec<bool>,
    alloys: Vec<NodeId>,
    targets: Vec<NodeId>,
}

impl SearchSpace {
    /// Apply the query's predicates and prune unreachable parts.
    ///
    /// Fails with `EmptyResult` when no Alloy node survives the alloy-level
    /// predicates. An empty target set is not an error here; the search
    /// reports it as `NoFeasibleRoute`.
    pub fn prune(graph: &Graph, query: &Query) -> OptimResult<Self> {
        let passes: Vec<bool> = graph
            .nodes()
            .iter()
            .map(|node| match &node.kind {
                NodeKind::Source => true,
                NodeKind::Alloy(data) => query.accepts_alloy(data),
                NodeKind::Time(t) => query.time_range.is_none_or(|r| r.contains(*t)),
                NodeKind::Temperature(t) => query.temperature_range.is_none_or(|r| r.contains(*t)),
                NodeKind::Hardness(h) => query.hardness_range.contains(*h),
            })
            .collect();

        let alloys: Vec<NodeId> = graph
            .layer(Layer::Alloy)
            .iter()
            .copied()
            .filter(|id| passes[id.ix()])
            .collect();
        if alloys.is_empty() {
            return Err(OptimError::EmptyResult {
                reason: format!(
                    "no alloy matches the filters of query '{}' ({} alloys considered)",
                    query.label(),
                    graph.layer(Layer::Alloy).len()
                ),
            });
        }

        let forward = Self::sweep(graph.node_count(), [graph.source()], |id| {
            graph
                .out_edges(id)
                .iter()
                .map(|&e| graph.edges()[e.ix()].to)
                .filter(|to| passes[to.ix()])
                .collect::<Vec<_>>()
        });

        let seeds: Vec<NodeId> = graph
            .layer(Layer::Hardness)
            .iter()
            .copied()
            .filter(|id| passes[id.ix()] && forward[id.ix()])
            .collect();
        let backward = Self::sweep(graph.node_count(), seeds.iter().copied(), |id| {
            graph
                .in_edges(id)
                .iter()
                .map(|&e| graph.edges()[e.ix()].from)
                .filter(|from| forward[from.ix()])
                .collect::<Vec<_>>()
        });

        let live: Vec<bool> = forward
            .iter()
            .zip(&backward)
            .map(|(&f, &b)| f && b)
            .collect();
        let targets = seeds;

        debug!(
            query = query.label(),
            alloys = alloys.len(),
            targets = targets.len(),
            live_nodes = live.iter().filter(|&&l| l).count(),
            "search space pruned"
        );

        Ok(Self {
            live,
            alloys,
            targets,
        })
    }

    /// Whether a node takes part in the search.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.live.get(id.ix()).copied().unwrap_or(false)
    }

    /// An edge is live when both of its endpoints are.
    pub fn edge_is_live(&self, edge: &Edge) -> bool {
        self.is_live(edge.from) && self.is_live(edge.to)
    }

    /// Alloys passing the alloy-level predicates, reachable or not.
    pub fn alloys(&self) -> &[NodeId] {
        &self.alloys
    }

    /// In-range Hardness nodes reachable from the Source.
    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn reachable_hardness(&self) -> usize {
        self.targets.len()
    }

    pub fn live_node_count(&self) -> usize {
        self.live.iter().filter(|&&l| l).count()
    }

    /// Breadth-first marking from `seeds` following `next`.
    fn sweep<I, F>(node_count: usize, seeds: I, next: F) -> Vec<bool>
    where
        I: IntoIterator<Item = NodeId>,
        F: Fn(NodeId) -> Vec<NodeId>,
    {
        let mut marked = vec![false; node_count];
        let mut queue = VecDeque::new();
        for seed in seeds {
            if !marked[seed.ix()] {
                marked[seed.ix()] = true;
                queue.push_back(seed);
            }
        }
        while let Some(id) = queue.pop_front() {
            for n in next(id) {
                if !marked[n.ix()] {
                    marked[n.ix()] = true;
                    queue.push_back(n);
                }
            }
        }
        marked
    }
}

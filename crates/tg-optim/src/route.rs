//! Optimal route output.

use std::collections::BTreeMap;

use tg_core::{EdgeId, NodeId, ensure_finite};
use tg_graph::{Graph, GraphError, Layer, NodeKind};

use crate::cost::EdgeWeights;
use crate::error::OptimResult;
use crate::query::Objective;

/// One node along a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteStep {
    pub node: NodeId,
    pub layer: Layer,
    pub label: String,
}

/// Cost contributed by one edge of a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeCost {
    pub edge: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

/// A complete Source → Hardness processing route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub query: String,
    pub objective: Objective,
    pub alloy_id: String,
    pub composition: BTreeMap<String, f64>,
    /// Tempering time (s).
    pub time: f64,
    /// Tempering temperature (°C).
    pub temperature: f64,
    /// Final hardness (HRC).
    pub hardness: f64,
    pub total_cost: f64,
    pub steps: Vec<RouteStep>,
    pub edges: Vec<EdgeCost>,
}

impl Route {
    /// Rebuild the route ending at `target` from predecessor edges.
    pub(crate) fn reconstruct(
        graph: &Graph,
        weights: &EdgeWeights,
        pred: &[Option<EdgeId>],
        target: NodeId,
        query: &str,
        objective: Objective,
    ) -> OptimResult<Self> {
        let mut path_edges = Vec::with_capacity(4);
        let mut cursor = target;
        while let Some(edge_id) = pred.get(cursor.ix()).copied().flatten() {
            let edge = graph
                .edge(edge_id)
                .ok_or(GraphError::IdNotFound { what: "EdgeId" })?;
            path_edges.push(edge);
            cursor = edge.from;
        }
        if cursor != graph.source() {
            return Err(GraphError::Invariant {
                what: "predecessor chain does not reach Source",
            }
            .into());
        }
        path_edges.reverse();

        let mut steps = Vec::with_capacity(path_edges.len() + 1);
        let mut push_step = |id: NodeId| -> OptimResult<()> {
            let node = graph.node(id).ok_or(GraphError::IdNotFound { what: "NodeId" })?;
            steps.push(RouteStep {
                node: id,
                layer: node.layer(),
                label: node.label(),
            });
            Ok(())
        };
        push_step(graph.source())?;
        for edge in &path_edges {
            push_step(edge.to)?;
        }

        let mut edges = Vec::with_capacity(path_edges.len());
        let mut total_cost = 0.0;
        for edge in &path_edges {
            let weight = ensure_finite(weights.get(edge.id), "route edge weight")?;
            total_cost += weight;
            edges.push(EdgeCost {
                edge: edge.id,
                from: edge.from,
                to: edge.to,
                weight,
            });
        }
        let total_cost = ensure_finite(total_cost, "route total cost")?;

        let (mut alloy_id, mut composition) = (String::new(), BTreeMap::new());
        let (mut time, mut temperature, mut hardness) = (f64::NAN, f64::NAN, f64::NAN);
        for step in &steps {
            match graph.node(step.node).map(|n| &n.kind) {
                Some(NodeKind::Alloy(data)) => {
                    alloy_id = data.name.clone();
                    composition = data.composition.clone();
                }
                Some(NodeKind::Time(v)) => time = *v,
                Some(NodeKind::Temperature(v)) => temperature = *v,
                Some(NodeKind::Hardness(v)) => hardness = *v,
                _ => {}
            }
        }
        ensure_finite(time, "route time")?;
        ensure_finite(temperature, "route temperature")?;
        ensure_finite(hardness, "route hardness")?;

        Ok(Self {
            query: query.to_string(),
            objective,
            alloy_id,
            composition,
            time,
            temperature,
            hardness,
            total_cost,
            steps,
            edges,
        })
    }

    /// Node ids from Source to the Hardness node.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.steps.iter().map(|s| s.node).collect()
    }

    /// The Hardness node the route ends in.
    pub fn target(&self) -> Option<NodeId> {
        self.steps.last().map(|s| s.node)
    }

    /// `Source -> Alloy: A -> Time: 30 s -> ...`
    pub fn describe(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostModel;
    use crate::filter::SearchSpace;
    use crate::query::{Query, ValueRange};
    use tg_graph::{TemperingRecord, build_graph};

    #[test]
    fn broken_predecessor_chain_is_an_invariant_error() {
        let g = build_graph(&[TemperingRecord::new("A", 30.0, 500.0, 52.0)]).unwrap();
        let q = Query::new(Objective::Time, ValueRange::new(50.0, 55.0));
        let space = SearchSpace::prune(&g, &q).unwrap();
        let weights = CostModel::for_query(&g, &space, &q).unwrap().weights(&g);
        let target = g.layer(Layer::Hardness)[0];

        let err = Route::reconstruct(&g, &weights, &[], target, "q", Objective::Time).unwrap_err();
        assert!(matches!(
            err,
            crate::error::OptimError::Graph(GraphError::Invariant { .. })
        ));
    }
}

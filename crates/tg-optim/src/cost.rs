//! Cost assigner: per-query edge weights.
//!
//! Weights are never stored on the graph. Each query builds a `CostModel`
//! and evaluates it into a fresh `EdgeWeights`, so switching objective only
//! re-costs the edges.

use tg_core::{EdgeId, min_max_normalize};
use tg_graph::{EdgeMetrics, Graph};

use crate::error::OptimResult;
use crate::filter::SearchSpace;
use crate::query::{Objective, Query, TemperatureCost};

/// `alpha * norm_time + (1 - alpha) * norm_temp`.
pub fn combine_balanced(alpha: f64, norm_time: f64, norm_temp: f64) -> f64 {
    alpha * norm_time + (1.0 - alpha) * norm_temp
}

/// Observed span of a raw cost component over the candidate edges.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Bounds {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |b, v| Bounds {
                min: b.min.min(v),
                max: b.max.max(v),
            },
        )
    }

    /// Empty sets normalize everything to 0.
    pub fn normalize(&self, v: f64) -> f64 {
        if self.min > self.max {
            return 0.0;
        }
        min_max_normalize(v, self.min, self.max)
    }
}

/// Cost model for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    objective: Objective,
    alpha: f64,
    temperature_cost: TemperatureCost,
    time_bounds: Bounds,
    temperature_bounds: Bounds,
}

impl CostModel {
    /// Build the model for `query` with normalization bounds taken from the
    /// live edges of `space`.
    pub fn for_query(graph: &Graph, space: &SearchSpace, query: &Query) -> OptimResult<Self> {
        query.validate()?;

        let live = || graph.edges().iter().filter(|e| space.edge_is_live(e));
        let time_bounds = Bounds::of(live().filter_map(|e| e.metrics.time));
        let temperature_bounds = Bounds::of(
            live()
                .filter_map(|e| e.metrics.temperature)
                .map(|t| query.temperature_cost.apply(t)),
        );

        Ok(Self {
            objective: query.objective,
            alpha: query.alpha,
            temperature_cost: query.temperature_cost,
            time_bounds,
            temperature_bounds,
        })
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn time_bounds(&self) -> Bounds {
        self.time_bounds
    }

    pub fn temperature_bounds(&self) -> Bounds {
        self.temperature_bounds
    }

    /// Weight of one edge under this model.
    pub fn edge_weight(&self, metrics: &EdgeMetrics) -> f64 {
        let time = metrics.time.unwrap_or(0.0);
        let temp_cost = metrics.temperature.map(|t| self.temperature_cost.apply(t));
        match self.objective {
            Objective::Time => time,
            Objective::Temperature => temp_cost.unwrap_or(0.0),
            Objective::Balanced => {
                let t = metrics
                    .time
                    .map(|v| self.alpha * self.time_bounds.normalize(v))
                    .unwrap_or(0.0);
                let c = temp_cost
                    .map(|v| (1.0 - self.alpha) * self.temperature_bounds.normalize(v))
                    .unwrap_or(0.0);
                t + c
            }
        }
    }

    /// Weights for every edge of `graph`, indexed by edge id.
    pub fn weights(&self, graph: &Graph) -> EdgeWeights {
        EdgeWeights {
            weights: graph
                .edges()
                .iter()
                .map(|e| self.edge_weight(&e.metrics))
                .collect(),
        }
    }

    /// Cost of a whole process at (time, temperature), as a route through
    /// those values would accumulate it.
    pub fn cell_cost(&self, time: f64, temperature: f64) -> f64 {
        self.edge_weight(&EdgeMetrics {
            time: Some(time),
            temperature: None,
        }) + self.edge_weight(&EdgeMetrics {
            time: None,
            temperature: Some(temperature),
        })
    }
}

/// Edge weights of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeWeights {
    weights: Vec<f64>,
}

impl EdgeWeights {
    pub fn get(&self, edge: EdgeId) -> f64 {
        self.weights.get(edge.ix()).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

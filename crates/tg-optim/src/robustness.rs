//! Robustness mapper: feasibility and cost over a (time, temperature) grid
//! around an optimal route.

use rayon::prelude::*;
use tg_core::NodeId;
use tg_graph::{Graph, GraphError};
use tracing::debug;

use crate::cost::CostModel;
use crate::error::{OptimError, OptimResult};
use crate::filter::SearchSpace;
use crate::query::{Objective, Query, ValueRange};
use crate::response::{HardnessResponse, ObservedResponse};
use crate::route::Route;

/// Linearly spaced axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl Axis {
    pub fn new(min: f64, max: f64, steps: usize) -> Self {
        Self { min, max, steps }
    }

    /// `steps` points from `min` to `max`; a single step yields `[min]`.
    pub fn points(&self) -> Vec<f64> {
        if self.steps <= 1 {
            return vec![self.min];
        }
        let delta = (self.max - self.min) / (self.steps - 1) as f64;
        let mut points: Vec<f64> = (0..self.steps)
            .map(|i| self.min + i as f64 * delta)
            .collect();
        points[self.steps - 1] = self.max;
        points
    }

    /// Distance between neighbouring points; 0 for a single point.
    pub fn spacing(&self) -> f64 {
        if self.steps <= 1 {
            0.0
        } else {
            (self.max - self.min) / (self.steps - 1) as f64
        }
    }

    fn validate(&self, what: &str) -> OptimResult<()> {
        if self.steps == 0 {
            return Err(OptimError::invalid_grid(format!(
                "{what} axis needs at least one step"
            )));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(OptimError::invalid_grid(format!(
                "{what} axis bounds must be finite"
            )));
        }
        if self.min > self.max {
            return Err(OptimError::invalid_grid(format!(
                "{what} axis min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Time (s) and temperature (°C) axes of a robustness grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSpec {
    pub time: Axis,
    pub temperature: Axis,
}

impl GridSpec {
    pub fn new(time: Axis, temperature: Axis) -> Self {
        Self { time, temperature }
    }

    pub fn validate(&self) -> OptimResult<()> {
        self.time.validate("time")?;
        self.temperature.validate("temperature")?;
        self.cell_count().map(|_| ())
    }

    /// Axes spanning every observation of `alloy`, `steps` points each.
    pub fn spanning(graph: &Graph, alloy: NodeId, steps: usize) -> OptimResult<Self> {
        let observations = graph.observations(alloy);
        if observations.is_empty() {
            return Err(OptimError::invalid_grid(format!(
                "alloy node {alloy} has no observations"
            )));
        }
        let axis = |f: fn(&tg_graph::Observation) -> f64| {
            let (min, max) = observations
                .iter()
                .map(f)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            Axis::new(min, max, steps)
        };
        let spec = Self::new(axis(|o| o.time), axis(|o| o.temperature));
        spec.validate()?;
        Ok(spec)
    }

    pub fn cell_count(&self) -> OptimResult<usize> {
        self.time
            .steps
            .checked_mul(self.temperature.steps)
            .ok_or_else(|| {
                OptimError::invalid_grid(format!(
                    "{} x {} cells overflow",
                    self.time.steps, self.temperature.steps
                ))
            })
    }
}

/// One evaluated process point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCell {
    pub time: f64,
    pub temperature: f64,
    pub predicted_hardness: Option<f64>,
    pub feasible: bool,
    /// `Some` iff `feasible`.
    pub cost: Option<f64>,
}

/// Feasibility around one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub cells: usize,
    pub feasible: usize,
}

impl WindowSummary {
    pub fn fraction(&self) -> f64 {
        if self.cells == 0 {
            0.0
        } else {
            self.feasible as f64 / self.cells as f64
        }
    }

    pub fn all_feasible(&self) -> bool {
        self.cells > 0 && self.feasible == self.cells
    }
}

/// Robustness grid for one route. `cells[temperature_idx][time_idx]`.
///
/// The axes are the `GridSpec` points plus the route's own time and
/// temperature whenever those fall inside the axis bounds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    pub alloy_id: String,
    pub objective: Objective,
    pub hardness_range: ValueRange,
    pub times: Vec<f64>,
    pub temperatures: Vec<f64>,
    pub cells: Vec<Vec<GridCell>>,
}

impl Grid {
    pub fn cell(&self, time_idx: usize, temp_idx: usize) -> Option<&GridCell> {
        self.cells.get(temp_idx)?.get(time_idx)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn feasible_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.feasible).count()
    }

    pub fn feasible_fraction(&self) -> f64 {
        match self.cell_count() {
            0 => 0.0,
            n => self.feasible_count() as f64 / n as f64,
        }
    }

    /// Square window of half-width `radius` cells around a cell, clipped to
    /// the grid. `None` when the center lies outside.
    pub fn window(&self, time_idx: usize, temp_idx: usize, radius: usize) -> Option<WindowSummary> {
        self.cell(time_idx, temp_idx)?;
        let last_row = self.cells.len().saturating_sub(1);
        let last_col = self.times.len().saturating_sub(1);
        let rows = temp_idx.saturating_sub(radius)..=temp_idx.saturating_add(radius).min(last_row);
        let cols = time_idx.saturating_sub(radius)..=time_idx.saturating_add(radius).min(last_col);

        let mut summary = WindowSummary {
            cells: 0,
            feasible: 0,
        };
        for row in rows {
            for col in cols.clone() {
                if let Some(cell) = self.cell(col, row) {
                    summary.cells += 1;
                    summary.feasible += usize::from(cell.feasible);
                }
            }
        }
        Some(summary)
    }

    /// Indices of the grid point closest to (time, temperature).
    pub fn nearest_index(&self, time: f64, temperature: f64) -> Option<(usize, usize)> {
        let closest = |axis: &[f64], v: f64| {
            axis.iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (*a - v).abs().total_cmp(&(*b - v).abs()))
                .map(|(i, _)| i)
        };
        Some((closest(&self.times, time)?, closest(&self.temperatures, temperature)?))
    }
}

/// Evaluate the grid with the nearest-observation response of the route's
/// alloy.
pub fn compute_robustness_grid(
    graph: &Graph,
    route: &Route,
    query: &Query,
    spec: &GridSpec,
) -> OptimResult<Grid> {
    let alloy = route_alloy(graph, route)?;
    let response = ObservedResponse::for_alloy(graph, alloy)?
        .covering_cells(spec.time.spacing(), spec.temperature.spacing());
    compute_robustness_grid_with(graph, route, query, spec, &response)
}

/// Evaluate the grid with a caller-supplied hardness response.
pub fn compute_robustness_grid_with(
    graph: &Graph,
    route: &Route,
    query: &Query,
    spec: &GridSpec,
    response: &dyn HardnessResponse,
) -> OptimResult<Grid> {
    spec.validate()?;
    route_alloy(graph, route)?;
    let space = SearchSpace::prune(graph, query)?;
    let model = CostModel::for_query(graph, &space, query)?;

    let times = pin(spec.time.points(), &spec.time, route.time);
    let temperatures = pin(spec.temperature.points(), &spec.temperature, route.temperature);
    let width = times.len();
    let count = width.checked_mul(temperatures.len()).ok_or_else(|| {
        OptimError::invalid_grid(format!("{width} x {} cells overflow", temperatures.len()))
    })?;

    let flat: Vec<GridCell> = (0..count)
        .into_par_iter()
        .map(|i| {
            let (time, temperature) = (times[i % width], temperatures[i / width]);
            let predicted_hardness = response.predict(time, temperature);
            let feasible = predicted_hardness.is_some_and(|h| query.hardness_range.contains(h));
            let cost = feasible
                .then(|| model.cell_cost(time, temperature))
                .filter(|c| c.is_finite());
            GridCell {
                time,
                temperature,
                predicted_hardness,
                feasible: cost.is_some(),
                cost,
            }
        })
        .collect();
    let cells: Vec<Vec<GridCell>> = flat.chunks(width).map(<[GridCell]>::to_vec).collect();

    let grid = Grid {
        alloy_id: route.alloy_id.clone(),
        objective: query.objective,
        hardness_range: query.hardness_range,
        times,
        temperatures,
        cells,
    };
    debug!(
        alloy = %grid.alloy_id,
        cells = grid.cell_count(),
        feasible = grid.feasible_count(),
        "robustness grid evaluated"
    );
    Ok(grid)
}

/// Insert `value` into sorted `points` unless it is outside the axis or
/// already present.
fn pin(mut points: Vec<f64>, axis: &Axis, value: f64) -> Vec<f64> {
    if value.is_finite() && value >= axis.min && value <= axis.max && !points.contains(&value) {
        let at = points.partition_point(|p| *p < value);
        points.insert(at, value);
    }
    points
}

fn route_alloy(graph: &Graph, route: &Route) -> OptimResult<NodeId> {
    graph
        .alloy_by_name(&route.alloy_id)
        .ok_or_else(|| GraphError::IdNotFound { what: "route alloy" }.into())
}

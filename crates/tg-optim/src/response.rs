//! Hardness predictions off the observed grid.

use tg_core::NodeId;
use tg_graph::{Graph, Observation};

use crate::error::{OptimError, OptimResult};

/// Default snapping radius, in units of the normalized observed span.
pub const DEFAULT_SNAP_RADIUS: f64 = 0.05;

/// Predicts the hardness an alloy reaches for a tempering process.
///
/// Implementations are evaluated from many threads at once.
pub trait HardnessResponse: Send + Sync {
    /// Predicted hardness (HRC) at `time` (s) and `temperature` (°C), or
    /// `None` where the model has nothing to say.
    fn predict(&self, time: f64, temperature: f64) -> Option<f64>;
}

/// Nearest-observation response for one alloy.
///
/// A query point snaps to the closest observed (time, temperature) pair when
/// it lies within `radius` after scaling both axes by the observed span.
/// Axes with zero span are compared in raw units.
#[derive(Debug, Clone)]
pub struct ObservedResponse {
    observations: Vec<Observation>,
    time_scale: f64,
    temperature_scale: f64,
    radius: f64,
}

impl ObservedResponse {
    pub fn for_alloy(graph: &Graph, alloy: NodeId) -> OptimResult<Self> {
        let observations = graph.observations(alloy);
        if observations.is_empty() {
            return Err(OptimError::invalid_grid(format!(
                "alloy node {alloy} has no observations"
            )));
        }
        let span = |f: fn(&Observation) -> f64| {
            let (lo, hi) = observations
                .iter()
                .map(f)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if hi > lo { hi - lo } else { 1.0 }
        };
        let time_scale = span(|o| o.time);
        let temperature_scale = span(|o| o.temperature);

        Ok(Self {
            observations,
            time_scale,
            temperature_scale,
            radius: DEFAULT_SNAP_RADIUS,
        })
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Widen the radius so every point of a grid with the given spacing
    /// (s, °C) lies within reach of an observation inside its cell.
    pub fn covering_cells(mut self, time_step: f64, temperature_step: f64) -> Self {
        let half_diagonal =
            (time_step / self.time_scale).hypot(temperature_step / self.temperature_scale) / 2.0;
        if half_diagonal.is_finite() {
            self.radius = self.radius.max(half_diagonal);
        }
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    fn distance(&self, o: &Observation, time: f64, temperature: f64) -> f64 {
        let dt = (o.time - time) / self.time_scale;
        let dtemp = (o.temperature - temperature) / self.temperature_scale;
        dt.hypot(dtemp)
    }
}

impl HardnessResponse for ObservedResponse {
    fn predict(&self, time: f64, temperature: f64) -> Option<f64> {
        self.observations
            .iter()
            .map(|o| (self.distance(o, time, temperature), o))
            .filter(|(d, _)| *d <= self.radius)
            .min_by(|(da, a), (db, b)| {
                da.total_cmp(db)
                    .then_with(|| a.hardness_node.cmp(&b.hardness_node))
            })
            .map(|(_, o)| o.hardness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_graph::{TemperingRecord, build_graph};

    fn response() -> ObservedResponse {
        let g = build_graph(&[
            TemperingRecord::new("A", 0.0, 400.0, 58.0),
            TemperingRecord::new("A", 100.0, 600.0, 40.0),
            TemperingRecord::new("B", 50.0, 500.0, 45.0),
        ])
        .unwrap();
        ObservedResponse::for_alloy(&g, g.alloy_by_name("A").unwrap()).unwrap()
    }

    #[test]
    fn exact_observation_is_returned() {
        let r = response();
        assert_eq!(r.observations().len(), 2);
        assert_eq!(r.predict(0.0, 400.0), Some(58.0));
        assert_eq!(r.predict(100.0, 600.0), Some(40.0));
    }

    #[test]
    fn snaps_within_radius_only() {
        let r = response();
        // 2 s of a 100 s span and 4 °C of a 200 °C span: distance ~0.028
        assert_eq!(r.predict(2.0, 404.0), Some(58.0));
        assert_eq!(r.predict(50.0, 500.0), None);
        assert_eq!(r.clone().with_radius(1.0).predict(40.0, 480.0), Some(58.0));
    }

    #[test]
    fn covering_cells_only_widens() {
        let r = response();
        assert_eq!(r.predict(8.0, 416.0), None);
        assert_eq!(r.clone().covering_cells(1.0, 2.0).radius(), DEFAULT_SNAP_RADIUS);

        // 20 s by 40 °C cells are 0.2 by 0.2 of the span; half the diagonal is ~0.141
        let wide = r.covering_cells(20.0, 40.0);
        assert!((wide.radius() - 0.2f64.hypot(0.2) / 2.0).abs() < 1e-12);
        assert_eq!(wide.predict(8.0, 416.0), Some(58.0));
    }

    #[test]
    fn other_alloys_are_ignored() {
        let r = response().with_radius(0.3);
        assert_eq!(r.predict(50.0, 500.0), None);
    }
}

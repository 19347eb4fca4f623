//! Query-driven route optimization over the tempering graph.
//!
//! A query is answered in four phases: the filter engine prunes the graph to
//! a live search space, the cost model weights the live edges for the chosen
//! objective, Dijkstra finds the cheapest in-range Hardness node, and the
//! route is rebuilt from predecessor edges. The robustness mapper then
//! evaluates feasibility on a (time, temperature) grid around the route.
//!
//! # Example
//!
//! ```
//! use tg_graph::{build_graph, TemperingRecord};
//! use tg_optim::{optimize, Objective, Query, ValueRange};
//!
//! let graph = build_graph(&[
//!     TemperingRecord::new("A", 30.0, 500.0, 52.0),
//!     TemperingRecord::new("B", 20.0, 550.0, 48.0),
//! ])
//! .unwrap();
//!
//! let query = Query::new(Objective::Time, ValueRange::new(50.0, 55.0));
//! let route = optimize(&graph, &query).unwrap();
//! assert_eq!(route.alloy_id, "A");
//! assert_eq!(route.total_cost, 30.0);
//! ```

pub mod cost;
pub mod error;
pub mod filter;
pub mod optimizer;
pub mod query;
pub mod response;
pub mod robustness;
pub mod route;
pub(crate) mod search;

pub use cost::{Bounds, CostModel, EdgeWeights, combine_balanced};
pub use error::{OptimError, OptimResult};
pub use filter::SearchSpace;
pub use optimizer::{optimal_ties, optimize, optimize_many, optimize_ranked};
pub use query::{
    ComparisonOp, CompositionFilter, DEFAULT_ALPHA, Objective, Query, TemperatureCost, ValueRange,
};
pub use response::{DEFAULT_SNAP_RADIUS, HardnessResponse, ObservedResponse};
pub use robustness::{
    Axis, Grid, GridCell, GridSpec, WindowSummary, compute_robustness_grid,
    compute_robustness_grid_with,
};
pub use route::{EdgeCost, Route, RouteStep};

//! Query entry points: filter, cost, search, reconstruct.

use rayon::prelude::*;
use tg_core::{Tolerances, nearly_equal};
use tg_graph::Graph;
use tracing::{debug, info};

use crate::cost::CostModel;
use crate::error::{OptimError, OptimResult};
use crate::filter::SearchSpace;
use crate::query::Query;
use crate::route::Route;
use crate::search::{Candidate, dijkstra, rank};

/// Find the minimum-cost route satisfying `query`.
pub fn optimize(graph: &Graph, query: &Query) -> OptimResult<Route> {
    let mut routes = optimize_ranked(graph, query, 1)?;
    routes.pop().ok_or_else(|| OptimError::NoFeasibleRoute {
        reason: format!("query '{}' produced no route", query.label()),
    })
}

/// Every reachable in-range route, best first, truncated to `limit`.
///
/// The first entry is the route `optimize` returns. A `limit` of 0 means no
/// limit.
pub fn optimize_ranked(graph: &Graph, query: &Query, limit: usize) -> OptimResult<Vec<Route>> {
    query.validate()?;
    let space = SearchSpace::prune(graph, query)?;
    let model = CostModel::for_query(graph, &space, query)?;
    let weights = model.weights(graph);

    let paths = dijkstra(graph, &space, &weights);
    let candidates: Vec<Candidate<'_>> = space
        .targets()
        .iter()
        .copied()
        .filter(|&t| paths.reached(t))
        .map(|t| Candidate::new(graph, &paths, t))
        .collect();
    if candidates.is_empty() {
        return Err(OptimError::NoFeasibleRoute {
            reason: format!(
                "no hardness in {} reachable for query '{}' ({} alloys passed filters)",
                query.hardness_range,
                query.label(),
                space.alloys().len()
            ),
        });
    }
    debug!(
        query = query.label(),
        candidates = candidates.len(),
        "shortest paths computed"
    );

    let ranked = rank(candidates, Tolerances::default());
    let take = if limit == 0 { ranked.len() } else { limit };
    let routes = ranked
        .iter()
        .take(take)
        .map(|c| {
            Route::reconstruct(
                graph,
                &weights,
                &paths.pred,
                c.node,
                query.label(),
                query.objective,
            )
        })
        .collect::<OptimResult<Vec<_>>>()?;

    if let Some(best) = routes.first() {
        info!(
            query = query.label(),
            objective = %query.objective,
            alloy = %best.alloy_id,
            time = best.time,
            temperature = best.temperature,
            hardness = best.hardness,
            cost = best.total_cost,
            "optimal route"
        );
    }
    Ok(routes)
}

/// Number of leading routes whose cost ties the best within tolerance.
pub fn optimal_ties(routes: &[Route]) -> usize {
    let Some(best) = routes.first() else {
        return 0;
    };
    routes
        .iter()
        .take_while(|r| nearly_equal(r.total_cost, best.total_cost, Tolerances::default()))
        .count()
}

/// Run several queries against one graph in parallel.
///
/// Results keep the order of `queries`; one failure does not affect others.
pub fn optimize_many(graph: &Graph, queries: &[Query]) -> Vec<OptimResult<Route>> {
    queries.par_iter().map(|q| optimize(graph, q)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Objective, ValueRange};
    use tg_graph::{TemperingRecord, build_graph};

    fn graph() -> Graph {
        build_graph(&[
            TemperingRecord::new("A", 30.0, 500.0, 52.0),
            TemperingRecord::new("A", 60.0, 450.0, 53.0),
            TemperingRecord::new("B", 30.0, 520.0, 51.0),
        ])
        .unwrap()
    }

    #[test]
    fn ranked_first_matches_optimize() {
        let g = graph();
        let q = Query::new(Objective::Time, ValueRange::new(50.0, 55.0));
        let best = optimize(&g, &q).unwrap();
        let ranked = optimize_ranked(&g, &q, 0).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0], best);
        for pair in ranked.windows(2) {
            assert!(pair[0].total_cost <= pair[1].total_cost);
        }
    }

    #[test]
    fn time_ties_break_on_temperature() {
        let g = graph();
        let q = Query::new(Objective::Time, ValueRange::new(50.0, 55.0));
        let ranked = optimize_ranked(&g, &q, 0).unwrap();
        assert_eq!(optimal_ties(&ranked), 2);
        assert_eq!(ranked[0].alloy_id, "A");
        assert_eq!(ranked[0].temperature, 500.0);
        assert_eq!(ranked[1].alloy_id, "B");
    }

    #[test]
    fn limit_truncates() {
        let g = graph();
        let q = Query::new(Objective::Time, ValueRange::new(50.0, 55.0));
        assert_eq!(optimize_ranked(&g, &q, 2).unwrap().len(), 2);
    }

    #[test]
    fn many_keeps_query_order() {
        let g = graph();
        let queries = vec![
            Query::new(Objective::Time, ValueRange::new(50.0, 55.0)).named("ok"),
            Query::new(Objective::Time, ValueRange::new(90.0, 95.0)).named("none"),
            Query::new(Objective::Temperature, ValueRange::new(50.0, 55.0)).named("cool"),
        ];
        let results = optimize_many(&g, &queries);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(OptimError::NoFeasibleRoute { .. })));
        let cool = results[2].as_ref().unwrap();
        assert_eq!(cool.temperature, 450.0);
        assert_eq!(cool.query, "cool");
    }

    #[test]
    fn no_ties_in_empty_list() {
        assert_eq!(optimal_ties(&[]), 0);
    }
}

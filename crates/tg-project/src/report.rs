//! Plain-text technical report for one query run.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use tg_optim::{Grid, Objective, OptimResult, Query, Route, optimal_ties};

const RULE: &str = "============================================================";
const SUB_RULE: &str = "------------------------------";

/// Run metadata printed in the report header.
#[derive(Debug, Clone)]
pub struct ReportMeta<'a> {
    pub generated_at: DateTime<Utc>,
    pub fingerprint: Option<&'a str>,
    pub grid: Option<&'a Grid>,
}

impl ReportMeta<'_> {
    pub fn now() -> Self {
        Self {
            generated_at: Utc::now(),
            fingerprint: None,
            grid: None,
        }
    }
}

/// Render the report for `query` given its ranked routes (or failure).
///
/// Only routes tied with the best on cost are listed as options.
pub fn render_text(query: &Query, outcome: &OptimResult<Vec<Route>>, meta: &ReportMeta<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, query, outcome, meta);
    out
}

fn write_report(
    out: &mut String,
    query: &Query,
    outcome: &OptimResult<Vec<Route>>,
    meta: &ReportMeta<'_>,
) -> std::fmt::Result {
    writeln!(out, "{RULE}")?;
    writeln!(out, "TECHNICAL REPORT: {}", query.label())?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Generated: {}", meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    if let Some(fp) = meta.fingerprint {
        writeln!(out, "Fingerprint: {fp}")?;
    }
    writeln!(out)?;

    writeln!(out, "1. SEARCH PARAMETERS")?;
    writeln!(out, "{SUB_RULE}")?;
    writeln!(
        out,
        "Optimization Goal: {} (Minimize)",
        query.objective.as_str().to_uppercase()
    )?;
    if query.objective == Objective::Balanced {
        writeln!(out, "Alpha (Time Weight): {}", query.alpha)?;
        writeln!(out, "Beta (Temp Weight): {:.1}", 1.0 - query.alpha)?;
    }
    writeln!(out, "Filters Applied:")?;
    if let Some(alloy) = &query.alloy {
        writeln!(out, "  - steel_type: {alloy}")?;
    }
    for filter in &query.filters {
        writeln!(out, "  - {}: {} {}", filter.attribute, filter.op, filter.value)?;
    }
    writeln!(out, "  - hardness_range: {}", query.hardness_range)?;
    if let Some(range) = query.time_range {
        writeln!(out, "  - time_range: {range}")?;
    }
    if let Some(range) = query.temperature_range {
        writeln!(out, "  - temperature_range: {range}")?;
    }
    writeln!(out)?;

    writeln!(out, "2. OPTIMIZATION RESULTS (DIJKSTRA)")?;
    writeln!(out, "{SUB_RULE}")?;
    match outcome {
        Err(err) => {
            writeln!(out, "STATUS: NOT FOUND")?;
            writeln!(out, "Reason: {err}")?;
        }
        Ok(routes) => {
            let ties = optimal_ties(routes);
            let unit = match query.objective {
                Objective::Time => "s",
                Objective::Temperature | Objective::Balanced => "(Score)",
            };
            writeln!(out, "STATUS: {ties} OPTIMAL SOLUTION(S) FOUND")?;
            if let Some(best) = routes.first() {
                writeln!(out, "Total Cost: {:.2} {unit}", best.total_cost)?;
            }
            writeln!(out)?;
            for (idx, route) in routes.iter().take(ties).enumerate() {
                write_option(out, idx + 1, route)?;
            }
        }
    }

    if let Some(grid) = meta.grid {
        write_robustness(out, grid, outcome.as_ref().ok().and_then(|r| r.first()))?;
    }

    writeln!(out, "{RULE}")
}

fn write_option(out: &mut String, number: usize, route: &Route) -> std::fmt::Result {
    writeln!(out, "--- OPTION #{number} ---")?;
    writeln!(out, "Process Flow:")?;
    writeln!(out, "{}", route.describe())?;
    writeln!(out)?;
    writeln!(out, "Selected Steel Specs:")?;
    writeln!(out, "  Steel Type:        {}", route.alloy_id)?;
    writeln!(out, "  Final Hardness:    {} HRC", route.hardness)?;
    writeln!(out, "  Temp Process:      {} C", route.temperature)?;
    writeln!(out, "  Time Process:      {} s", route.time)?;
    if !route.composition.is_empty() {
        writeln!(out, "  Composition (%):")?;
        for (element, amount) in &route.composition {
            writeln!(out, "    {element:<4}: {amount}")?;
        }
    }
    writeln!(out)
}

fn write_robustness(out: &mut String, grid: &Grid, best: Option<&Route>) -> std::fmt::Result {
    writeln!(out, "3. ROBUSTNESS MAP")?;
    writeln!(out, "{SUB_RULE}")?;
    writeln!(
        out,
        "Grid: {} time x {} temperature points",
        grid.times.len(),
        grid.temperatures.len()
    )?;
    writeln!(
        out,
        "Feasible Cells: {} / {} ({:.1}%)",
        grid.feasible_count(),
        grid.cell_count(),
        grid.feasible_fraction() * 100.0
    )?;
    let window = best
        .and_then(|r| grid.nearest_index(r.time, r.temperature))
        .and_then(|(ti, pi)| grid.window(ti, pi, 1));
    if let Some(window) = window {
        writeln!(
            out,
            "Window Around Optimum: {} / {} feasible",
            window.feasible, window.cells
        )?;
    }
    writeln!(out)
}

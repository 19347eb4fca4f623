use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tg_core::timing::{self, Timer};
use tg_graph::{Graph, GraphError, Layer, build_graph};
use tg_optim::{
    Grid, GridSpec, OptimError, OptimResult, Query, Route, compute_robustness_grid, optimal_ties,
    optimize_ranked,
};
use tg_project::{ProjectError, ReportMeta, fingerprint, render_text};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tg-cli")]
#[command(about = "TemperGraph CLI - tempering route optimization over alloy records", long_about = None)]
struct Cli {
    /// Report phase timings (same as setting TG_TIMING)
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a query file (YAML or JSON)
    Validate {
        /// Path to the query file
        queries_path: PathBuf,
    },
    /// Summarize the graph built from a record file
    Inspect {
        /// Path to the record file
        records_path: PathBuf,
    },
    /// Run every query of a query file against a record file
    Run {
        /// Path to the record file
        records_path: PathBuf,
        /// Path to the query file
        queries_path: PathBuf,
        /// Directory for reports, routes and grids (defaults to stdout only)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Points per robustness grid axis; 0 disables the grid
        #[arg(long, default_value_t = 11)]
        grid_steps: usize,
        /// Maximum ranked routes kept per query; 0 keeps all
        #[arg(long, default_value_t = 0)]
        rank: usize,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Optim(#[from] OptimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.timing {
        timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { queries_path } => cmd_validate(&queries_path),
        Commands::Inspect { records_path } => cmd_inspect(&records_path),
        Commands::Run {
            records_path,
            queries_path,
            out,
            grid_steps,
            rank,
        } => cmd_run(&records_path, &queries_path, out.as_deref(), grid_steps, rank),
    }
}

fn cmd_validate(queries_path: &Path) -> CliResult<()> {
    println!("Validating queries: {}", queries_path.display());
    let queries = tg_project::load_queries(queries_path)?;
    for query in &queries {
        println!(
            "  {} - {} ({} composition filters, hardness {})",
            query.name,
            query.objective,
            query.filters.len(),
            query.hardness_range
        );
    }
    println!("✓ {} queries are valid", queries.len());
    Ok(())
}

fn load_graph(records_path: &Path) -> CliResult<(Vec<tg_graph::TemperingRecord>, Graph)> {
    let timer = Timer::start("build_graph");
    let records = tg_project::load_records(records_path)?;
    let graph = build_graph(&records)?;
    if let Some(secs) = timer.stop() {
        info!(phase = "build_graph", secs, "timing");
    }
    Ok((records, graph))
}

fn cmd_inspect(records_path: &Path) -> CliResult<()> {
    let (records, graph) = load_graph(records_path)?;
    println!(
        "Graph from {} records: {} nodes, {} edges",
        records.len(),
        graph.node_count(),
        graph.edge_count()
    );
    for layer in Layer::ALL {
        println!("  {:<12} {}", layer.to_string(), graph.layer(layer).len());
    }

    println!("Alloys:");
    for (id, alloy) in graph.alloys() {
        let composition = alloy
            .composition
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} ({} observations) [{}]",
            alloy.name,
            graph.observations(id).len(),
            composition
        );
    }
    Ok(())
}

fn cmd_run(
    records_path: &Path,
    queries_path: &Path,
    out: Option<&Path>,
    grid_steps: usize,
    rank: usize,
) -> CliResult<()> {
    let (records, graph) = load_graph(records_path)?;
    let queries = tg_project::load_queries(queries_path)?;
    if let Some(dir) = out {
        std::fs::create_dir_all(dir)?;
    }

    let mut solved = 0;
    for query in &queries {
        let timer = Timer::start("query");
        // Rank everything so tie counts see past the `--rank` cut.
        let outcome = optimize_ranked(&graph, query, 0);
        if let Some(secs) = timer.stop() {
            info!(phase = "query", query = %query.name, secs, "timing");
        }

        let grid = match (&outcome, grid_steps) {
            (Ok(routes), steps) if steps > 0 => routes
                .first()
                .and_then(|best| robustness(&graph, best, query, steps)),
            _ => None,
        };

        match &outcome {
            Ok(routes) => {
                solved += 1;
                println!(
                    "✓ {}: {} ({} tied)",
                    query.name,
                    routes.first().map(Route::describe).unwrap_or_default(),
                    optimal_ties(routes)
                );
            }
            Err(err) => {
                warn!(query = %query.name, error = %err, "query failed");
                println!("✗ {}: {err}", query.name);
            }
        }

        let run_id = fingerprint(&records, query);
        let meta = ReportMeta {
            fingerprint: Some(&run_id),
            grid: grid.as_ref(),
            ..ReportMeta::now()
        };
        let report = render_text(query, &outcome, &meta);
        match out {
            Some(dir) => write_outputs(dir, query, &report, &outcome, rank, grid.as_ref())?,
            None => println!("{report}"),
        }
    }

    println!("{solved}/{} queries solved", queries.len());
    Ok(())
}

fn robustness(graph: &Graph, route: &Route, query: &Query, steps: usize) -> Option<Grid> {
    let timer = Timer::start("robustness_grid");
    let grid = graph
        .alloy_by_name(&route.alloy_id)
        .ok_or(OptimError::Graph(GraphError::IdNotFound { what: "route alloy" }))
        .and_then(|alloy| GridSpec::spanning(graph, alloy, steps))
        .and_then(|spec| compute_robustness_grid(graph, route, query, &spec));
    if let Some(secs) = timer.stop() {
        info!(phase = "robustness_grid", query = %query.name, secs, "timing");
    }
    match grid {
        Ok(grid) => Some(grid),
        Err(err) => {
            warn!(query = %query.name, error = %err, "robustness grid skipped");
            None
        }
    }
}

fn write_outputs(
    dir: &Path,
    query: &Query,
    report: &str,
    outcome: &OptimResult<Vec<Route>>,
    rank: usize,
    grid: Option<&Grid>,
) -> CliResult<()> {
    let stem = file_stem(&query.name);
    std::fs::write(dir.join(format!("{stem}_report.txt")), report)?;
    if let Ok(routes) = outcome {
        tg_project::save_output(
            &dir.join(format!("{stem}_routes.json")),
            ranked_prefix(routes, rank),
        )?;
    }
    if let Some(grid) = grid {
        tg_project::save_output(&dir.join(format!("{stem}_grid.json")), grid)?;
    }
    Ok(())
}

/// The first `rank` routes, or all of them when `rank` is 0.
fn ranked_prefix(routes: &[Route], rank: usize) -> &[Route] {
    match rank {
        0 => routes,
        k => &routes[..k.min(routes.len())],
    }
}

/// Query names become file names; anything outside `[A-Za-z0-9_-]` is replaced.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_graph::TemperingRecord;
    use tg_optim::{Objective, ValueRange};

    #[test]
    fn rank_cut_keeps_full_tie_count() {
        let graph = build_graph(&[
            TemperingRecord::new("A", 30.0, 500.0, 52.0),
            TemperingRecord::new("B", 30.0, 450.0, 53.0),
            TemperingRecord::new("C", 60.0, 400.0, 54.0),
        ])
        .unwrap();
        let query = Query::new(Objective::Time, ValueRange::new(50.0, 55.0));
        let routes = optimize_ranked(&graph, &query, 0).unwrap();

        assert_eq!(routes.len(), 3);
        assert_eq!(optimal_ties(&routes), 2);
        let kept = ranked_prefix(&routes, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].alloy_id, "B");
        assert_eq!(ranked_prefix(&routes, 0).len(), 3);
        assert_eq!(ranked_prefix(&routes, 10).len(), 3);
    }

    #[test]
    fn file_stem_replaces_separators() {
        assert_eq!(file_stem("hard / 4140"), "hard___4140");
    }
}

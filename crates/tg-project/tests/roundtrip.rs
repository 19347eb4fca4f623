use tg_graph::{TemperingRecord, build_graph};
use tg_optim::{ComparisonOp, Objective, TemperatureCost, ValueRange, optimize};
use tg_project::*;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("tg_project_{}_{name}", std::process::id()))
}

fn sample_file() -> QueryFile {
    QueryFile::new(vec![
        QueryDef::new("high_carbon", "time")
            .with_filter("C (%wt)", FilterValue::comparison(">", 0.4))
            .with_filter("hardness_range", FilterValue::range(50.0, 55.0)),
        QueryDef::new("balanced_4140", "balanced")
            .with_alpha(0.3)
            .with_filter("steel_type", FilterValue::Text("a".into()))
            .with_filter("temperature_range", FilterValue::range(400.0, 600.0)),
    ])
}

#[test]
fn roundtrip_yaml_query_file() {
    let path = temp_path("queries.yaml");
    let file = sample_file();
    save_query_file(&path, &file).unwrap();
    assert_eq!(load_query_file(&path).unwrap(), file);

    let queries = load_queries(&path).unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].name, "high_carbon");
    assert_eq!(queries[0].filters[0].op, ComparisonOp::Gt);
    assert_eq!(queries[1].objective, Objective::Balanced);
    assert_eq!(queries[1].alpha, 0.3);
    assert_eq!(queries[1].alloy.as_deref(), Some("a"));
    assert_eq!(queries[1].hardness_range, DEFAULT_HARDNESS_RANGE);
    std::fs::remove_file(&path).ok();
}

#[test]
fn roundtrip_json_query_file() {
    let path = temp_path("queries.json");
    let mut file = sample_file();
    file.queries[0].temperature_cost = Some(TemperatureCost::Linear { scale: 2.0 });
    save_query_file(&path, &file).unwrap();
    let loaded = load_query_file(&path).unwrap();
    assert_eq!(loaded, file);
    let queries = load_queries(&path).unwrap();
    assert_eq!(
        queries[0].temperature_cost,
        TemperatureCost::Linear { scale: 2.0 }
    );
    std::fs::remove_file(&path).ok();
}

#[test]
fn bare_list_with_snake_case_field_names() {
    let path = temp_path("query_list.json");
    let json = r#"[
        {
            "query_name": "hard",
            "optimize_by": "temperature",
            "filters": {
                "steel_type": "A",
                "Cr (%wt)": {"op": ">=", "val": 1.0},
                "hardness_range": {"min": 50, "max": 55}
            }
        }
    ]"#;
    std::fs::write(&path, json).unwrap();
    let queries = load_queries(&path).unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].alpha, tg_optim::DEFAULT_ALPHA);
    assert_eq!(queries[0].hardness_range, ValueRange::new(50.0, 55.0));
    std::fs::remove_file(&path).ok();
}

#[test]
fn invalid_file_is_rejected() {
    let path = temp_path("bad.yaml");
    std::fs::write(
        &path,
        "queries:\n  - query_name: empty\n    optimize_by: time\n    filters: {}\n",
    )
    .unwrap();
    assert!(matches!(
        load_queries(&path),
        Err(ProjectError::Validation(ValidationError::EmptyFilters { .. }))
    ));
    std::fs::remove_file(&path).ok();

    assert!(matches!(
        load_queries(std::path::Path::new("queries.toml")),
        Err(ProjectError::UnsupportedFormat { .. })
    ));
}

#[test]
fn records_roundtrip_and_feed_the_optimizer() {
    let path = temp_path("records.yaml");
    let records = vec![
        TemperingRecord::new("A", 30.0, 500.0, 52.0)
            .with_component("C (%wt)", 0.45)
            .with_source("lab-1"),
        TemperingRecord::new("B", 20.0, 550.0, 48.0).with_component("C (%wt)", 0.2),
    ];
    save_records(&path, &records).unwrap();
    let loaded = load_records(&path).unwrap();
    assert_eq!(loaded, records);

    let graph = build_graph(&loaded).unwrap();
    let query = to_query(0, &sample_file().queries[0]).unwrap();
    let route = optimize(&graph, &query).unwrap();
    assert_eq!(route.alloy_id, "A");

    let text = render_text(&query, &Ok(vec![route]), &ReportMeta::now());
    assert!(text.contains("STATUS: 1 OPTIMAL SOLUTION(S) FOUND"));
    assert_eq!(fingerprint(&loaded, &query), fingerprint(&records, &query));
    std::fs::remove_file(&path).ok();
}

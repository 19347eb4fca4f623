//! Integration tests for tg-graph.

use proptest::prelude::*;
use tg_graph::{GraphBuilder, Layer, NodeKind, TemperingRecord, build_graph};

fn sample_records() -> Vec<TemperingRecord> {
    vec![
        TemperingRecord::new("A", 30.0, 500.0, 52.0)
            .with_component("%C", 0.45)
            .with_component("%Cr", 1.0),
        TemperingRecord::new("A", 30.0, 550.0, 49.0)
            .with_component("%C", 0.45)
            .with_component("%Cr", 1.0),
        TemperingRecord::new("A", 60.0, 500.0, 50.5)
            .with_component("%C", 0.45)
            .with_component("%Cr", 1.0),
        TemperingRecord::new("B", 20.0, 550.0, 48.0)
            .with_component("%C", 0.2)
            .with_component("%Cr", 0.5),
    ]
}

#[test]
fn build_layered_graph() {
    let graph = build_graph(&sample_records()).unwrap();

    assert_eq!(graph.layer(Layer::Source).len(), 1);
    assert_eq!(graph.layer(Layer::Alloy).len(), 2);
    // A: 30, 60; B: 20
    assert_eq!(graph.layer(Layer::Time).len(), 3);
    // A: (30,500), (30,550), (60,500); B: (20,550)
    assert_eq!(graph.layer(Layer::Temperature).len(), 4);
    assert_eq!(graph.layer(Layer::Hardness).len(), 4);

    // Every non-source node has exactly one parent
    for node in graph.nodes() {
        let parents = graph.in_edges(node.id).len();
        if node.layer() == Layer::Source {
            assert_eq!(parents, 0);
        } else {
            assert_eq!(parents, 1, "node {} has {} parents", node.label(), parents);
        }
    }
}

#[test]
fn incremental_builder_matches_batch_build() {
    let records = sample_records();
    let mut builder = GraphBuilder::new();
    for record in &records {
        builder.add_record(record).unwrap();
    }
    assert_eq!(builder.records_seen(), records.len());
    let incremental = builder.build().unwrap();
    let batch = build_graph(&records).unwrap();

    assert_eq!(incremental.nodes(), batch.nodes());
    assert_eq!(incremental.edges(), batch.edges());
}

#[test]
fn topological_order_visits_each_node_once() {
    let graph = build_graph(&sample_records()).unwrap();
    let order = graph.topological_order().unwrap();
    assert_eq!(order.len(), graph.node_count());

    let mut seen = vec![false; graph.node_count()];
    for id in &order {
        assert!(!seen[id.ix()], "node {id} visited twice");
        seen[id.ix()] = true;
    }
    assert_eq!(order[0], graph.source());
}

#[test]
fn successors_follow_alloy_subtree() {
    let graph = build_graph(&sample_records()).unwrap();
    let b = graph.alloy_by_name("B").unwrap();
    let times: Vec<f64> = graph
        .successors(b)
        .filter_map(|id| graph.node(id).and_then(|n| n.kind.value()))
        .collect();
    assert_eq!(times, vec![20.0]);

    let hardness = graph.layer(Layer::Hardness)[0];
    let parents: Vec<_> = graph.predecessors(hardness).collect();
    assert_eq!(parents.len(), 1);
    assert!(matches!(
        graph.node(parents[0]).unwrap().kind,
        NodeKind::Temperature(_)
    ));
}

fn record_strategy() -> impl Strategy<Value = TemperingRecord> {
    (
        prop::sample::select(vec!["A", "B", "C"]),
        prop::sample::select(vec![10.0_f64, 30.0, 60.0, 3600.0]),
        prop::sample::select(vec![150.0_f64, 300.0, 500.0, 650.0]),
        20.0_f64..65.0,
    )
        .prop_map(|(alloy, time, temp, hardness)| {
            TemperingRecord::new(alloy, time, temp, hardness.round())
        })
}

proptest! {
    #[test]
    fn edges_only_connect_adjacent_layers(records in prop::collection::vec(record_strategy(), 0..40)) {
        let graph = build_graph(&records).unwrap();
        for edge in graph.edges() {
            let from = graph.node(edge.from).unwrap().layer();
            let to = graph.node(edge.to).unwrap().layer();
            prop_assert_eq!(from.next(), Some(to));
        }
        let order = graph.topological_order().unwrap();
        prop_assert_eq!(order.len(), graph.node_count());
    }
}

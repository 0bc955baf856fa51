use std::sync::Arc;

use filterdag::config::DemoSection;
use filterdag::demo::{
    build_engine, UserRequest, FILTER_AGE, FILTER_NAME, FILTER_RELATION, LOADER_USER_BASE,
    LOADER_USER_RELATION,
};
use filterdag::engine::{Engine, EngineOptions};
use filterdag::store::FieldStore;
use filterdag_test_utils::{init_tracing, with_timeout};

fn demo(age: u8, relation: u8, name: &str) -> DemoSection {
    DemoSection {
        name: name.to_string(),
        age,
        relation,
        load_delay_ms: 5,
        ..DemoSection::default()
    }
}

fn engine(section: &DemoSection) -> Engine<UserRequest> {
    build_engine(section, EngineOptions::default()).unwrap()
}

async fn evaluate(engine: &Engine<UserRequest>, filters: &[&str]) -> bool {
    let request = Arc::new(UserRequest {
        user_id: 10010,
        anchor_id: 10086,
    });
    with_timeout(engine.execute(request, Arc::new(FieldStore::new()), filters))
        .await
        .unwrap()
}

const ALL: [&str; 3] = [FILTER_NAME, FILTER_AGE, FILTER_RELATION];

#[test]
fn test_demo_graph_shape() {
    let engine = engine(&DemoSection::default());
    let graph = engine.graph();

    assert_eq!(graph.len(), 5);
    let relation = graph.node(LOADER_USER_RELATION).unwrap();
    assert_eq!(relation.parents().len(), 1);
    assert_eq!(
        graph.node_at(relation.parents()[0]).id(),
        LOADER_USER_BASE
    );
    assert_eq!(graph.node(LOADER_USER_BASE).unwrap().children().len(), 3);
}

#[tokio::test]
async fn test_adult_without_relation_passes() {
    init_tracing();
    let engine = engine(&demo(21, 0, "zhangSan"));
    assert!(!evaluate(&engine, &ALL).await);
}

#[tokio::test]
async fn test_minor_is_rejected() {
    init_tracing();
    let engine = engine(&demo(15, 0, "zhangSan"));
    assert!(evaluate(&engine, &ALL).await);
    assert!(evaluate(&engine, &[FILTER_AGE]).await);
}

#[tokio::test]
async fn test_existing_relation_is_rejected() {
    init_tracing();
    let engine = engine(&demo(21, 1, "zhangSan"));
    assert!(evaluate(&engine, &ALL).await);
    // The relation filter is the only one that cares.
    assert!(!evaluate(&engine, &[FILTER_NAME, FILTER_AGE]).await);
}

#[tokio::test]
async fn test_blocked_name_is_rejected() {
    init_tracing();
    let engine = engine(&demo(30, 0, "xx"));
    assert!(evaluate(&engine, &[FILTER_NAME]).await);
}

#[tokio::test]
async fn test_rejection_does_not_wait_for_relation_lookup() {
    init_tracing();
    let mut section = demo(15, 0, "zhangSan");
    section.load_delay_ms = 500;
    let engine = engine(&section);

    // Each lookup takes 500ms; waiting for the relation would need 1s.
    let started = std::time::Instant::now();
    let rejected = tokio::time::timeout(
        std::time::Duration::from_millis(900),
        engine.execute(
            Arc::new(UserRequest {
                user_id: 1,
                anchor_id: 2,
            }),
            Arc::new(FieldStore::new()),
            &ALL,
        ),
    )
    .await
    .expect("rejection should arrive before the relation lookup ends")
    .unwrap();

    assert!(rejected);
    assert!(started.elapsed() < std::time::Duration::from_millis(900));
}

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use filterdag::engine::Engine;
use filterdag::store::FieldStore;
use proptest::prelude::*;
use filterdag_test_utils::builders::{StubFilter, StubLoader, TaskSet};
use filterdag_test_utils::Probe;

/// A random acyclic task set, described by indices.
///
/// Loader `i` produces `f{i}` and may only consume fields of loaders `< i`,
/// which keeps the graph acyclic.
#[derive(Debug, Clone)]
struct Shape {
    loader_deps: Vec<BTreeSet<usize>>,
    filter_deps: Vec<BTreeSet<usize>>,
    filter_passes: Vec<bool>,
    targets: BTreeSet<usize>,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    (1..8usize, 1..6usize).prop_flat_map(|(loaders, filters)| {
        let loader_deps = proptest::collection::vec(
            proptest::collection::btree_set(any::<usize>(), 0..4),
            loaders,
        );
        let filter_deps = proptest::collection::vec(
            proptest::collection::btree_set(0..loaders, 0..4),
            filters,
        );
        let filter_passes = proptest::collection::vec(any::<bool>(), filters);
        let targets = proptest::collection::btree_set(0..filters, 0..=filters);

        (loader_deps, filter_deps, filter_passes, targets).prop_map(
            |(raw_loader_deps, filter_deps, filter_passes, targets)| {
                // Sanitize: only allow deps on earlier loaders.
                let loader_deps = raw_loader_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, deps)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            deps.into_iter().map(|d| d % i).collect()
                        }
                    })
                    .collect();
                Shape {
                    loader_deps,
                    filter_deps,
                    filter_passes,
                    targets,
                }
            },
        )
    })
}

fn fields(deps: &BTreeSet<usize>) -> Vec<String> {
    deps.iter().map(|d| format!("f{d}")).collect()
}

fn build(shape: &Shape, probe: &Probe) -> Engine<u64> {
    let mut tasks = TaskSet::new();
    for (i, deps) in shape.loader_deps.iter().enumerate() {
        let loader = StubLoader::new(&format!("l{i}"))
            .produces([format!("f{i}").as_str()])
            .probe(probe);
        let loader = fields(deps)
            .iter()
            .fold(loader, |l, field| l.also_consumes(field));
        tasks = tasks.loader(loader);
    }
    for (i, deps) in shape.filter_deps.iter().enumerate() {
        let filter = StubFilter::new(&format!("x{i}"))
            .passes_if(shape.filter_passes[i])
            .probe(probe);
        let filter = fields(deps)
            .iter()
            .fold(filter, |f, field| f.also_consumes(field));
        tasks = tasks.filter(filter);
    }
    tasks.build()
}

fn target_ids(shape: &Shape) -> Vec<String> {
    shape.targets.iter().map(|t| format!("x{t}")).collect()
}

/// Ancestor closure computed straight from the shape.
fn expected_selection(shape: &Shape) -> BTreeSet<String> {
    let targets: Vec<usize> = if shape.targets.is_empty() {
        (0..shape.filter_deps.len()).collect()
    } else {
        shape.targets.iter().copied().collect()
    };

    let mut out = BTreeSet::new();
    let mut pending: Vec<usize> = Vec::new();
    for t in targets {
        out.insert(format!("x{t}"));
        pending.extend(shape.filter_deps[t].iter().copied());
    }
    while let Some(l) = pending.pop() {
        if out.insert(format!("l{l}")) {
            pending.extend(shape.loader_deps[l].iter().copied());
        }
    }
    if shape.targets.is_empty() {
        // Everything runs when no filter is named.
        for i in 0..shape.loader_deps.len() {
            out.insert(format!("l{i}"));
        }
    }
    out
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_selection_is_closed_under_parents(shape in shape_strategy()) {
        let engine = build(&shape, &Probe::new());
        let graph = engine.graph();
        let targets = target_ids(&shape);

        let selected = graph.select(targets.as_slice()).unwrap();
        let set: HashSet<usize> = selected.iter().copied().collect();
        prop_assert_eq!(set.len(), selected.len(), "duplicate in selection");

        // Every parent of a selected node is selected, so counting parents
        // inside the selection gives the same in-degree as counting them all.
        for &i in &selected {
            let node = graph.node_at(i);
            let inside = node.parents().iter().filter(|p| set.contains(p)).count();
            prop_assert_eq!(inside, node.parents().len());
        }

        let ids: BTreeSet<String> = selected
            .iter()
            .map(|&i| graph.node_at(i).id().to_string())
            .collect();
        prop_assert_eq!(ids, expected_selection(&shape));
    }

    #[test]
    fn test_verdict_matches_selected_filters(shape in shape_strategy()) {
        let probe = Probe::new();
        let engine = build(&shape, &probe);
        let targets = target_ids(&shape);

        let rejected = runtime()
            .block_on(engine.execute(Arc::new(9), Arc::new(FieldStore::new()), targets.as_slice()))
            .unwrap();

        let selected_filters: Vec<usize> = if shape.targets.is_empty() {
            (0..shape.filter_deps.len()).collect()
        } else {
            shape.targets.iter().copied().collect()
        };
        let expect_reject = selected_filters.iter().any(|&i| !shape.filter_passes[i]);
        prop_assert_eq!(rejected, expect_reject);

        if !rejected {
            // Exactly the selected nodes ran, each once.
            let expected = expected_selection(&shape);
            let started: Vec<String> = probe.started();
            let unique: BTreeSet<String> = started.iter().cloned().collect();
            prop_assert_eq!(started.len(), unique.len());
            prop_assert_eq!(unique, expected);
        }
    }
}

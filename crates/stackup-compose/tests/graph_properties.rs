//! Property tests for dependency ordering.
//!
//! - Acyclic graphs always order every dependency before its dependents.
//! - Graphs with a cycle always fail, naming a service that lies on a cycle.
//! - The ordering agrees with `petgraph`'s own cycle detection.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graph::DiGraph;
use proptest::prelude::*;
use stackup_common::error::StackupError;
use stackup_compose::definition::ServiceDefinition;
use stackup_compose::graph::ServiceGraph;

fn name(i: usize) -> String {
    format!("svc-{i}")
}

/// Service count, insertion order, and a dependency matrix (`deps[i][j]`
/// means service `i` depends on service `j`).
fn topology_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<Vec<bool>>)> {
    (1usize..12).prop_flat_map(|n| {
        (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec(prop::collection::vec(any::<bool>(), n), n),
        )
    })
}

fn build(insertion: &[usize], deps: &[Vec<bool>], keep: impl Fn(usize, usize) -> bool) -> ServiceGraph {
    let mut graph = ServiceGraph::new();
    for &i in insertion {
        graph
            .add_service(ServiceDefinition::new(name(i), "img"))
            .unwrap();
    }
    for &i in insertion {
        for (j, &wanted) in deps[i].iter().enumerate() {
            if wanted && keep(i, j) {
                graph.add_dependency(&name(i), &name(j)).unwrap();
            }
        }
    }
    graph
}

proptest! {
    #[test]
    fn acyclic_graphs_order_dependencies_first((insertion, deps) in topology_strategy()) {
        let graph = build(&insertion, &deps, |i, j| j < i);
        let order = graph.topological_order().unwrap().to_names();

        let mut sorted = order.clone();
        sorted.sort();
        let mut expected: Vec<_> = insertion.iter().map(|&i| name(i)).collect();
        expected.sort();
        prop_assert_eq!(sorted, expected);

        let position = |n: &str| order.iter().position(|o| o == n).unwrap();
        for svc in &order {
            for dep in graph.dependencies_of(svc).unwrap() {
                prop_assert!(position(dep) < position(svc), "{} before {} in {:?}", dep, svc, order);
            }
        }
    }

    #[test]
    fn graphs_with_a_cycle_always_fail(
        (insertion, deps) in topology_strategy(),
        cycle_len in 1usize..5,
    ) {
        let n = insertion.len();
        let cycle_len = cycle_len.min(n);
        let mut graph = build(&insertion, &deps, |i, j| j < i);
        for k in 0..cycle_len {
            graph.add_dependency(&name(k), &name((k + 1) % cycle_len)).unwrap();
        }

        match graph.topological_order() {
            Err(StackupError::CyclicDependency { member }) => {
                prop_assert!(graph.contains(&member));
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
            Ok(order) => prop_assert!(false, "expected a cycle, got {:?}", order.to_names()),
        }
    }

    #[test]
    fn ordering_agrees_with_petgraph((insertion, deps) in topology_strategy()) {
        let graph = build(&insertion, &deps, |_, _| true);

        let n = insertion.len();
        let mut oracle = DiGraph::<usize, ()>::new();
        let nodes: Vec<_> = (0..n).map(|i| oracle.add_node(i)).collect();
        for i in 0..n {
            for j in 0..n {
                if deps[i][j] {
                    let _ = oracle.add_edge(nodes[j], nodes[i], ());
                }
            }
        }

        match graph.topological_order() {
            Ok(_) => prop_assert!(!is_cyclic_directed(&oracle)),
            Err(StackupError::CyclicDependency { member }) => {
                prop_assert!(is_cyclic_directed(&oracle));
                let idx: usize = member.trim_start_matches("svc-").parse().unwrap();
                let on_cycle = oracle
                    .neighbors(nodes[idx])
                    .any(|next| has_path_connecting(&oracle, next, nodes[idx], None));
                prop_assert!(on_cycle, "{} is not on a cycle", member);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    #[test]
    fn ordering_is_deterministic((insertion, deps) in topology_strategy()) {
        let graph = build(&insertion, &deps, |i, j| j < i);
        let first = graph.topological_order().unwrap().to_names();
        let second = graph.topological_order().unwrap().to_names();
        prop_assert_eq!(first, second);
    }
}

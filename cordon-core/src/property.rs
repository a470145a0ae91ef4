//! Property-based tests for the propagation simulator and generator.
//!
//! Generates random graphs with varied densities and asserts the firewall
//! invariants hold for every topology: the source exemption, the
//! unconditional protection of a firewalled target, determinism, and the
//! equivalence of the empty-firewall infection set with the source's
//! connected component.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::features::{FEATURE_COLUMNS, extract_features};
use crate::graph::{Graph, NodeId};
use crate::simulate::{NodeStatus, simulate};

/// A generated simulation fixture: graph, endpoints, and a firewall set.
#[derive(Clone, Debug)]
struct SimFixture {
    graph: Graph,
    source: NodeId,
    target: NodeId,
    firewalled: BTreeSet<NodeId>,
}

/// Samples a random graph plus endpoints and picks from the seed.
///
/// Densities span sparse to near-complete so the invariants are exercised
/// on disconnected graphs as well as cliques.
fn generate_fixture(seed: u64) -> SimFixture {
    let mut rng = SmallRng::seed_from_u64(seed);
    let node_count: usize = rng.gen_range(4..=24);
    let edge_probability: f64 = rng.gen_range(0.05..=0.9);

    let nodes: Vec<NodeId> = (0..node_count as u32).map(NodeId::new).collect();
    let mut edges = Vec::new();
    for a in 0..node_count {
        for b in (a + 1)..node_count {
            if rng.gen_bool(edge_probability) {
                edges.push((NodeId::new(a as u32), NodeId::new(b as u32)));
            }
        }
    }
    let graph = Graph::new(nodes.iter().copied(), edges).expect("generated graph must be valid");

    let source = NodeId::new(rng.gen_range(0..node_count) as u32);
    let target = loop {
        let candidate = NodeId::new(rng.gen_range(0..node_count) as u32);
        if candidate != source {
            break candidate;
        }
    };

    let pick_count = rng.gen_range(0..=node_count / 2);
    let firewalled: BTreeSet<NodeId> = (0..pick_count)
        .map(|_| NodeId::new(rng.gen_range(0..node_count) as u32))
        .collect();

    SimFixture {
        graph,
        source,
        target,
        firewalled,
    }
}

fn fixture_strategy() -> impl Strategy<Value = SimFixture> {
    any::<u64>().prop_map(generate_fixture)
}

proptest! {
    #[test]
    fn empty_firewall_infects_exactly_the_source_component(fixture in fixture_strategy()) {
        let result = simulate(&fixture.graph, fixture.source, fixture.target, &BTreeSet::new())
            .expect("simulation must succeed");
        let component = fixture.graph.bfs_distances(fixture.source, &BTreeSet::new());
        for node in fixture.graph.nodes() {
            let expected = if component.contains_key(&node) {
                NodeStatus::Infected
            } else {
                NodeStatus::Safe
            };
            prop_assert_eq!(result.status_of(node), Some(expected));
        }
    }

    #[test]
    fn firewalled_target_is_always_safe(fixture in fixture_strategy()) {
        let mut picks = fixture.firewalled.clone();
        picks.insert(fixture.target);
        let result = simulate(&fixture.graph, fixture.source, fixture.target, &picks)
            .expect("simulation must succeed");
        prop_assert_eq!(result.target_status(), NodeStatus::Safe);
    }

    #[test]
    fn source_is_always_infected(fixture in fixture_strategy()) {
        let mut picks = fixture.firewalled.clone();
        picks.insert(fixture.source);
        let result = simulate(&fixture.graph, fixture.source, fixture.target, &picks)
            .expect("simulation must succeed");
        prop_assert_eq!(result.status_of(fixture.source), Some(NodeStatus::Infected));
    }

    #[test]
    fn firewalled_nodes_other_than_the_source_stay_safe(fixture in fixture_strategy()) {
        let result = simulate(&fixture.graph, fixture.source, fixture.target, &fixture.firewalled)
            .expect("simulation must succeed");
        for &node in &fixture.firewalled {
            if node == fixture.source || !fixture.graph.contains(node) {
                continue;
            }
            prop_assert_eq!(result.status_of(node), Some(NodeStatus::Safe));
        }
    }

    #[test]
    fn simulation_has_no_hidden_randomness(fixture in fixture_strategy()) {
        let first = simulate(&fixture.graph, fixture.source, fixture.target, &fixture.firewalled)
            .expect("simulation must succeed");
        let second = simulate(&fixture.graph, fixture.source, fixture.target, &fixture.firewalled)
            .expect("simulation must succeed");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn extraction_covers_every_candidate_with_the_full_schema(fixture in fixture_strategy()) {
        let features = extract_features(&fixture.graph, fixture.source, fixture.target)
            .expect("extraction must succeed");
        prop_assert_eq!(features.len(), fixture.graph.node_count() - 2);
        for vector in features.values() {
            for column in FEATURE_COLUMNS {
                prop_assert!(vector.value(column).is_some());
            }
        }
    }
}

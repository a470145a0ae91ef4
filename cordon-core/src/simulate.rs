//! BFS infection propagation with firewalled-node removal.
//!
//! A firewalled node is excluded from the propagation graph for one
//! simulation, blocking every path through it. Two policy rules are applied
//! explicitly rather than left to emerge from reachability:
//!
//! - the source is always infected, even when it appears in the firewall
//!   set (naively removing it before the BFS would erase the origin);
//! - a firewalled target is unconditionally safe, because reachability to a
//!   removed node is undefined.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use tracing::{debug, instrument};

use crate::graph::{Graph, GraphError, NodeId};

/// Infection status of a node after one simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NodeStatus {
    /// The node was never reached by the infection.
    #[serde(rename = "SAFE")]
    Safe,
    /// The node was reached by the infection.
    #[serde(rename = "INFECTED")]
    Infected,
}

impl NodeStatus {
    /// Returns the wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Infected => "INFECTED",
        }
    }
}

/// Outcome of one propagation simulation.
///
/// Computed per call and never persisted; running the simulation twice with
/// identical inputs yields identical results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PropagationResult {
    statuses: BTreeMap<NodeId, NodeStatus>,
    target_status: NodeStatus,
}

impl PropagationResult {
    /// Returns the per-node statuses, keyed by node id in ascending order.
    #[must_use]
    pub fn statuses(&self) -> &BTreeMap<NodeId, NodeStatus> {
        &self.statuses
    }

    /// Returns the status of a single node, if it exists in the graph.
    #[must_use]
    pub fn status_of(&self, node: NodeId) -> Option<NodeStatus> {
        self.statuses.get(&node).copied()
    }

    /// Returns the aggregate status of the protected target.
    #[must_use]
    pub fn target_status(&self) -> NodeStatus {
        self.target_status
    }

    /// Counts how many nodes ended up infected.
    #[must_use]
    pub fn infected_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|&&status| status == NodeStatus::Infected)
            .count()
    }
}

/// Runs the BFS infection simulation.
///
/// Every node in `firewalled` is removed from the propagation graph before
/// the spread, with the two policy exemptions documented at module level.
/// Firewalling a node outside the graph is a no-op.
///
/// # Errors
/// Returns [`GraphError::UnknownNode`] when `source` or `target` is not in
/// the graph and [`GraphError::SourceIsTarget`] when they coincide.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use cordon_core::{Graph, NodeId, NodeStatus, simulate};
///
/// // 4-cycle: 0 - 1 - 2 - 3 - 0, source 0, target 2.
/// let graph = Graph::new(
///     (0..4).map(NodeId::new),
///     [(0, 1), (1, 2), (2, 3), (3, 0)].map(|(a, b)| (NodeId::new(a), NodeId::new(b))),
/// )?;
/// let picks = BTreeSet::from([NodeId::new(1)]);
/// let result = simulate(&graph, NodeId::new(0), NodeId::new(2), &picks)?;
/// // The infection routes around the firewall via 0 -> 3 -> 2.
/// assert_eq!(result.status_of(NodeId::new(1)), Some(NodeStatus::Safe));
/// assert_eq!(result.status_of(NodeId::new(3)), Some(NodeStatus::Infected));
/// assert_eq!(result.target_status(), NodeStatus::Infected);
/// # Ok::<(), cordon_core::GraphError>(())
/// ```
#[instrument(
    name = "core.simulate",
    err,
    skip(graph, firewalled),
    fields(nodes = graph.node_count(), firewalled = firewalled.len()),
)]
pub fn simulate(
    graph: &Graph,
    source: NodeId,
    target: NodeId,
    firewalled: &BTreeSet<NodeId>,
) -> Result<PropagationResult, GraphError> {
    graph.require_endpoints(source, target)?;

    let mut statuses: BTreeMap<NodeId, NodeStatus> =
        graph.nodes().map(|node| (node, NodeStatus::Safe)).collect();

    // The source is the origin, not a target of the firewall.
    statuses.insert(source, NodeStatus::Infected);
    let mut queue = VecDeque::from([source]);
    let mut visited = BTreeSet::from([source]);

    while let Some(current) = queue.pop_front() {
        for &neighbor in graph.neighbors(current) {
            if visited.contains(&neighbor) || firewalled.contains(&neighbor) {
                continue;
            }
            visited.insert(neighbor);
            statuses.insert(neighbor, NodeStatus::Infected);
            queue.push_back(neighbor);
        }
    }

    // A firewalled target is protected unconditionally; checked explicitly
    // because the node was removed from the propagation graph above.
    let target_status = if firewalled.contains(&target) {
        NodeStatus::Safe
    } else {
        statuses.get(&target).copied().unwrap_or(NodeStatus::Safe)
    };

    let result = PropagationResult {
        statuses,
        target_status,
    };
    debug!(
        infected = result.infected_count(),
        target_status = result.target_status.as_str(),
        "simulation completed"
    );
    Ok(result)
}

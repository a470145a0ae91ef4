//! In-memory propagation graph model.
//!
//! Provides the validated [`Graph`] structure shared by the generator,
//! simulator, and feature extractor, together with the input-validation
//! error taxonomy ([`GraphError`]).

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a node in a propagation graph.
///
/// # Examples
/// ```
/// use cordon_core::NodeId;
///
/// let id = NodeId::new(3);
/// assert_eq!(id.get(), 3);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new node identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u32) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Validation errors raised while constructing or querying a [`Graph`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// An edge connected a node to itself.
    #[error("edge ({node}, {node}) is a self-loop")]
    SelfLoop {
        /// The node carrying the self-loop.
        node: NodeId,
    },
    /// The same undirected edge appeared more than once.
    #[error("edge ({left}, {right}) appears more than once")]
    DuplicateEdge {
        /// Smaller endpoint of the duplicated edge.
        left: NodeId,
        /// Larger endpoint of the duplicated edge.
        right: NodeId,
    },
    /// An edge referenced a node that is not in the node set.
    #[error("edge ({left}, {right}) references unknown node {missing}")]
    DanglingEndpoint {
        /// Smaller endpoint of the offending edge.
        left: NodeId,
        /// Larger endpoint of the offending edge.
        right: NodeId,
        /// The endpoint absent from the node set.
        missing: NodeId,
    },
    /// A source or target node was not a member of the graph.
    #[error("{role} node {node} is not in the graph")]
    UnknownNode {
        /// The node that is missing from the graph.
        node: NodeId,
        /// Which role the node was supposed to play (`"source"` or `"target"`).
        role: &'static str,
    },
    /// Source and target must be distinct nodes.
    #[error("source and target are both node {node}")]
    SourceIsTarget {
        /// The node supplied for both roles.
        node: NodeId,
    },
}

impl GraphError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> GraphErrorCode {
        match self {
            Self::SelfLoop { .. } => GraphErrorCode::SelfLoop,
            Self::DuplicateEdge { .. } => GraphErrorCode::DuplicateEdge,
            Self::DanglingEndpoint { .. } => GraphErrorCode::DanglingEndpoint,
            Self::UnknownNode { .. } => GraphErrorCode::UnknownNode,
            Self::SourceIsTarget { .. } => GraphErrorCode::SourceIsTarget,
        }
    }
}

/// Machine-readable error codes for [`GraphError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GraphErrorCode {
    /// An edge connected a node to itself.
    SelfLoop,
    /// The same undirected edge appeared more than once.
    DuplicateEdge,
    /// An edge referenced a node outside the node set.
    DanglingEndpoint,
    /// A source or target node was not a member of the graph.
    UnknownNode,
    /// Source and target were the same node.
    SourceIsTarget,
}

impl GraphErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfLoop => "GRAPH_SELF_LOOP",
            Self::DuplicateEdge => "GRAPH_DUPLICATE_EDGE",
            Self::DanglingEndpoint => "GRAPH_DANGLING_ENDPOINT",
            Self::UnknownNode => "GRAPH_UNKNOWN_NODE",
            Self::SourceIsTarget => "GRAPH_SOURCE_IS_TARGET",
        }
    }
}

/// A validated undirected graph with cached adjacency lists.
///
/// Edges are canonicalised to `(min, max)` order during construction.
/// Self-loops, duplicate edges, and dangling endpoints are rejected so
/// downstream traversals never have to re-validate.
///
/// # Examples
/// ```
/// use cordon_core::{Graph, NodeId};
///
/// let graph = Graph::new(
///     (0..4).map(NodeId::new),
///     [(0, 1), (1, 2), (2, 3), (3, 0)].map(|(a, b)| (NodeId::new(a), NodeId::new(b))),
/// )?;
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.neighbors(NodeId::new(0)), [NodeId::new(1), NodeId::new(3)]);
/// # Ok::<(), cordon_core::GraphError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeSet<NodeId>,
    edges: Vec<(NodeId, NodeId)>,
    adjacency: BTreeMap<NodeId, Vec<NodeId>>,
}

impl Graph {
    /// Builds a graph from node identifiers and undirected edges.
    ///
    /// # Errors
    /// Returns [`GraphError::SelfLoop`] for edges with equal endpoints,
    /// [`GraphError::DuplicateEdge`] when the same undirected edge appears
    /// twice, and [`GraphError::DanglingEndpoint`] when an edge references a
    /// node missing from the node set.
    pub fn new(
        nodes: impl IntoIterator<Item = NodeId>,
        edges: impl IntoIterator<Item = (NodeId, NodeId)>,
    ) -> Result<Self, GraphError> {
        let nodes: BTreeSet<NodeId> = nodes.into_iter().collect();
        let mut seen: BTreeSet<(NodeId, NodeId)> = BTreeSet::new();
        let mut canonical = Vec::new();

        for (a, b) in edges {
            if a == b {
                return Err(GraphError::SelfLoop { node: a });
            }
            let (left, right) = if a <= b { (a, b) } else { (b, a) };
            for endpoint in [left, right] {
                if !nodes.contains(&endpoint) {
                    return Err(GraphError::DanglingEndpoint {
                        left,
                        right,
                        missing: endpoint,
                    });
                }
            }
            if !seen.insert((left, right)) {
                return Err(GraphError::DuplicateEdge { left, right });
            }
            canonical.push((left, right));
        }

        let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> =
            nodes.iter().map(|&node| (node, Vec::new())).collect();
        for &(left, right) in &canonical {
            if let Some(list) = adjacency.get_mut(&left) {
                list.push(right);
            }
            if let Some(list) = adjacency.get_mut(&right) {
                list.push(left);
            }
        }
        // Sorted neighbour lists keep every traversal order deterministic.
        for list in adjacency.values_mut() {
            list.sort_unstable();
        }

        Ok(Self {
            nodes,
            edges: canonical,
            adjacency,
        })
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates node identifiers in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Returns the canonicalised edge list.
    #[must_use]
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Returns whether `node` is a member of the graph.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Returns the sorted neighbour list of `node` (empty if unknown).
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Confirms `node` is a member, reporting `role` in the error otherwise.
    pub(crate) fn require_member(
        &self,
        node: NodeId,
        role: &'static str,
    ) -> Result<(), GraphError> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode { node, role })
        }
    }

    /// Validates a `(source, target)` pair for membership and distinctness.
    pub(crate) fn require_endpoints(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> Result<(), GraphError> {
        self.require_member(source, "source")?;
        self.require_member(target, "target")?;
        if source == target {
            return Err(GraphError::SourceIsTarget { node: source });
        }
        Ok(())
    }

    /// Computes BFS hop distances from `from` to every reachable node.
    ///
    /// Nodes absent from the returned map are unreachable. Nodes in `skip`
    /// are treated as removed; `from` itself is never skipped.
    #[must_use]
    pub fn bfs_distances(&self, from: NodeId, skip: &BTreeSet<NodeId>) -> BTreeMap<NodeId, u32> {
        let mut distances = BTreeMap::new();
        if !self.contains(from) {
            return distances;
        }
        distances.insert(from, 0);
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            let next_hop = distances.get(&current).copied().unwrap_or(0) + 1;
            for &neighbor in self.neighbors(current) {
                if skip.contains(&neighbor) || distances.contains_key(&neighbor) {
                    continue;
                }
                distances.insert(neighbor, next_hop);
                queue.push_back(neighbor);
            }
        }
        distances
    }

    /// Returns whether a path exists between `a` and `b`.
    #[must_use]
    pub fn path_exists(&self, a: NodeId, b: NodeId) -> bool {
        a == b || self.bfs_distances(a, &BTreeSet::new()).contains_key(&b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    fn edge(a: u32, b: u32) -> (NodeId, NodeId) {
        (NodeId::new(a), NodeId::new(b))
    }

    #[test]
    fn rejects_self_loop() {
        let result = Graph::new(ids(&[0, 1]), [edge(1, 1)]);
        assert!(matches!(
            result,
            Err(GraphError::SelfLoop { node }) if node == NodeId::new(1)
        ));
    }

    #[test]
    fn rejects_duplicate_edges_regardless_of_orientation() {
        let result = Graph::new(ids(&[0, 1]), [edge(0, 1), edge(1, 0)]);
        assert!(matches!(result, Err(GraphError::DuplicateEdge { .. })));
    }

    #[test]
    fn rejects_dangling_endpoint() {
        let result = Graph::new(ids(&[0, 1]), [edge(0, 7)]);
        assert!(matches!(
            result,
            Err(GraphError::DanglingEndpoint { missing, .. }) if missing == NodeId::new(7)
        ));
    }

    #[test]
    fn canonicalises_edges_and_sorts_neighbours() {
        let graph =
            Graph::new(ids(&[0, 1, 2]), [edge(2, 0), edge(1, 0)]).expect("graph must be valid");
        assert_eq!(graph.edges(), [edge(0, 2), edge(0, 1)]);
        assert_eq!(graph.neighbors(NodeId::new(0)), ids(&[1, 2]).as_slice());
    }

    #[test]
    fn bfs_distances_skip_removed_nodes() {
        // Path graph 0 - 1 - 2; removing 1 isolates 2.
        let graph =
            Graph::new(ids(&[0, 1, 2]), [edge(0, 1), edge(1, 2)]).expect("graph must be valid");
        let skip = BTreeSet::from([NodeId::new(1)]);
        let distances = graph.bfs_distances(NodeId::new(0), &skip);
        assert_eq!(distances.get(&NodeId::new(0)), Some(&0));
        assert_eq!(distances.get(&NodeId::new(2)), None);
    }

    #[test]
    fn path_exists_is_reflexive_and_symmetric() {
        let graph =
            Graph::new(ids(&[0, 1, 2, 3]), [edge(0, 1), edge(2, 3)]).expect("graph must be valid");
        assert!(graph.path_exists(NodeId::new(0), NodeId::new(0)));
        assert!(graph.path_exists(NodeId::new(0), NodeId::new(1)));
        assert!(graph.path_exists(NodeId::new(1), NodeId::new(0)));
        assert!(!graph.path_exists(NodeId::new(0), NodeId::new(3)));
    }

    #[test]
    fn endpoint_validation_reports_role() {
        let graph = Graph::new(ids(&[0, 1]), [edge(0, 1)]).expect("graph must be valid");
        let err = graph
            .require_endpoints(NodeId::new(0), NodeId::new(9))
            .expect_err("unknown target must fail");
        assert!(matches!(err, GraphError::UnknownNode { role: "target", .. }));
        assert_eq!(err.code().as_str(), "GRAPH_UNKNOWN_NODE");

        let err = graph
            .require_endpoints(NodeId::new(1), NodeId::new(1))
            .expect_err("equal endpoints must fail");
        assert!(matches!(err, GraphError::SourceIsTarget { .. }));
    }
}

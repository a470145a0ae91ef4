//! Shared test fixtures for `cordon-core`.

use std::collections::BTreeSet;

use crate::graph::{Graph, NodeId};

/// Builds a graph from raw node ids and edge pairs, panicking on invalid
/// fixtures so tests fail loudly.
pub(crate) fn graph_from_edges(nodes: &[u32], edges: &[(u32, u32)]) -> Graph {
    Graph::new(
        nodes.iter().copied().map(NodeId::new),
        edges
            .iter()
            .map(|&(a, b)| (NodeId::new(a), NodeId::new(b))),
    )
    .expect("test fixture graph must be valid")
}

/// The canonical worked example: 4-cycle 0 - 1 - 2 - 3 - 0.
pub(crate) fn cycle4() -> Graph {
    graph_from_edges(&[0, 1, 2, 3], &[(0, 1), (1, 2), (2, 3), (3, 0)])
}

/// Builds a firewall pick set from raw ids.
pub(crate) fn picks(raw: &[u32]) -> BTreeSet<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}

/// Converts raw ids into a `NodeId` vector for assertions.
pub(crate) fn ids(raw: &[u32]) -> Vec<NodeId> {
    raw.iter().copied().map(NodeId::new).collect()
}

/// Converts a slice of column names into the owned manifest form.
pub(crate) fn to_columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|&name| name.to_owned()).collect()
}

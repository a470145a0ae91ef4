//! Structural feature extraction for classifier consumption.
//!
//! Every candidate node (all nodes except source and target) receives a
//! vector over the frozen schema in [`FEATURE_COLUMNS`]. Extraction is fully
//! deterministic: BFS distances use sorted adjacency, and the Brandes
//! betweenness accumulation collects per-pivot contributions in pivot order
//! before summing, so the rayon parallelism never reorders float additions.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rayon::prelude::*;
use tracing::instrument;

use crate::graph::{Graph, GraphError, NodeId};

/// Frozen, ordered feature schema. The classifier's column manifest remains
/// authoritative at inference time; reconciliation against it happens in the
/// ranking layer.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "degree",
    "dist_to_source",
    "dist_to_target",
    "on_shortest_path",
    "betweenness",
    "cuts_source_target",
];

/// Sentinel distance for nodes unreachable from a BFS origin. Kept finite so
/// every vector stays schema-complete and model-consumable.
pub const UNREACHABLE_DISTANCE: f64 = 1.0e6;

/// Fixed-schema numeric summary of a node's structural role relative to the
/// source and target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector {
    degree: f64,
    dist_to_source: f64,
    dist_to_target: f64,
    on_shortest_path: f64,
    betweenness: f64,
    cuts_source_target: f64,
}

impl FeatureVector {
    /// Returns the value for `column`, or `None` for names outside the schema.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "degree" => Some(self.degree),
            "dist_to_source" => Some(self.dist_to_source),
            "dist_to_target" => Some(self.dist_to_target),
            "on_shortest_path" => Some(self.on_shortest_path),
            "betweenness" => Some(self.betweenness),
            "cuts_source_target" => Some(self.cuts_source_target),
            _ => None,
        }
    }

    /// Returns the values in [`FEATURE_COLUMNS`] order.
    #[must_use]
    pub fn values(&self) -> [f64; 6] {
        [
            self.degree,
            self.dist_to_source,
            self.dist_to_target,
            self.on_shortest_path,
            self.betweenness,
            self.cuts_source_target,
        ]
    }
}

/// Extracts a feature vector for every node except `source` and `target`.
///
/// Nodes in components disconnected from the source still receive a full
/// vector, with [`UNREACHABLE_DISTANCE`] standing in for missing distances.
///
/// # Errors
/// Returns [`GraphError::UnknownNode`] when `source` or `target` is not in
/// the graph and [`GraphError::SourceIsTarget`] when they coincide.
///
/// # Examples
/// ```
/// use cordon_core::{FEATURE_COLUMNS, Graph, NodeId, extract_features};
///
/// let graph = Graph::new(
///     (0..4).map(NodeId::new),
///     [(0, 1), (1, 2), (2, 3), (3, 0)].map(|(a, b)| (NodeId::new(a), NodeId::new(b))),
/// )?;
/// let features = extract_features(&graph, NodeId::new(0), NodeId::new(2))?;
/// assert_eq!(features.len(), 2);
/// let vector = &features[&NodeId::new(1)];
/// assert_eq!(vector.value("degree"), Some(2.0));
/// assert_eq!(vector.value("on_shortest_path"), Some(1.0));
/// assert!(FEATURE_COLUMNS.iter().all(|c| vector.value(c).is_some()));
/// # Ok::<(), cordon_core::GraphError>(())
/// ```
#[instrument(
    name = "core.extract_features",
    err,
    skip(graph),
    fields(nodes = graph.node_count()),
)]
pub fn extract_features(
    graph: &Graph,
    source: NodeId,
    target: NodeId,
) -> Result<BTreeMap<NodeId, FeatureVector>, GraphError> {
    graph.require_endpoints(source, target)?;

    let empty = BTreeSet::new();
    let from_source = graph.bfs_distances(source, &empty);
    let from_target = graph.bfs_distances(target, &empty);
    let st_distance = from_source.get(&target).copied();
    let betweenness = betweenness_centrality(graph);

    let mut features = BTreeMap::new();
    for node in graph.nodes() {
        if node == source || node == target {
            continue;
        }
        let dist_to_source = hop_or_sentinel(from_source.get(&node));
        let dist_to_target = hop_or_sentinel(from_target.get(&node));
        let on_shortest_path = match (from_source.get(&node), from_target.get(&node), st_distance)
        {
            (Some(&ds), Some(&dt), Some(dst)) if ds + dt == dst => 1.0,
            _ => 0.0,
        };
        let cuts_source_target = if severs_pair(graph, node, source, target) {
            1.0
        } else {
            0.0
        };
        features.insert(
            node,
            FeatureVector {
                degree: graph.neighbors(node).len() as f64,
                dist_to_source,
                dist_to_target,
                on_shortest_path,
                betweenness: betweenness.get(&node).copied().unwrap_or(0.0),
                cuts_source_target,
            },
        );
    }
    Ok(features)
}

fn hop_or_sentinel(hops: Option<&u32>) -> f64 {
    hops.map_or(UNREACHABLE_DISTANCE, |&h| f64::from(h))
}

/// Cut-vertex test restricted to the source/target pair: does removing
/// `node` disconnect them?
fn severs_pair(graph: &Graph, node: NodeId, source: NodeId, target: NodeId) -> bool {
    let skip = BTreeSet::from([node]);
    !graph.bfs_distances(source, &skip).contains_key(&target)
}

/// Normalised betweenness centrality over the unweighted graph (Brandes).
///
/// Pivot contributions are computed in parallel but collected and summed in
/// pivot order, keeping the result bit-identical across runs.
fn betweenness_centrality(graph: &Graph) -> BTreeMap<NodeId, f64> {
    let index: Vec<NodeId> = graph.nodes().collect();
    let n = index.len();
    if n < 3 {
        return index.iter().map(|&node| (node, 0.0)).collect();
    }
    let positions: BTreeMap<NodeId, usize> = index
        .iter()
        .enumerate()
        .map(|(pos, &node)| (node, pos))
        .collect();

    let partials: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|pivot| pivot_dependencies(graph, &index, &positions, pivot))
        .collect();

    let mut raw = vec![0.0; n];
    for partial in &partials {
        for (accumulated, contribution) in raw.iter_mut().zip(partial) {
            *accumulated += contribution;
        }
    }

    // Each unordered pair is counted from both endpoints; halve, then scale
    // into [0, 1] by the number of pairs excluding the node itself.
    let pairs = ((n - 1) * (n - 2)) as f64 / 2.0;
    index
        .iter()
        .zip(&raw)
        .map(|(&node, &value)| (node, value / pairs))
        .collect()
}

/// Single-pivot Brandes pass: shortest-path counts on the way out,
/// dependency accumulation on the way back.
fn pivot_dependencies(
    graph: &Graph,
    index: &[NodeId],
    positions: &BTreeMap<NodeId, usize>,
    pivot: usize,
) -> Vec<f64> {
    let n = index.len();
    let mut sigma = vec![0.0_f64; n];
    let mut distance = vec![-1_i64; n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);

    sigma[pivot] = 1.0;
    distance[pivot] = 0;
    let mut queue = VecDeque::from([pivot]);
    while let Some(current) = queue.pop_front() {
        order.push(current);
        for &neighbor_id in graph.neighbors(index[current]) {
            let Some(&neighbor) = positions.get(&neighbor_id) else {
                continue;
            };
            if distance[neighbor] < 0 {
                distance[neighbor] = distance[current] + 1;
                queue.push_back(neighbor);
            }
            if distance[neighbor] == distance[current] + 1 {
                sigma[neighbor] += sigma[current];
                predecessors[neighbor].push(current);
            }
        }
    }

    let mut dependency = vec![0.0_f64; n];
    for &node in order.iter().rev() {
        for &pred in &predecessors[node] {
            dependency[pred] +=
                sigma[pred] / sigma[node] * (1.0 + dependency[node]);
        }
    }

    dependency
        .iter()
        .enumerate()
        // Halved per pivot so the final accumulation needs no second pass.
        .map(|(node, &value)| if node == pivot { 0.0 } else { value / 2.0 })
        .collect()
}

//! Wire representation of graphs and games.
//!
//! The wire format is node-link JSON: an object with a `nodes` list (each
//! carrying an integer `id`) and a `links` list (each carrying integer
//! `source` and `target` endpoints). Decoding re-validates every structural
//! invariant, so a graph obtained from the wire is safe to traverse.

use serde::{Deserialize, Serialize};

use crate::graph::{Graph, GraphError, NodeId};

/// A node entry in the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireNode {
    /// Integer node identifier.
    pub id: u32,
}

/// An undirected edge entry in the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireLink {
    /// First endpoint identifier.
    pub source: u32,
    /// Second endpoint identifier.
    pub target: u32,
}

/// Node-link wire form of a [`Graph`].
///
/// # Examples
/// ```
/// use cordon_core::{NodeId, WireGraph};
///
/// let wire: WireGraph = serde_json::from_str(
///     r#"{"nodes":[{"id":0},{"id":1}],"links":[{"source":0,"target":1}]}"#,
/// )?;
/// let graph = wire.decode()?;
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(WireGraph::encode(&graph), wire);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGraph {
    /// Node list.
    pub nodes: Vec<WireNode>,
    /// Undirected edge list.
    pub links: Vec<WireLink>,
}

impl WireGraph {
    /// Converts an in-memory graph into its wire form.
    #[must_use]
    pub fn encode(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes().map(|node| WireNode { id: node.get() }).collect(),
            links: graph
                .edges()
                .iter()
                .map(|&(left, right)| WireLink {
                    source: left.get(),
                    target: right.get(),
                })
                .collect(),
        }
    }

    /// Validates and converts the wire form into an in-memory [`Graph`].
    ///
    /// # Errors
    /// Returns [`GraphError`] when the wire data carries self-loops,
    /// duplicate edges, or edges referencing unknown nodes.
    pub fn decode(&self) -> Result<Graph, GraphError> {
        Graph::new(
            self.nodes.iter().map(|node| NodeId::new(node.id)),
            self.links
                .iter()
                .map(|link| (NodeId::new(link.source), NodeId::new(link.target))),
        )
    }
}

/// Wire form of a freshly generated game: the graph plus its roles.
///
/// This is the payload shape produced by `new_game` and consumed by
/// `simulate`/`predict` callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGame {
    /// The playing field in node-link form.
    pub graph: WireGraph,
    /// Infection source node identifier.
    pub source: u32,
    /// Protected target node identifier.
    pub target: u32,
}

impl WireGame {
    /// Parses a wire game from a JSON string.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] when the payload is not valid JSON of
    /// the expected shape.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialises the wire game to a JSON string.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_graph_through_the_wire_form() {
        let graph = Graph::new(
            (0..3).map(NodeId::new),
            [
                (NodeId::new(0), NodeId::new(1)),
                (NodeId::new(1), NodeId::new(2)),
            ],
        )
        .expect("graph must be valid");

        let wire = WireGraph::encode(&graph);
        let decoded = wire.decode().expect("wire graph must decode");
        assert_eq!(decoded, graph);
    }

    #[test]
    fn decode_rejects_dangling_links() {
        let wire = WireGraph {
            nodes: vec![WireNode { id: 0 }],
            links: vec![WireLink { source: 0, target: 5 }],
        };
        assert!(matches!(
            wire.decode(),
            Err(GraphError::DanglingEndpoint { .. })
        ));
    }

    #[test]
    fn wire_game_round_trips_through_json() {
        let raw = r#"{"graph":{"nodes":[{"id":0},{"id":1}],"links":[{"source":0,"target":1}]},"source":0,"target":1}"#;
        let game = WireGame::from_json(raw).expect("payload must parse");
        assert_eq!(game.source, 0);
        assert_eq!(game.target, 1);
        let rendered = game.to_json().expect("payload must serialise");
        let reparsed = WireGame::from_json(&rendered).expect("rendered payload must parse");
        assert_eq!(reparsed, game);
    }
}

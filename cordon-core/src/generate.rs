//! Random game generation.
//!
//! Produces G(n, p) style random graphs together with a source and target
//! pair that is guaranteed to be connected, retrying within a bounded budget
//! when a sampled graph does not satisfy the separation invariant.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::graph::{Graph, GraphError, NodeId};

/// Errors raised while generating a new game.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerateError {
    /// The generator configuration was internally inconsistent.
    #[error("invalid generator configuration: {reason}")]
    InvalidConfig {
        /// Description of the rejected parameter combination.
        reason: String,
    },
    /// No connected source/target pair was found within the retry budget.
    #[error("no connected source/target pair found after {attempts} attempts")]
    RetryBudgetExhausted {
        /// Number of full generation attempts made.
        attempts: usize,
    },
    /// Graph assembly failed; indicates a generator logic error.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl GenerateError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> GenerateErrorCode {
        match self {
            Self::InvalidConfig { .. } => GenerateErrorCode::InvalidConfig,
            Self::RetryBudgetExhausted { .. } => GenerateErrorCode::RetryBudgetExhausted,
            Self::Graph(_) => GenerateErrorCode::Graph,
        }
    }
}

/// Machine-readable error codes for [`GenerateError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GenerateErrorCode {
    /// The generator configuration was internally inconsistent.
    InvalidConfig,
    /// The retry budget was exhausted.
    RetryBudgetExhausted,
    /// Graph assembly failed.
    Graph,
}

impl GenerateErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfig => "GENERATE_INVALID_CONFIG",
            Self::RetryBudgetExhausted => "GENERATE_RETRY_BUDGET_EXHAUSTED",
            Self::Graph => "GENERATE_GRAPH",
        }
    }
}

/// Configuration for random game generation.
///
/// Defaults produce small graphs suitable for visual play: 18 to 28 nodes,
/// edge probability 0.15, source and target at least two hops apart.
///
/// # Examples
/// ```
/// use cordon_core::GeneratorConfig;
///
/// let config = GeneratorConfig::new()
///     .with_node_range(10, 14)
///     .with_edge_probability(0.3);
/// assert_eq!(config.node_range(), (10, 14));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    nodes_min: usize,
    nodes_max: usize,
    edge_probability: f64,
    min_separation: u32,
    retry_budget: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nodes_min: 18,
            nodes_max: 28,
            edge_probability: 0.15,
            min_separation: 2,
            retry_budget: 32,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the inclusive node-count range.
    #[must_use]
    pub fn with_node_range(mut self, min: usize, max: usize) -> Self {
        self.nodes_min = min;
        self.nodes_max = max;
        self
    }

    /// Overrides the per-pair edge probability.
    #[must_use]
    pub fn with_edge_probability(mut self, probability: f64) -> Self {
        self.edge_probability = probability;
        self
    }

    /// Overrides the minimum source/target hop separation.
    #[must_use]
    pub fn with_min_separation(mut self, hops: u32) -> Self {
        self.min_separation = hops;
        self
    }

    /// Overrides the full-regeneration retry budget.
    #[must_use]
    pub fn with_retry_budget(mut self, attempts: usize) -> Self {
        self.retry_budget = attempts;
        self
    }

    /// Returns the inclusive node-count range.
    #[must_use]
    pub fn node_range(&self) -> (usize, usize) {
        (self.nodes_min, self.nodes_max)
    }

    /// Returns the per-pair edge probability.
    #[must_use]
    pub fn edge_probability(&self) -> f64 {
        self.edge_probability
    }

    /// Returns the minimum source/target hop separation.
    #[must_use]
    pub fn min_separation(&self) -> u32 {
        self.min_separation
    }

    /// Returns the retry budget.
    #[must_use]
    pub fn retry_budget(&self) -> usize {
        self.retry_budget
    }

    pub(crate) fn validate(&self) -> Result<(), GenerateError> {
        if self.nodes_min < 2 {
            return Err(GenerateError::InvalidConfig {
                reason: format!("node range must start at 2 or more (got {})", self.nodes_min),
            });
        }
        if self.nodes_min > self.nodes_max {
            return Err(GenerateError::InvalidConfig {
                reason: format!(
                    "node range is inverted ({}..={})",
                    self.nodes_min, self.nodes_max
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.edge_probability) {
            return Err(GenerateError::InvalidConfig {
                reason: format!(
                    "edge probability must be within [0, 1] (got {})",
                    self.edge_probability
                ),
            });
        }
        if self.retry_budget == 0 {
            return Err(GenerateError::InvalidConfig {
                reason: "retry budget must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// A freshly generated game: graph plus infection source and protected target.
#[derive(Clone, Debug, PartialEq)]
pub struct NewGame {
    graph: Graph,
    source: NodeId,
    target: NodeId,
}

impl NewGame {
    /// Returns the playing field.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns the infection source node.
    #[must_use]
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the protected target node.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }
}

/// Generates a new game with an entropy-seeded RNG.
///
/// # Errors
/// Returns [`GenerateError::InvalidConfig`] for inconsistent parameters and
/// [`GenerateError::RetryBudgetExhausted`] when no connected pair was found.
pub fn generate(config: &GeneratorConfig) -> Result<NewGame, GenerateError> {
    let mut rng = SmallRng::from_entropy();
    generate_with_rng(config, &mut rng)
}

/// Generates a new game from an injected RNG, making generation reproducible
/// under a fixed seed.
///
/// # Errors
/// Returns [`GenerateError::InvalidConfig`] for inconsistent parameters and
/// [`GenerateError::RetryBudgetExhausted`] when no connected pair was found.
///
/// # Examples
/// ```
/// use cordon_core::{GeneratorConfig, generate_with_rng};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let config = GeneratorConfig::new().with_edge_probability(0.4);
/// let mut rng = SmallRng::seed_from_u64(7);
/// let game = generate_with_rng(&config, &mut rng)?;
/// assert!(game.graph().path_exists(game.source(), game.target()));
/// # Ok::<(), cordon_core::GenerateError>(())
/// ```
#[instrument(name = "core.generate", err, skip(config, rng))]
pub fn generate_with_rng(
    config: &GeneratorConfig,
    rng: &mut SmallRng,
) -> Result<NewGame, GenerateError> {
    config.validate()?;

    for attempt in 0..config.retry_budget {
        let game = sample_game(config, rng)?;
        if let Some(game) = game {
            debug!(
                attempt,
                nodes = game.graph.node_count(),
                edges = game.graph.edge_count(),
                source = %game.source,
                target = %game.target,
                "generated game"
            );
            return Ok(game);
        }
    }

    Err(GenerateError::RetryBudgetExhausted {
        attempts: config.retry_budget,
    })
}

/// Samples one candidate graph and role pair, returning `None` when the
/// sampled pair does not satisfy the separation invariant.
fn sample_game(
    config: &GeneratorConfig,
    rng: &mut SmallRng,
) -> Result<Option<NewGame>, GenerateError> {
    let node_count = rng.gen_range(config.nodes_min..=config.nodes_max);
    let mut edges = Vec::new();
    for a in 0..node_count {
        for b in (a + 1)..node_count {
            if rng.gen_bool(config.edge_probability) {
                edges.push((NodeId::new(a as u32), NodeId::new(b as u32)));
            }
        }
    }
    let graph = Graph::new((0..node_count as u32).map(NodeId::new), edges)?;

    let source = NodeId::new(rng.gen_range(0..node_count) as u32);
    let target = NodeId::new(rng.gen_range(0..node_count) as u32);
    if source == target {
        return Ok(None);
    }

    let distances = graph.bfs_distances(source, &BTreeSet::new());
    match distances.get(&target) {
        Some(&hops) if hops >= config.min_separation => Ok(Some(NewGame {
            graph,
            source,
            target,
        })),
        _ => Ok(None),
    }
}

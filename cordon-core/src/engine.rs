//! Engine orchestration for the containment game.
//!
//! Ties the generator, simulator, extractor, ranker, and scorer together
//! behind the four boundary operations: `new_game`, `simulate`, `predict`,
//! and `score`. Every operation is a synchronous pure function over its
//! inputs; the only shared resource is the installed classifier, which is
//! read-only after construction.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::rngs::SmallRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::features::extract_features;
use crate::generate::{GenerateError, GeneratorConfig, NewGame, generate_with_rng};
use crate::graph::{Graph, GraphError, NodeId};
use crate::rank::{CriticalityScorer, Prediction, RankError, rank_critical};
use crate::score::{Score, ScoreWeights, score_round};
use crate::simulate::{NodeStatus, PropagationResult, simulate};

/// Error type produced by [`Engine`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Error)]
pub enum EngineError {
    /// Input validation failed (malformed graph or endpoints).
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Game generation failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),
    /// Feature ranking failed.
    #[error(transparent)]
    Rank(#[from] RankError),
    /// The classifier is not loaded; a readiness failure, not a data one.
    #[error("classifier is not available: {reason}")]
    ModelUnavailable {
        /// Why the classifier cannot serve predictions.
        reason: String,
    },
    /// The suggestion limit must be at least one.
    #[error("suggestion limit must be at least 1 (got {got})")]
    InvalidSuggestionLimit {
        /// The rejected limit.
        got: usize,
    },
}

impl EngineError {
    /// Returns the stable, machine-readable error code, delegating to the
    /// wrapped module code where one exists.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Graph(error) => error.code().as_str(),
            Self::Generate(error) => error.code().as_str(),
            Self::Rank(error) => error.code().as_str(),
            Self::ModelUnavailable { .. } => "ENGINE_MODEL_UNAVAILABLE",
            Self::InvalidSuggestionLimit { .. } => "ENGINE_INVALID_SUGGESTION_LIMIT",
        }
    }
}

/// Convenient alias for results returned by the engine API.
pub type Result<T> = core::result::Result<T, EngineError>;

/// Combined outcome of resolving a round: the simulation plus its score.
///
/// Mirrors the boundary contract where a single simulate request returns
/// both the per-node statuses and the scoring breakdown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundOutcome {
    /// Per-node propagation outcome.
    pub simulation: PropagationResult,
    /// Score derived from the outcome and the pick sets.
    pub scoring: Score,
}

/// Entry point for running the containment game pipeline.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use cordon_core::{EngineBuilder, GeneratorConfig, NodeStatus};
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let engine = EngineBuilder::new()
///     .with_generator(GeneratorConfig::new().with_edge_probability(0.35))
///     .build()
///     .expect("builder configuration is valid");
///
/// let mut rng = SmallRng::seed_from_u64(11);
/// let game = engine.new_game_with_rng(&mut rng)?;
/// let outcome = engine.resolve_round(
///     game.graph(),
///     game.source(),
///     game.target(),
///     &BTreeSet::new(),
///     None,
/// )?;
/// // With no firewall the target is always reached.
/// assert_eq!(outcome.simulation.target_status(), NodeStatus::Infected);
/// assert_eq!(outcome.scoring.total(), 0.0);
/// # Ok::<(), cordon_core::EngineError>(())
/// ```
#[derive(Clone)]
pub struct Engine {
    generator: GeneratorConfig,
    weights: ScoreWeights,
    suggestion_limit: usize,
    scorer: Option<Arc<dyn CriticalityScorer + Send + Sync>>,
    expected_columns: Vec<String>,
}

impl Engine {
    pub(crate) fn new(
        generator: GeneratorConfig,
        weights: ScoreWeights,
        suggestion_limit: usize,
        scorer: Option<Arc<dyn CriticalityScorer + Send + Sync>>,
        expected_columns: Vec<String>,
    ) -> Self {
        Self {
            generator,
            weights,
            suggestion_limit,
            scorer,
            expected_columns,
        }
    }

    /// Returns the configured suggestion limit.
    #[must_use]
    pub fn suggestion_limit(&self) -> usize {
        self.suggestion_limit
    }

    /// Returns whether predictions can be served.
    ///
    /// This is the explicit readiness query for the classifier lifecycle:
    /// callers can distinguish "engine up, model missing" from failures.
    #[must_use]
    pub fn model_ready(&self) -> bool {
        self.scorer.is_some()
    }

    /// Generates a new game with an entropy-seeded RNG.
    ///
    /// # Errors
    /// Returns [`EngineError::Generate`] when no valid game was produced
    /// within the configured retry budget.
    pub fn new_game(&self) -> Result<NewGame> {
        Ok(crate::generate::generate(&self.generator)?)
    }

    /// Generates a new game from an injected RNG for reproducibility.
    ///
    /// # Errors
    /// Returns [`EngineError::Generate`] when no valid game was produced
    /// within the configured retry budget.
    pub fn new_game_with_rng(&self, rng: &mut SmallRng) -> Result<NewGame> {
        Ok(generate_with_rng(&self.generator, rng)?)
    }

    /// Runs the infection simulation with the player's firewall picks.
    ///
    /// # Errors
    /// Returns [`EngineError::Graph`] when the endpoints are invalid.
    pub fn simulate(
        &self,
        graph: &Graph,
        source: NodeId,
        target: NodeId,
        user_picks: &BTreeSet<NodeId>,
    ) -> Result<PropagationResult> {
        Ok(simulate(graph, source, target, user_picks)?)
    }

    /// Runs the simulation and scores the round in one step.
    ///
    /// # Errors
    /// Returns [`EngineError::Graph`] when the endpoints are invalid.
    #[instrument(
        name = "engine.resolve_round",
        err,
        skip(self, graph, user_picks, model_picks),
        fields(nodes = graph.node_count(), picks = user_picks.len()),
    )]
    pub fn resolve_round(
        &self,
        graph: &Graph,
        source: NodeId,
        target: NodeId,
        user_picks: &BTreeSet<NodeId>,
        model_picks: Option<&BTreeSet<NodeId>>,
    ) -> Result<RoundOutcome> {
        let simulation = simulate(graph, source, target, user_picks)?;
        let scoring = score_round(
            &self.weights,
            simulation.target_status(),
            user_picks,
            model_picks,
        );
        Ok(RoundOutcome {
            simulation,
            scoring,
        })
    }

    /// Predicts the top critical nodes for the given game.
    ///
    /// # Errors
    /// Returns [`EngineError::ModelUnavailable`] when no classifier is
    /// installed, [`EngineError::Graph`] for invalid endpoints, and
    /// [`EngineError::Rank`] when the schema cannot be reconciled or the
    /// scorer fails.
    #[instrument(
        name = "engine.predict",
        err,
        skip(self, graph),
        fields(nodes = graph.node_count()),
    )]
    pub fn predict(
        &self,
        graph: &Graph,
        source: NodeId,
        target: NodeId,
    ) -> Result<Vec<Prediction>> {
        let Some(scorer) = self.scorer.as_deref() else {
            warn!("prediction requested but no classifier is installed");
            return Err(EngineError::ModelUnavailable {
                reason: "no classifier installed".to_owned(),
            });
        };
        let features = extract_features(graph, source, target)?;
        Ok(rank_critical(
            &features,
            &self.expected_columns,
            scorer,
            self.suggestion_limit,
        )?)
    }

    /// Extracts the structural feature vectors for every candidate node.
    ///
    /// Exposed so callers can inspect what the classifier would see.
    ///
    /// # Errors
    /// Returns [`EngineError::Graph`] when the endpoints are invalid.
    pub fn features(
        &self,
        graph: &Graph,
        source: NodeId,
        target: NodeId,
    ) -> Result<BTreeMap<NodeId, crate::features::FeatureVector>> {
        Ok(extract_features(graph, source, target)?)
    }

    /// Scores a round outcome directly.
    #[must_use]
    pub fn score(
        &self,
        target_status: NodeStatus,
        user_picks: &BTreeSet<NodeId>,
        model_picks: Option<&BTreeSet<NodeId>>,
    ) -> Score {
        score_round(&self.weights, target_status, user_picks, model_picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::EngineBuilder;
    use crate::rank::{Criticality, ScorerError};
    use crate::test_utils::{cycle4, picks, to_columns};
    use crate::FEATURE_COLUMNS;
    use rand::SeedableRng;

    struct ConstantScorer(f64);

    impl CriticalityScorer for ConstantScorer {
        fn score(&self, _features: &[f64]) -> core::result::Result<Criticality, ScorerError> {
            Ok(Criticality {
                critical: true,
                probability: self.0,
            })
        }
    }

    #[test]
    fn predict_without_a_model_is_a_readiness_failure() {
        let engine = EngineBuilder::new().build().expect("defaults must build");
        let graph = cycle4();
        let err = engine
            .predict(&graph, NodeId::new(0), NodeId::new(2))
            .expect_err("missing model must fail");
        assert!(matches!(err, EngineError::ModelUnavailable { .. }));
        assert_eq!(err.code(), "ENGINE_MODEL_UNAVAILABLE");
    }

    #[test]
    fn predict_with_a_model_returns_bounded_suggestions() {
        let engine = EngineBuilder::new()
            .with_scorer(
                Arc::new(ConstantScorer(0.9)),
                to_columns(&FEATURE_COLUMNS),
            )
            .with_suggestion_limit(1)
            .build()
            .expect("configuration must build");
        let graph = cycle4();
        let predictions = engine
            .predict(&graph, NodeId::new(0), NodeId::new(2))
            .expect("prediction must succeed");
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].node(), NodeId::new(1));
    }

    #[test]
    fn resolve_round_combines_simulation_and_score() {
        let engine = EngineBuilder::new().build().expect("defaults must build");
        let graph = cycle4();
        let outcome = engine
            .resolve_round(
                &graph,
                NodeId::new(0),
                NodeId::new(2),
                &picks(&[1, 3]),
                None,
            )
            .expect("round must resolve");
        assert_eq!(outcome.simulation.target_status(), NodeStatus::Safe);
        assert!(outcome.scoring.total() > 0.0);
        assert_eq!(outcome.scoring.survival_bonus(), 100.0);
    }

    #[test]
    fn new_game_respects_the_injected_seed() {
        let engine = EngineBuilder::new()
            .with_generator(
                crate::GeneratorConfig::new().with_edge_probability(0.4),
            )
            .build()
            .expect("configuration must build");
        let mut first = rand::rngs::SmallRng::seed_from_u64(5);
        let mut second = rand::rngs::SmallRng::seed_from_u64(5);
        let a = engine.new_game_with_rng(&mut first).expect("game generates");
        let b = engine.new_game_with_rng(&mut second).expect("game generates");
        assert_eq!(a, b);
    }

    #[test]
    fn validation_failures_surface_through_the_engine() {
        let engine = EngineBuilder::new().build().expect("defaults must build");
        let graph = cycle4();
        let err = engine
            .simulate(&graph, NodeId::new(0), NodeId::new(0), &BTreeSet::new())
            .expect_err("equal endpoints must fail");
        assert_eq!(err.code(), "GRAPH_SOURCE_IS_TARGET");
    }
}

//! Classifier boundary: scoring trait, column reconciliation, and top-K
//! ranking of critical nodes.
//!
//! The concrete model family is deliberately opaque. Anything that can map
//! an aligned feature slice to a binary label and a probability implements
//! [`CriticalityScorer`]; the engine never learns more about it.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::features::FeatureVector;
use crate::graph::NodeId;

/// Default number of suggestions returned by [`rank_critical`].
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// A classifier verdict for one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Criticality {
    /// Whether the node was labeled critical.
    pub critical: bool,
    /// Probability of the critical class, in `[0, 1]`.
    pub probability: f64,
}

/// Errors raised by [`CriticalityScorer`] implementations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ScorerError {
    /// The aligned feature slice had an unexpected length.
    #[error("scorer expected {expected} features but received {got}")]
    DimensionMismatch {
        /// Length of the slice that was supplied.
        got: usize,
        /// Length the scorer was trained for.
        expected: usize,
    },
    /// The model produced a probability outside `[0, 1]` or a non-finite one.
    #[error("scorer produced invalid probability {value}")]
    InvalidProbability {
        /// The offending probability value.
        value: f64,
    },
}

/// Abstraction over a trained binary classifier.
///
/// Implementations receive feature slices already aligned to their own
/// column order (see [`align_columns`]) and return the critical-class label
/// and probability.
pub trait CriticalityScorer {
    /// Scores one aligned feature vector.
    ///
    /// # Errors
    /// Returns [`ScorerError`] when the slice length does not match the
    /// model or the model output is malformed.
    fn score(&self, features: &[f64]) -> Result<Criticality, ScorerError>;
}

/// Errors raised while ranking candidate nodes.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RankError {
    /// The expected column manifest cannot be reconciled with any extraction.
    #[error("feature schema mismatch: {reason}")]
    SchemaMismatch {
        /// Why the manifest was rejected.
        reason: String,
    },
    /// The scorer failed for a specific node.
    #[error("scoring node {node} failed: {source}")]
    Scorer {
        /// Node whose vector was being scored.
        node: NodeId,
        /// Underlying scorer failure.
        #[source]
        source: ScorerError,
    },
}

impl RankError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> RankErrorCode {
        match self {
            Self::SchemaMismatch { .. } => RankErrorCode::SchemaMismatch,
            Self::Scorer { .. } => RankErrorCode::Scorer,
        }
    }
}

/// Machine-readable error codes for [`RankError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RankErrorCode {
    /// The expected column manifest was irreconcilable.
    SchemaMismatch,
    /// The scorer failed on a node.
    Scorer,
}

impl RankErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SchemaMismatch => "RANK_SCHEMA_MISMATCH",
            Self::Scorer => "RANK_SCORER",
        }
    }
}

/// A ranked suggestion: node plus critical-class probability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Prediction {
    node_id: NodeId,
    probability: f64,
}

impl Prediction {
    /// Returns the suggested node.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node_id
    }

    /// Returns the critical-class probability.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }
}

/// Reorders a feature vector into the model's expected column order.
///
/// Columns the model expects but the extractor did not produce are filled
/// with `0.0`; extractor columns absent from the manifest are dropped. This
/// is the defensive adapter between the frozen extraction schema and
/// whatever manifest the deployed model was trained with.
///
/// # Errors
/// Returns [`RankError::SchemaMismatch`] when the manifest is empty or
/// contains duplicate column names.
pub fn align_columns(expected: &[String], vector: &FeatureVector) -> Result<Vec<f64>, RankError> {
    validate_manifest(expected)?;
    Ok(expected
        .iter()
        .map(|column| vector.value(column).unwrap_or(0.0))
        .collect())
}

fn validate_manifest(expected: &[String]) -> Result<(), RankError> {
    if expected.is_empty() {
        return Err(RankError::SchemaMismatch {
            reason: "expected column manifest is empty".to_owned(),
        });
    }
    let distinct: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
    if distinct.len() != expected.len() {
        return Err(RankError::SchemaMismatch {
            reason: "expected column manifest contains duplicates".to_owned(),
        });
    }
    Ok(())
}

/// Ranks candidate nodes by predicted criticality.
///
/// Keeps only nodes the scorer labels critical, sorts by probability
/// descending with ascending node id breaking ties, and truncates to
/// `limit` entries.
///
/// # Errors
/// Returns [`RankError::SchemaMismatch`] for an irreconcilable manifest and
/// [`RankError::Scorer`] when the scorer rejects a vector.
#[instrument(
    name = "core.rank",
    err,
    skip(features, scorer, expected_columns),
    fields(candidates = features.len(), limit = limit),
)]
pub fn rank_critical(
    features: &BTreeMap<NodeId, FeatureVector>,
    expected_columns: &[String],
    scorer: &dyn CriticalityScorer,
    limit: usize,
) -> Result<Vec<Prediction>, RankError> {
    validate_manifest(expected_columns)?;

    let mut predictions = Vec::new();
    for (&node, vector) in features {
        let aligned = align_columns(expected_columns, vector)?;
        let verdict = scorer
            .score(&aligned)
            .map_err(|source| RankError::Scorer { node, source })?;
        if verdict.critical {
            predictions.push(Prediction {
                node_id: node,
                probability: verdict.probability,
            });
        }
    }

    predictions.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    predictions.truncate(limit);
    Ok(predictions)
}

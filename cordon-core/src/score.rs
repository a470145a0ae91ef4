//! Round scoring.
//!
//! Combines the simulation's target outcome with the player's picks (and,
//! optionally, the model's picks) into a numeric score with a breakdown.
//! The function is pure and total: every valid input combination, including
//! empty pick sets, produces a score.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::NodeId;
use crate::simulate::NodeStatus;

/// Policy weights for the three scoring terms.
///
/// # Examples
/// ```
/// use cordon_core::ScoreWeights;
///
/// let weights = ScoreWeights::new().with_survival(200.0);
/// assert_eq!(weights.survival(), 200.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreWeights {
    survival: f64,
    efficiency: f64,
    overlap: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            survival: 100.0,
            efficiency: 50.0,
            overlap: 25.0,
        }
    }
}

impl ScoreWeights {
    /// Creates weights populated with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the survival-bonus weight.
    #[must_use]
    pub fn with_survival(mut self, weight: f64) -> Self {
        self.survival = weight;
        self
    }

    /// Overrides the efficiency-bonus weight.
    #[must_use]
    pub fn with_efficiency(mut self, weight: f64) -> Self {
        self.efficiency = weight;
        self
    }

    /// Overrides the model-overlap bonus weight.
    #[must_use]
    pub fn with_overlap(mut self, weight: f64) -> Self {
        self.overlap = weight;
        self
    }

    /// Returns the survival-bonus weight.
    #[must_use]
    pub fn survival(&self) -> f64 {
        self.survival
    }

    /// Returns the efficiency-bonus weight.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Returns the model-overlap bonus weight.
    #[must_use]
    pub fn overlap(&self) -> f64 {
        self.overlap
    }
}

/// A scored round with its component breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Score {
    total: f64,
    survival_bonus: f64,
    efficiency_bonus: f64,
    overlap_bonus: f64,
}

impl Score {
    /// Returns the combined score.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Returns the survival term.
    #[must_use]
    pub fn survival_bonus(&self) -> f64 {
        self.survival_bonus
    }

    /// Returns the efficiency term.
    #[must_use]
    pub fn efficiency_bonus(&self) -> f64 {
        self.efficiency_bonus
    }

    /// Returns the model-overlap term.
    #[must_use]
    pub fn overlap_bonus(&self) -> f64 {
        self.overlap_bonus
    }
}

/// Scores one round.
///
/// The survival and efficiency terms reward protecting the target with as
/// few picks as possible; the overlap term is a comparative bonus measuring
/// how closely the player's picks matched the model's suggestions, and is
/// zero whenever no model picks are supplied.
///
/// Holding the pick sets fixed, flipping `target_status` from infected to
/// safe never decreases the score.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use cordon_core::{NodeId, NodeStatus, ScoreWeights, score_round};
///
/// let picks = BTreeSet::from([NodeId::new(1), NodeId::new(3)]);
/// let score = score_round(&ScoreWeights::new(), NodeStatus::Safe, &picks, None);
/// assert!(score.total() > 100.0);
/// assert_eq!(score.overlap_bonus(), 0.0);
/// ```
#[must_use]
pub fn score_round(
    weights: &ScoreWeights,
    target_status: NodeStatus,
    user_picks: &BTreeSet<NodeId>,
    model_picks: Option<&BTreeSet<NodeId>>,
) -> Score {
    let survived = target_status == NodeStatus::Safe;

    let survival_bonus = if survived { weights.survival } else { 0.0 };

    let efficiency_bonus = if survived {
        weights.efficiency / (1.0 + user_picks.len() as f64)
    } else {
        0.0
    };

    let overlap_bonus = match model_picks {
        Some(model) if !model.is_empty() => {
            let shared = user_picks.intersection(model).count() as f64;
            weights.overlap * shared / model.len() as f64
        }
        _ => 0.0,
    };

    Score {
        total: survival_bonus + efficiency_bonus + overlap_bonus,
        survival_bonus,
        efficiency_bonus,
        overlap_bonus,
    }
}

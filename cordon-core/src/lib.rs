//! Cordon core library.
//!
//! Game engine for the containment puzzle: generate an undirected attack
//! graph with an infection source and a defended target, let the player
//! firewall a handful of nodes, propagate the infection, extract per-node
//! structural features for the criticality model, and score the round.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod codec;
mod engine;
mod features;
mod generate;
mod graph;
mod rank;
mod score;
mod simulate;

#[cfg(test)]
mod property;
#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::EngineBuilder,
    codec::{WireGame, WireGraph, WireLink, WireNode},
    engine::{Engine, EngineError, Result, RoundOutcome},
    features::{FEATURE_COLUMNS, FeatureVector, UNREACHABLE_DISTANCE, extract_features},
    generate::{GenerateError, GenerateErrorCode, GeneratorConfig, NewGame, generate,
        generate_with_rng},
    graph::{Graph, GraphError, GraphErrorCode, NodeId},
    rank::{
        Criticality, CriticalityScorer, DEFAULT_SUGGESTION_LIMIT, Prediction, RankError,
        RankErrorCode, ScorerError, align_columns, rank_critical,
    },
    score::{Score, ScoreWeights, score_round},
    simulate::{NodeStatus, PropagationResult, simulate},
};

//! Decision-forest criticality model for the cordon engine.
//!
//! Loads a serialized forest artifact and its feature-column manifest,
//! validates both, and exposes the forest through `cordon-core`'s scorer
//! trait. The model is installed once per process and queried for
//! readiness rather than reloaded.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod forest;
mod state;

pub use crate::{
    forest::{ForestClassifier, ModelError, ModelErrorCode},
    state::{LoadedModel, ModelState, current, initialize, is_ready, load_from_paths},
};

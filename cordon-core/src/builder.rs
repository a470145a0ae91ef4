//! Builder utilities for configuring the game engine.
//!
//! Validates the generation, scoring, and suggestion parameters before
//! constructing [`Engine`] instances, and installs an optional classifier.

use std::sync::Arc;

use crate::engine::{Engine, EngineError};
use crate::generate::GeneratorConfig;
use crate::rank::{CriticalityScorer, DEFAULT_SUGGESTION_LIMIT};
use crate::score::ScoreWeights;

/// Configures and constructs [`Engine`] instances.
///
/// # Examples
/// ```
/// use cordon_core::{EngineBuilder, GeneratorConfig};
///
/// let engine = EngineBuilder::new()
///     .with_generator(GeneratorConfig::new().with_edge_probability(0.3))
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(engine.suggestion_limit(), 5);
/// assert!(!engine.model_ready());
/// ```
#[derive(Clone)]
pub struct EngineBuilder {
    generator: GeneratorConfig,
    weights: ScoreWeights,
    suggestion_limit: usize,
    scorer: Option<Arc<dyn CriticalityScorer + Send + Sync>>,
    expected_columns: Vec<String>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            weights: ScoreWeights::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            scorer: None,
            expected_columns: Vec::new(),
        }
    }
}

impl EngineBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the graph-generation configuration.
    #[must_use]
    pub fn with_generator(mut self, config: GeneratorConfig) -> Self {
        self.generator = config;
        self
    }

    /// Overrides the scoring weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Overrides the maximum number of model suggestions.
    #[must_use]
    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    /// Installs a classifier together with its expected column manifest.
    ///
    /// Without this call the engine reports the model as unavailable and
    /// `predict` fails with a readiness error rather than a validation one.
    #[must_use]
    pub fn with_scorer(
        mut self,
        scorer: Arc<dyn CriticalityScorer + Send + Sync>,
        expected_columns: Vec<String>,
    ) -> Self {
        self.scorer = Some(scorer);
        self.expected_columns = expected_columns;
        self
    }

    /// Validates the configuration and constructs an [`Engine`].
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidSuggestionLimit`] when the limit is
    /// zero and [`EngineError::Generate`] when the generator configuration
    /// is inconsistent.
    pub fn build(self) -> Result<Engine, EngineError> {
        if self.suggestion_limit == 0 {
            return Err(EngineError::InvalidSuggestionLimit { got: 0 });
        }
        self.generator.validate()?;
        Ok(Engine::new(
            self.generator,
            self.weights,
            self.suggestion_limit,
            self.scorer,
            self.expected_columns,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::generate::GenerateError;

    #[test]
    fn rejects_zero_suggestion_limit() {
        let result = EngineBuilder::new().with_suggestion_limit(0).build();
        assert!(matches!(
            result,
            Err(EngineError::InvalidSuggestionLimit { got: 0 })
        ));
    }

    #[test]
    fn rejects_invalid_generator_configuration() {
        let result = EngineBuilder::new()
            .with_generator(GeneratorConfig::new().with_retry_budget(0))
            .build();
        assert!(matches!(
            result,
            Err(EngineError::Generate(GenerateError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn default_build_succeeds_without_a_model() {
        let engine = EngineBuilder::new().build().expect("defaults must build");
        assert!(!engine.model_ready());
    }
}

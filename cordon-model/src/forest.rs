//! Decision-forest classifier deserialized from a JSON artifact.
//!
//! The artifact is a list of trees. Each tree is a flat node table whose
//! entries are either an internal split or a leaf carrying the critical-class
//! probability. Prediction walks every tree from its root and averages the
//! leaf probabilities; a node is labeled critical at probability `>= 0.5`.

use serde::Deserialize;

use cordon_core::{Criticality, CriticalityScorer, ScorerError};

/// Errors raised while loading or validating a forest artifact.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A model or manifest file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to open or read.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// The artifact or manifest was not valid JSON of the expected shape.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path whose contents were rejected.
        path: String,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
    /// The artifact contained no trees, or a tree contained no nodes.
    #[error("forest artifact is empty: {reason}")]
    EmptyForest {
        /// Which part of the artifact was empty.
        reason: String,
    },
    /// A split pointed at a child index outside its tree's node table.
    #[error("tree {tree} node {node} points at out-of-range child {child}")]
    DanglingChild {
        /// Index of the offending tree.
        tree: usize,
        /// Index of the offending split node.
        node: usize,
        /// The child index that fell outside the table.
        child: usize,
    },
    /// A split referenced a feature index beyond the column manifest.
    #[error("tree {tree} node {node} uses feature {feature} but only {columns} columns exist")]
    FeatureOutOfRange {
        /// Index of the offending tree.
        tree: usize,
        /// Index of the offending split node.
        node: usize,
        /// The feature index the split referenced.
        feature: usize,
        /// Number of columns in the manifest.
        columns: usize,
    },
    /// The column manifest was empty.
    #[error("column manifest is empty")]
    EmptyColumns,
}

impl ModelError {
    /// Returns a stable, machine-readable error code for the variant.
    #[must_use]
    pub const fn code(&self) -> ModelErrorCode {
        match self {
            Self::Io { .. } => ModelErrorCode::Io,
            Self::Parse { .. } => ModelErrorCode::Parse,
            Self::EmptyForest { .. } => ModelErrorCode::EmptyForest,
            Self::DanglingChild { .. } => ModelErrorCode::DanglingChild,
            Self::FeatureOutOfRange { .. } => ModelErrorCode::FeatureOutOfRange,
            Self::EmptyColumns => ModelErrorCode::EmptyColumns,
        }
    }
}

/// Machine-readable error codes for [`ModelError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ModelErrorCode {
    /// A file could not be read.
    Io,
    /// JSON parsing failed.
    Parse,
    /// The forest or a tree was empty.
    EmptyForest,
    /// A child index fell outside its node table.
    DanglingChild,
    /// A feature index exceeded the manifest width.
    FeatureOutOfRange,
    /// The manifest named no columns.
    EmptyColumns,
}

impl ModelErrorCode {
    /// Returns the symbolic identifier for logging surfaces.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Io => "MODEL_IO",
            Self::Parse => "MODEL_PARSE",
            Self::EmptyForest => "MODEL_EMPTY_FOREST",
            Self::DanglingChild => "MODEL_DANGLING_CHILD",
            Self::FeatureOutOfRange => "MODEL_FEATURE_OUT_OF_RANGE",
            Self::EmptyColumns => "MODEL_EMPTY_COLUMNS",
        }
    }
}

/// One entry in a tree's node table.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum TreeNode {
    /// Internal split: go left when `features[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node carrying the critical-class probability.
    Leaf { probability: f64 },
}

/// A single decision tree as a flat node table rooted at index zero.
#[derive(Clone, Debug, Deserialize, PartialEq)]
struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Walks the tree for one feature slice and returns the leaf probability.
    ///
    /// Validation guarantees child indexes stay in range and strictly
    /// increase, so the walk always terminates at a leaf.
    fn probability(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { probability } => return *probability,
            }
        }
    }
}

/// Wire shape of the artifact file.
#[derive(Debug, Deserialize)]
struct ForestArtifact {
    trees: Vec<Tree>,
}

/// A validated decision forest implementing [`CriticalityScorer`].
#[derive(Clone, Debug)]
pub struct ForestClassifier {
    trees: Vec<Tree>,
    feature_count: usize,
}

impl ForestClassifier {
    /// Parses and validates an artifact against a column manifest width.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the JSON is malformed, the forest or any
    /// tree is empty, a split's children fall outside the node table or fail
    /// to advance, or a split references a feature the manifest lacks.
    pub fn from_json(artifact: &str, path: &str, feature_count: usize) -> Result<Self, ModelError> {
        if feature_count == 0 {
            return Err(ModelError::EmptyColumns);
        }
        let parsed: ForestArtifact =
            serde_json::from_str(artifact).map_err(|source| ModelError::Parse {
                path: path.to_owned(),
                source,
            })?;
        let classifier = Self {
            trees: parsed.trees,
            feature_count,
        };
        classifier.validate()?;
        Ok(classifier)
    }

    /// Returns the number of feature columns the forest was trained for.
    #[must_use]
    #[rustfmt::skip]
    pub const fn feature_count(&self) -> usize { self.feature_count }

    /// Returns the number of trees in the forest.
    #[must_use]
    #[rustfmt::skip]
    pub fn tree_count(&self) -> usize { self.trees.len() }

    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::EmptyForest {
                reason: "no trees".to_owned(),
            });
        }
        for (tree_index, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::EmptyForest {
                    reason: format!("tree {tree_index} has no nodes"),
                });
            }
            for (node_index, node) in tree.nodes.iter().enumerate() {
                let TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } = node
                else {
                    continue;
                };
                for &child in [left, right] {
                    // Children must advance so every walk terminates.
                    if child >= tree.nodes.len() || child <= node_index {
                        return Err(ModelError::DanglingChild {
                            tree: tree_index,
                            node: node_index,
                            child,
                        });
                    }
                }
                if *feature >= self.feature_count {
                    return Err(ModelError::FeatureOutOfRange {
                        tree: tree_index,
                        node: node_index,
                        feature: *feature,
                        columns: self.feature_count,
                    });
                }
            }
        }
        Ok(())
    }
}

impl CriticalityScorer for ForestClassifier {
    fn score(&self, features: &[f64]) -> Result<Criticality, ScorerError> {
        if features.len() != self.feature_count {
            return Err(ScorerError::DimensionMismatch {
                got: features.len(),
                expected: self.feature_count,
            });
        }
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.probability(features))
            .sum();
        let probability = total / self.trees.len() as f64;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScorerError::InvalidProbability { value: probability });
        }
        Ok(Criticality {
            critical: probability >= 0.5,
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64, low: f64, high: f64) -> String {
        format!(
            concat!(
                r#"{{"trees":[{{"nodes":["#,
                r#"{{"feature":0,"threshold":{},"left":1,"right":2}},"#,
                r#"{{"probability":{}}},{{"probability":{}}}]}}]}}"#,
            ),
            threshold, low, high,
        )
    }

    #[test]
    fn stump_routes_on_the_threshold() {
        let classifier =
            ForestClassifier::from_json(&stump(2.0, 0.1, 0.9), "model.json", 6).unwrap();
        let mut features = [0.0; 6];
        features[0] = 1.0;
        let low = classifier.score(&features).unwrap();
        assert!(!low.critical);
        assert!((low.probability - 0.1).abs() < 1e-12);

        features[0] = 3.0;
        let high = classifier.score(&features).unwrap();
        assert!(high.critical);
        assert!((high.probability - 0.9).abs() < 1e-12);
    }

    #[test]
    fn forest_averages_tree_probabilities() {
        let artifact = r#"{"trees":[
            {"nodes":[{"probability":0.2}]},
            {"nodes":[{"probability":0.8}]}
        ]}"#;
        let classifier = ForestClassifier::from_json(artifact, "model.json", 6).unwrap();
        let verdict = classifier.score(&[0.0; 6]).unwrap();
        assert!(verdict.critical);
        assert!((verdict.probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_forest_is_rejected_at_load() {
        let err = ForestClassifier::from_json(r#"{"trees":[]}"#, "model.json", 6).unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::EmptyForest);
    }

    #[test]
    fn dangling_child_is_rejected_at_load() {
        let artifact = r#"{"trees":[{"nodes":[
            {"feature":0,"threshold":1.0,"left":1,"right":7},
            {"probability":0.5}
        ]}]}"#;
        let err = ForestClassifier::from_json(artifact, "model.json", 6).unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::DanglingChild);
    }

    #[test]
    fn backward_child_is_rejected_at_load() {
        let artifact = r#"{"trees":[{"nodes":[
            {"feature":0,"threshold":1.0,"left":0,"right":1},
            {"probability":0.5}
        ]}]}"#;
        let err = ForestClassifier::from_json(artifact, "model.json", 6).unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::DanglingChild);
    }

    #[test]
    fn out_of_range_feature_is_rejected_at_load() {
        let artifact = r#"{"trees":[{"nodes":[
            {"feature":9,"threshold":1.0,"left":1,"right":2},
            {"probability":0.1},
            {"probability":0.9}
        ]}]}"#;
        let err = ForestClassifier::from_json(artifact, "model.json", 6).unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::FeatureOutOfRange);
    }

    #[test]
    fn dimension_mismatch_is_a_scorer_error() {
        let classifier =
            ForestClassifier::from_json(&stump(2.0, 0.1, 0.9), "model.json", 6).unwrap();
        let err = classifier.score(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ScorerError::DimensionMismatch {
                got: 2,
                expected: 6
            }
        );
    }
}

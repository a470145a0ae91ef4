//! Process-wide model lifecycle.
//!
//! The classifier and its column manifest are loaded at most once per
//! process. The state moves from uninitialized to either loaded or
//! unavailable and never re-attempts loading; callers query readiness
//! instead of retrying.

use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::forest::{ForestClassifier, ModelError};

/// A classifier paired with the column order it was trained on.
#[derive(Clone, Debug)]
pub struct LoadedModel {
    classifier: Arc<ForestClassifier>,
    columns: Vec<String>,
}

impl LoadedModel {
    /// Returns the classifier as a shared scorer handle.
    #[must_use]
    pub fn classifier(&self) -> Arc<ForestClassifier> {
        Arc::clone(&self.classifier)
    }

    /// Returns the feature columns in training order.
    #[must_use]
    #[rustfmt::skip]
    pub fn columns(&self) -> &[String] { &self.columns }
}

/// Reads and validates an artifact and manifest pair from disk.
///
/// # Errors
/// Returns [`ModelError`] when either file cannot be read, parses to the
/// wrong shape, the manifest is empty, or the forest fails validation.
pub fn load_from_paths(artifact: &Path, manifest: &Path) -> Result<LoadedModel, ModelError> {
    let columns = read_manifest(manifest)?;
    let raw = fs::read_to_string(artifact).map_err(|source| ModelError::Io {
        path: artifact.display().to_string(),
        source,
    })?;
    let classifier = ForestClassifier::from_json(
        &raw,
        &artifact.display().to_string(),
        columns.len(),
    )?;
    info!(
        trees = classifier.tree_count(),
        columns = columns.len(),
        "model loaded",
    );
    Ok(LoadedModel {
        classifier: Arc::new(classifier),
        columns,
    })
}

fn read_manifest(manifest: &Path) -> Result<Vec<String>, ModelError> {
    let raw = fs::read_to_string(manifest).map_err(|source| ModelError::Io {
        path: manifest.display().to_string(),
        source,
    })?;
    let columns: Vec<String> =
        serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: manifest.display().to_string(),
            source,
        })?;
    if columns.is_empty() {
        return Err(ModelError::EmptyColumns);
    }
    Ok(columns)
}

/// Terminal states of the process-wide model slot.
#[derive(Clone, Debug)]
pub enum ModelState {
    /// The artifact and manifest loaded and validated.
    Loaded(LoadedModel),
    /// Loading failed; the reason is kept for diagnostics.
    Unavailable(String),
}

static MODEL: OnceLock<ModelState> = OnceLock::new();

/// Loads the model into the process-wide slot, once.
///
/// The first call wins; later calls return the already-settled state
/// without touching the filesystem again.
pub fn initialize(artifact: &Path, manifest: &Path) -> &'static ModelState {
    MODEL.get_or_init(|| match load_from_paths(artifact, manifest) {
        Ok(model) => ModelState::Loaded(model),
        Err(err) => {
            warn!(code = err.code().as_str(), error = %err, "model unavailable");
            ModelState::Unavailable(err.to_string())
        }
    })
}

/// Returns the settled model state, or `None` before [`initialize`] ran.
#[must_use]
pub fn current() -> Option<&'static ModelState> {
    MODEL.get()
}

/// Reports whether a usable model is installed.
#[must_use]
pub fn is_ready() -> bool {
    matches!(MODEL.get(), Some(ModelState::Loaded(_)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::forest::ModelErrorCode;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const COLUMNS: &str = r#"["degree","dist_to_source","dist_to_target",
        "on_shortest_path","betweenness","cuts_source_target"]"#;

    #[test]
    fn loads_a_valid_pair() {
        let artifact = write_file(r#"{"trees":[{"nodes":[{"probability":0.7}]}]}"#);
        let manifest = write_file(COLUMNS);
        let model = load_from_paths(artifact.path(), manifest.path()).unwrap();
        assert_eq!(model.columns().len(), 6);
        assert_eq!(model.classifier().feature_count(), 6);
    }

    // The process-wide slot settles once, so one test owns the whole
    // lifecycle: install, query, and the no-reload guarantee.
    #[test]
    fn initialize_settles_the_slot_and_answers_readiness() {
        let artifact = write_file(r#"{"trees":[{"nodes":[{"probability":0.7}]}]}"#);
        let manifest = write_file(COLUMNS);

        let state = initialize(artifact.path(), manifest.path());
        let ModelState::Loaded(model) = state else {
            panic!("valid pair must settle as loaded");
        };
        assert_eq!(model.columns().len(), 6);
        assert!(is_ready());
        assert!(matches!(current(), Some(ModelState::Loaded(_))));

        // Later calls return the settled state without touching the paths.
        let resettled = initialize(
            Path::new("/nonexistent/model.json"),
            Path::new("/nonexistent/columns.json"),
        );
        assert!(matches!(resettled, ModelState::Loaded(_)));
        assert!(is_ready());
    }

    #[test]
    fn missing_artifact_is_an_io_error() {
        let manifest = write_file(COLUMNS);
        let err = load_from_paths(Path::new("/nonexistent/model.json"), manifest.path())
            .unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::Io);
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let artifact = write_file(r#"{"trees":[{"nodes":[{"probability":0.7}]}]}"#);
        let manifest = write_file("[]");
        let err = load_from_paths(artifact.path(), manifest.path()).unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::EmptyColumns);
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let artifact = write_file(r#"{"trees":[{"nodes":[{"probability":0.7}]}]}"#);
        let manifest = write_file(r#"{"not":"a list"}"#);
        let err = load_from_paths(artifact.path(), manifest.path()).unwrap_err();
        assert_eq!(err.code(), ModelErrorCode::Parse);
    }
}

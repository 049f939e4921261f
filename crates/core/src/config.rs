//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core services, so no environment variable is ever read during request
//! handling. The transport layer turns its environment into a `CoreConfig`
//! and hands it over.

use crate::constants::DEFAULT_ARTIFACT_DIR;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    artifact_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(artifact_dir: PathBuf) -> Self {
        Self { artifact_dir }
    }

    /// Root directory handed to the artifact store.
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}

/// Resolve the artifact directory without reading environment variables.
///
/// Falls back to [`DEFAULT_ARTIFACT_DIR`] relative to the working directory
/// when no override is given.
pub fn resolve_artifact_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR))
}

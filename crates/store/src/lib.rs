//! Depot Artifact Storage
//!
//! This crate provides the filesystem-backed artifact store for Depot.
//!
//! ## Storage Model
//!
//! - A store owns exactly one root directory; no other component touches the
//!   filesystem directly
//! - The layout is flat: every direct file child of the root is one artifact
//! - The filename is the only index; no manifest or metadata file is kept
//!   beside the artifacts
//! - Artifacts are whole byte blobs: created, fully overwritten, or removed,
//!   never partially mutated
//!
//! ## Path Confinement
//!
//! Every artifact name is checked before any filesystem access. Names that
//! are empty, contain a parent-directory sequence, or contain a path
//! separator are rejected, so all resolved paths stay inside the configured
//! root.
//!
//! ## Example Usage
//!
//! ```no_run
//! use depot_store::ArtifactStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ArtifactStore::open(Path::new("artifact_data"))?;
//! store.put("inv_person_2021-07-04.json", b"[]")?;
//! # Ok(())
//! # }
//! ```

mod store;

pub use store::ArtifactStore;

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store root could not be created or resolved at construction time
    #[error("invalid store root: {0}")]
    InvalidRoot(String),

    /// Artifact name would escape the store root (traversal or separator)
    #[error("unsafe artifact name: {0}")]
    PathViolation(String),

    /// An artifact with this name already exists and `put` refuses overwrite
    #[error("artifact {0} already exists in the store")]
    AlreadyExists(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! # Depot Core
//!
//! Core business logic for the Depot upload/conversion service.
//!
//! This crate contains the validation-and-conversion pipeline:
//! - Filename grammar parsing into [`name::ArtifactName`] (owner, kind, date,
//!   extension)
//! - Record transcoding between XML uploads and normalized JSON artifacts
//! - The [`ingest::IngestPipeline`] orchestrating validation, conversion, and
//!   persistence through `depot_store::ArtifactStore`
//!
//! **No API concerns**: HTTP routing, multipart decoding, and response
//! envelopes belong in `api-rest`. The core never logs; every operation
//! returns a structured outcome so the caller decides user-visible messaging.

pub mod codec;
pub mod config;
mod constants;
pub mod ingest;
pub mod name;

pub use constants::{DEFAULT_ARTIFACT_DIR, JSON_EXTENSION, XML_EXTENSION};
pub use depot_store::{ArtifactStore, StoreError};

/// Errors that can occur in the validation-and-conversion pipeline
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Filename contains a parent-directory sequence; always fatal to the
    /// call, never silently corrected
    #[error("filename contains an invalid path sequence: {0}")]
    PathTraversal(String),

    /// Filename does not match the naming convention; a normal reported
    /// outcome, no artifact is produced
    #[error("filename does not match the naming convention: {0}")]
    InvalidName(String),

    /// XML document could not be parsed at all
    #[error("malformed XML document: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML input carried no root element
    #[error("XML document contains no root element")]
    MissingRoot,

    /// A required record field was absent
    #[error("record {index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// A record field was present but could not be parsed
    #[error("record {index}: field `{field}` has invalid value `{value}`")]
    InvalidFieldValue {
        index: usize,
        field: &'static str,
        value: String,
    },

    /// JSON encoding of the converted records failed
    #[error("failed to encode records as JSON: {0}")]
    JsonEncode(#[from] serde_json::Error),

    /// Storage error from the artifact store
    #[error(transparent)]
    Store(#[from] depot_store::StoreError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

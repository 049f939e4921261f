//! Upload ingest pipeline.
//!
//! [`IngestPipeline`] turns an incoming XML upload into a stored JSON
//! artifact: it validates the original filename against the naming
//! convention, transcodes the records, derives the stored name by swapping
//! the final extension, and persists through the artifact store. Read, list,
//! and delete traffic goes straight to the store; only ingest passes through
//! here.

use crate::codec;
use crate::constants::{JSON_EXTENSION, XML_EXTENSION};
use crate::name::ArtifactName;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use depot_store::ArtifactStore;

/// How the converted artifact is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// `put`: fail with a storage conflict if the name already exists
    Create,
    /// `replace`: overwrite unconditionally, creating if absent
    Overwrite,
}

/// Descriptor of a successfully ingested artifact.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct IngestReceipt {
    /// Name the converted artifact was stored under
    pub stored_name: String,

    /// Size of the converted JSON body in bytes
    pub size_bytes: u64,

    /// UTC timestamp of the ingest
    pub stored_at: DateTime<Utc>,
}

/// Orchestrates filename validation, conversion, and persistence.
///
/// The pipeline owns its store; collaborators that only read, list, or
/// delete borrow it through [`IngestPipeline::store`].
#[derive(Debug)]
pub struct IngestPipeline {
    store: ArtifactStore,
}

impl IngestPipeline {
    /// Creates a pipeline persisting into `store`.
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Returns the underlying artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Converts an XML upload into a stored JSON artifact.
    ///
    /// The original name must validate against the naming convention and
    /// carry the XML extension; the stored name substitutes only that final
    /// extension with `json`, leaving every other character verbatim. The
    /// JSON body is fully encoded in memory before the write, so a failed
    /// conversion never leaves a partial artifact behind.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::PathTraversal` for unsafe names,
    /// `CoreError::InvalidName` for grammar or extension mismatches (a
    /// normal reported outcome, not a fault), codec errors for malformed
    /// content, and `CoreError::Store` for persistence failures, including
    /// the conflict when `WriteMode::Create` hits an existing name.
    pub fn ingest(
        &self,
        original_name: &str,
        xml: &[u8],
        mode: WriteMode,
    ) -> CoreResult<IngestReceipt> {
        let parsed = ArtifactName::parse(original_name)?;

        if parsed.extension() != XML_EXTENSION {
            return Err(CoreError::InvalidName(original_name.to_owned()));
        }

        let records = codec::decode(xml)?;
        let json = codec::encode(&records)?;

        // Substitute only the final extension; the stem stays verbatim
        let stem = &original_name[..original_name.len() - parsed.extension().len()];
        let stored_name = format!("{stem}{JSON_EXTENSION}");

        match mode {
            WriteMode::Create => self.store.put(&stored_name, &json)?,
            WriteMode::Overwrite => self.store.replace(&stored_name, &json)?,
        }

        Ok(IngestReceipt {
            stored_name,
            size_bytes: json.len() as u64,
            stored_at: Utc::now(),
        })
    }
}

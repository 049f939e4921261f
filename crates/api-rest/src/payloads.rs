//! Response payloads for the REST API.

use serde::Serialize;
use utoipa::ToSchema;

/// Body returned after a successful upload or replace.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadFileResponse {
    /// Name the converted artifact was stored under
    pub file_name: String,
    /// Relative URI the artifact can be downloaded from
    pub file_download_uri: String,
    /// Content type of the stored artifact
    pub file_type: String,
    /// Size of the stored artifact in bytes
    pub size_bytes: u64,
}

/// One entry in a file listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileInfo {
    pub file_name: String,
    pub file_download_uri: String,
}

/// Health probe response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

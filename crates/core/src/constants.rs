//! Constants shared across the core pipeline.

/// Final extension marking an upload as convertible.
pub const XML_EXTENSION: &str = "xml";

/// Final extension carried by converted artifacts.
pub const JSON_EXTENSION: &str = "json";

/// Default artifact store root, relative to the working directory.
pub const DEFAULT_ARTIFACT_DIR: &str = "artifact_data";

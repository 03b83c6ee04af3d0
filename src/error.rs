/// Crate-level error types for mdaccess diagnostics.
use std::path::PathBuf;

/// Every error names the file, service, or payload field that failed so a
/// diagnostic can be produced without a debugger. Per-file review errors are
/// folded into the report; the rest abort the command.
#[allow(clippy::error_impl_error, reason = "crate-wide error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An explicitly requested config file does not exist on disk.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// A config value is outside its accepted range.
    #[error("invalid config: `{key}` {reason}")]
    InvalidConfig {
        /// Config key that was rejected.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Input file (diff, markdown, or rules) does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The judgment service replied, but never with parseable JSON.
    #[error("judge reply was not valid JSON after {attempts} attempts")]
    InvalidJudgeReply {
        /// Number of calls made before giving up.
        attempts: u32,
    },

    /// The judgment service could not be reached or returned an error status.
    #[error("judge request failed ({status}): {message}")]
    JudgeRequest {
        /// HTTP status, or 0 when no response was received.
        status: u16,
        /// Response body or transport error text.
        message: String,
    },

    /// The judgment service answered with an unexpected envelope.
    #[error("judge response malformed: {reason}")]
    JudgeResponse {
        /// Description of what was missing or wrong.
        reason: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// No API key was configured for the judgment service.
    #[error("missing API key for {service}")]
    MissingApiKey {
        /// Endpoint that needed the key.
        service: String,
    },

    /// A judge payload could not be reconciled with the review schema.
    #[error("schema validation failed: {reason}")]
    SchemaValidation {
        /// The field and rule that failed.
        reason: String,
    },

    /// A judge payload declared a schema version this build does not speak.
    #[error("unsupported schema version {found} (expected {expected})")]
    SchemaVersion {
        /// Version this build accepts.
        expected: u32,
        /// Version declared by the payload.
        found: u64,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}

impl Error {
    /// Shorthand for a schema validation failure.
    pub fn schema(reason: impl Into<String>) -> Self {
        return Self::SchemaValidation { reason: reason.into() };
    }
}

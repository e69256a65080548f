//! Error types for contract construction, validation, and serialization.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;

/// Errors that can occur while building, validating, or (de)serializing
/// contracts, chunks, and their documents.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A referenced file type id has no registry entry.
    #[error("File type '{0}' is not registered")]
    FileTypeNotFound(String),

    /// A task id does not match `<namespace>.tasks.<name>`.
    #[error("Invalid task id '{0}': expected <namespace>.tasks.<name>")]
    InvalidTaskId(String),

    /// An option id does not match `<namespace>.task_options.<name>`.
    #[error("Invalid option id '{0}': expected <namespace>.task_options.<name>")]
    InvalidOptionId(String),

    /// An option value or default does not match the declared schema type.
    #[error("Option '{option_id}' expected {expected}, got {actual}")]
    OptionTypeMismatch {
        /// Fully-qualified option id.
        option_id: String,
        /// Declared schema type tag.
        expected: String,
        /// Type tag of the offending value.
        actual: String,
    },

    /// An option schema document carries an unrecognized type tag.
    #[error("Option '{option_id}' has unknown type tag '{type_tag}'")]
    UnknownOptionType {
        /// Fully-qualified option id.
        option_id: String,
        /// The unrecognized tag.
        type_tag: String,
    },

    /// A choice option value is not a member of its allowed set.
    #[error("Option '{option_id}' value {value} is not in the allowed choice set")]
    ChoiceNotAllowed {
        /// Fully-qualified option id.
        option_id: String,
        /// Display form of the rejected value.
        value: String,
    },

    /// A contract failed structural validation at serialization time.
    #[error("Malformed contract '{task_id}': {reason}")]
    MalformedContract {
        /// Task id of the offending contract.
        task_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A symbolic field held something other than an integer or its symbol.
    #[error("Invalid '{field}' value {value}: expected a non-negative integer or \"{symbol}\"")]
    InvalidSymbol {
        /// Document field name.
        field: String,
        /// The offending JSON value.
        value: String,
        /// The symbol accepted for this field.
        symbol: String,
    },

    /// A requested resource type tag is outside the closed supported set.
    #[error("Unsupported resource type '{0}': expected $tmpdir, $tmpfile, or $logfile")]
    UnsupportedResourceType(String),

    /// A chunk id collides with the reserved chunk-key namespace.
    #[error("Malformed chunk id '{0}': chunk ids must not start with '$chunk.'")]
    MalformedChunkId(String),

    /// A metadata key tried to use the reserved chunk-key prefix.
    #[error("Metadata key '{0}' must not start with '$chunk.'")]
    ReservedChunkKey(String),

    /// A gather operation could not find its required key in a chunk.
    #[error("Chunk '{chunk_id}' is missing required chunk key '{key}'")]
    MissingChunkKey {
        /// Id of the chunk missing the key.
        chunk_id: String,
        /// The chunk key that was required.
        key: String,
    },

    /// A document failed to parse or serialize.
    #[error("Document error: {0}")]
    Document(#[from] serde_json::Error),

    /// Filesystem error while reading or writing a document.
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

//! Error types for contract resolution.

use thiserror::Error;

use rivet_contract::{ContractError, TaskKind};

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Errors that can occur while resolving a tool contract.
///
/// Resolution is all-or-nothing: any of these aborts the call and no partial
/// resolved contract is produced.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The number of supplied input paths does not match the contract's
    /// declared input slot count.
    #[error("Incompatible inputs: supplied {supplied} paths, contract '{task_id}' expects {expected}")]
    IncompatibleInputs {
        /// Task id of the contract being resolved.
        task_id: String,
        /// Number of paths the caller supplied.
        supplied: usize,
        /// Number of input slots the contract declares.
        expected: usize,
    },

    /// An option override or default failed type checking.
    #[error("Failed to resolve option '{option_id}': {source}")]
    OptionResolve {
        /// Fully-qualified option id.
        option_id: String,
        /// The underlying schema-type error.
        #[source]
        source: ContractError,
    },

    /// A scatter/gather entry point was called against the wrong task kind.
    #[error("Cannot resolve a {actual} task through the {expected} entry point")]
    WrongTaskKind {
        /// Kind the entry point handles.
        expected: TaskKind,
        /// Kind the contract actually declares.
        actual: TaskKind,
    },

    /// An error from the contract model, e.g. an unregistered file type id.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

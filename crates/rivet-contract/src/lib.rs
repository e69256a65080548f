//! Data models for Rivet's contract-based task description protocol.
//!
//! A *tool contract* is the declarative, unresolved description of a task:
//! typed input/output file slots, option schemas, a processor-count symbol,
//! and requested resources. A *resolved tool contract* is its concrete,
//! executable counterpart, produced by the `rivet-resolver` crate: literal
//! paths, literal option values, a literal processor count, and materialized
//! resource paths.
//!
//! ```text
//! ToolContract ──(rivet-resolver)──▶ ResolvedToolContract
//!      │                                    │
//!      ▼                                    ▼
//! tool contract document          resolved tool contract document
//! ```
//!
//! Scatter/gather tasks additionally produce and consume [`PipelineChunk`]
//! lists, one chunk per shard of a scattered workflow.

pub mod chunk;
pub mod contract;
pub mod document;
pub mod error;
pub mod filetype;
pub mod io;
pub mod option;
pub mod resolved;

pub use chunk::{CHUNK_KEY_PREFIX, ChunkDocument, PipelineChunk, gather_chunk_values};
pub use contract::{
    DefaultName, Driver, InputFileType, IntOrSymbol, OutputFileType, ResourceType,
    SYMBOL_MAX_NCHUNKS, SYMBOL_MAX_NPROC, TaskDetail, TaskKind, ToolContract, ToolContractTask,
    validate_task_id,
};
pub use document::{
    InputTypeDocument, OptionDocument, OutputTypeDocument, ResolvedTaskDocument,
    ResolvedToolContractDocument, TaskDocument, ToolContractDocument,
};
pub use error::{ContractError, Result};
pub use filetype::{FileType, FileTypeRegistry, file_types};
pub use io::{
    load_pipeline_chunks, load_resolved_tool_contract, load_tool_contract, write_pipeline_chunks,
    write_resolved_tool_contract, write_tool_contract,
};
pub use option::{OptionType, OptionValue, TaskOption, validate_option_id};
pub use resolved::{
    ResolvedResource, ResolvedTaskDetail, ResolvedToolContract, ResolvedToolContractTask,
};

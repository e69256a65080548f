//! The resolved tool contract model: the concrete, executable counterpart of
//! a tool contract, with file-type slots replaced by literal paths, options
//! by literal values, and symbols by literal integers.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::contract::{Driver, ResourceType, TaskKind};
use crate::option::OptionValue;

/// A materialized resource: its type plus the literal path synthesized for it.
///
/// The path is synthesized by resolution but only created on disk by the
/// executing tool at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
    /// Resource type tag.
    pub resource_type: ResourceType,
    /// Literal path for the resource.
    pub path: PathBuf,
}

/// Scatter/gather-specific resolved fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedTaskDetail {
    /// Plain task.
    Standard,
    /// Scatter task with its resolved chunk ceiling and keys.
    Scatter {
        /// Literal max chunk count.
        max_nchunks: u32,
        /// Chunk keys the task will populate.
        chunk_keys: Vec<String>,
    },
    /// Gather task with the chunk key it will read.
    Gather {
        /// The `$chunk.`-prefixed key consumed from each chunk.
        chunk_key: String,
    },
}

impl ResolvedTaskDetail {
    /// The task-type tag for this detail.
    pub fn kind(&self) -> TaskKind {
        match self {
            ResolvedTaskDetail::Standard => TaskKind::Standard,
            ResolvedTaskDetail::Scatter { .. } => TaskKind::Scattered,
            ResolvedTaskDetail::Gather { .. } => TaskKind::Gathered,
        }
    }
}

/// The concrete, fully-bound description of one task invocation.
///
/// Created atomically by resolution and never mutated; every option id
/// declared by the source contract appears in `options` with a type-checked
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToolContractTask {
    /// Task id, same as the source contract.
    pub task_id: String,
    /// Copied from the source contract.
    pub is_distributed: bool,
    /// Literal input paths, same length and order as the declared input slots.
    pub input_files: Vec<PathBuf>,
    /// Literal output paths, same length and order as the declared output slots.
    pub output_files: Vec<PathBuf>,
    /// Fully-populated option map, keyed by option id.
    pub options: BTreeMap<String, OptionValue>,
    /// Literal processor count.
    pub nproc: u32,
    /// Materialized resources, in declared order.
    pub resources: Vec<ResolvedResource>,
    /// Scatter/gather-specific fields.
    pub detail: ResolvedTaskDetail,
}

impl ResolvedToolContractTask {
    /// Task-type tag.
    pub fn kind(&self) -> TaskKind {
        self.detail.kind()
    }
}

/// A resolved task paired with the driver copied from its source contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToolContract {
    /// The concrete task description.
    pub task: ResolvedToolContractTask,
    /// The driver, carried over unchanged from the source contract.
    pub driver: Driver,
}

impl ResolvedToolContract {
    /// Pair a resolved task with its driver.
    pub fn new(task: ResolvedToolContractTask, driver: Driver) -> Self {
        Self { task, driver }
    }
}

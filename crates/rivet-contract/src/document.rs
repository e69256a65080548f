//! Wire shapes for contract, resolved-contract, and option documents, plus
//! the conversions between them and the typed models.
//!
//! The document structs mirror the persisted JSON layout field-for-field and
//! stay deliberately loose (raw JSON values for symbolic fields, string tags
//! for resource types); all tightening into the typed models happens in the
//! conversion functions, which is where inconsistent documents are rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::{
    DefaultName, Driver, IntOrSymbol, ResourceType, SYMBOL_MAX_NCHUNKS, SYMBOL_MAX_NPROC,
    TaskDetail, TaskKind, ToolContract, ToolContractTask,
};
use crate::error::{ContractError, Result};
use crate::option::{OptionType, OptionValue, TaskOption};
use crate::resolved::{
    ResolvedResource, ResolvedTaskDetail, ResolvedToolContract, ResolvedToolContractTask,
};

/// Top-level tool contract document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContractDocument {
    /// Semantic version of the task.
    pub version: String,
    /// Task id.
    pub tool_contract_id: String,
    /// Driver descriptor.
    pub driver: Driver,
    /// The task body.
    pub tool_contract: TaskDocument,
}

/// The nested `tool_contract` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDocument {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Standard/scattered/gathered tag.
    pub task_type: TaskKind,
    /// Whether the task may be distributed.
    pub is_distributed: bool,
    /// Input slot descriptors, in declared order.
    pub input_types: Vec<InputTypeDocument>,
    /// Output slot descriptors, in declared order.
    pub output_types: Vec<OutputTypeDocument>,
    /// Option schema documents, in declared order.
    pub schema_options: Vec<OptionDocument>,
    /// Literal int or the `$max_nproc` symbol.
    pub nproc: Value,
    /// Resource type tags, in declared order.
    pub resource_types: Vec<String>,
    /// Chunk keys a scatter task will populate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunk_keys: Vec<String>,
    /// Literal int or the `$max_nchunks` symbol (scatter only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nchunks: Option<Value>,
    /// The chunk key a gather task consumes (gather only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_key: Option<String>,
}

/// One entry of `input_types`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTypeDocument {
    /// File type id.
    pub file_type_id: String,
    /// Slot label.
    pub id: String,
    /// Display name.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// One entry of `output_types`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTypeDocument {
    /// File type id.
    pub file_type_id: String,
    /// Slot label.
    pub id: String,
    /// Display name.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Default output name: a plain string or a `[base, ext]` pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_name: Option<DefaultName>,
}

/// One entry of `schema_options`, in the canonical JSON-Schema-like shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDocument {
    /// Fully-qualified option id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Type tag: `integer`, `number`, `string`, `boolean`, or a `choice_*`
    /// variant.
    #[serde(rename = "type")]
    pub option_type: String,
    /// Default value.
    pub default: OptionValue,
    /// Allowed values for choice types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<OptionValue>>,
}

impl From<&TaskOption> for OptionDocument {
    fn from(option: &TaskOption) -> Self {
        Self {
            id: option.option_id().to_string(),
            name: option.name().to_string(),
            description: option.description().to_string(),
            option_type: option.option_type().type_tag().to_string(),
            default: option.default().clone(),
            choices: option.option_type().choices(),
        }
    }
}

impl TryFrom<OptionDocument> for TaskOption {
    type Error = ContractError;

    fn try_from(doc: OptionDocument) -> Result<Self> {
        let choices = doc.choices.unwrap_or_default();
        let option_type = match doc.option_type.as_str() {
            "integer" => OptionType::Int,
            // Legacy documents spell number-typed options "float".
            "number" | "float" => OptionType::Float,
            "string" => OptionType::Str,
            "boolean" => OptionType::Bool,
            "choice_integer" => OptionType::ChoiceInt(typed_choices(&doc.id, choices, "integer")?),
            "choice_number" | "choice_float" => {
                OptionType::ChoiceFloat(typed_float_choices(&doc.id, choices)?)
            }
            "choice_string" => OptionType::ChoiceStr(typed_str_choices(&doc.id, choices)?),
            other => {
                return Err(ContractError::UnknownOptionType {
                    option_id: doc.id,
                    type_tag: other.to_string(),
                });
            }
        };
        // Reconstruction revalidates the default against the declared type
        // and choice set, rejecting inconsistent documents.
        TaskOption::new(doc.id, doc.name, doc.description, option_type, doc.default)
    }
}

fn typed_choices(option_id: &str, choices: Vec<OptionValue>, expected: &str) -> Result<Vec<i64>> {
    choices
        .into_iter()
        .map(|v| match v {
            OptionValue::Int(i) => Ok(i),
            other => Err(ContractError::OptionTypeMismatch {
                option_id: option_id.to_string(),
                expected: expected.to_string(),
                actual: other.type_tag().to_string(),
            }),
        })
        .collect()
}

fn typed_float_choices(option_id: &str, choices: Vec<OptionValue>) -> Result<Vec<f64>> {
    choices
        .into_iter()
        .map(|v| match v {
            OptionValue::Float(f) => Ok(f),
            OptionValue::Int(i) => Ok(i as f64),
            other => Err(ContractError::OptionTypeMismatch {
                option_id: option_id.to_string(),
                expected: "number".to_string(),
                actual: other.type_tag().to_string(),
            }),
        })
        .collect()
}

fn typed_str_choices(option_id: &str, choices: Vec<OptionValue>) -> Result<Vec<String>> {
    choices
        .into_iter()
        .map(|v| match v {
            OptionValue::Str(s) => Ok(s),
            other => Err(ContractError::OptionTypeMismatch {
                option_id: option_id.to_string(),
                expected: "string".to_string(),
                actual: other.type_tag().to_string(),
            }),
        })
        .collect()
}

impl ToolContract {
    /// Serialize to the document shape.
    ///
    /// Fails with [`ContractError::MalformedContract`] when the contract
    /// declares zero input or zero output file types; the builders stay
    /// permissive and this is the enforcement point before publication.
    pub fn to_document(&self) -> Result<ToolContractDocument> {
        let task = &self.task;
        if task.input_file_types().is_empty() {
            return Err(ContractError::MalformedContract {
                task_id: task.task_id().to_string(),
                reason: "contract declares no input file types".to_string(),
            });
        }
        if task.output_file_types().is_empty() {
            return Err(ContractError::MalformedContract {
                task_id: task.task_id().to_string(),
                reason: "contract declares no output file types".to_string(),
            });
        }

        let (chunk_keys, max_nchunks, chunk_key) = match task.detail() {
            TaskDetail::Standard => (Vec::new(), None, None),
            TaskDetail::Scatter {
                chunk_keys,
                max_nchunks,
            } => (
                chunk_keys.clone(),
                Some(max_nchunks.to_json(SYMBOL_MAX_NCHUNKS)),
                None,
            ),
            TaskDetail::Gather { chunk_key } => (Vec::new(), None, Some(chunk_key.clone())),
        };

        Ok(ToolContractDocument {
            version: task.version.clone(),
            tool_contract_id: task.task_id().to_string(),
            driver: self.driver.clone(),
            tool_contract: TaskDocument {
                name: task.name.clone(),
                description: task.description.clone(),
                task_type: task.kind(),
                is_distributed: task.is_distributed,
                input_types: task
                    .input_file_types()
                    .iter()
                    .map(|t| InputTypeDocument {
                        file_type_id: t.file_type_id.clone(),
                        id: t.label.clone(),
                        title: t.display_name.clone(),
                        description: t.description.clone(),
                    })
                    .collect(),
                output_types: task
                    .output_file_types()
                    .iter()
                    .map(|t| OutputTypeDocument {
                        file_type_id: t.file_type_id.clone(),
                        id: t.label.clone(),
                        title: t.display_name.clone(),
                        description: t.description.clone(),
                        default_name: t.default_name.clone(),
                    })
                    .collect(),
                schema_options: task.options().iter().map(OptionDocument::from).collect(),
                nproc: task.nproc.to_json(SYMBOL_MAX_NPROC),
                resource_types: task
                    .resource_types()
                    .iter()
                    .map(|r| r.as_tag().to_string())
                    .collect(),
                chunk_keys,
                max_nchunks,
                chunk_key,
            },
        })
    }

    /// Reconstruct a contract from its document shape; the exact inverse of
    /// [`ToolContract::to_document`].
    pub fn from_document(doc: ToolContractDocument) -> Result<Self> {
        let td = doc.tool_contract;

        let mut task = match td.task_type {
            TaskKind::Standard => {
                ToolContractTask::new(doc.tool_contract_id, td.name, doc.version)?
            }
            TaskKind::Scattered => {
                let raw = td.max_nchunks.ok_or_else(|| ContractError::MalformedContract {
                    task_id: doc.tool_contract_id.clone(),
                    reason: "scattered task is missing 'max_nchunks'".to_string(),
                })?;
                let max_nchunks =
                    IntOrSymbol::from_json(&raw, "max_nchunks", SYMBOL_MAX_NCHUNKS)?;
                ToolContractTask::new_scatter(
                    doc.tool_contract_id,
                    td.name,
                    doc.version,
                    td.chunk_keys,
                    max_nchunks,
                )?
            }
            TaskKind::Gathered => {
                let chunk_key = td.chunk_key.ok_or_else(|| ContractError::MalformedContract {
                    task_id: doc.tool_contract_id.clone(),
                    reason: "gathered task is missing 'chunk_key'".to_string(),
                })?;
                ToolContractTask::new_gather(doc.tool_contract_id, td.name, doc.version, chunk_key)?
            }
        };

        task.description = td.description;
        task.is_distributed = td.is_distributed;
        task.nproc = IntOrSymbol::from_json(&td.nproc, "nproc", SYMBOL_MAX_NPROC)?;

        for t in td.input_types {
            task.add_input_file_type(t.file_type_id, t.id, t.title, t.description);
        }
        for t in td.output_types {
            task.add_output_file_type(t.file_type_id, t.id, t.title, t.description, t.default_name);
        }
        for od in td.schema_options {
            task.add_option(TaskOption::try_from(od)?);
        }
        for tag in td.resource_types {
            task.add_resource_type(ResourceType::from_tag(&tag)?);
        }

        Ok(ToolContract::new(task, doc.driver))
    }
}

/// Top-level resolved tool contract document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedToolContractDocument {
    /// Driver descriptor, same shape as in the unresolved document.
    pub driver: Driver,
    /// The resolved task body.
    pub resolved_tool_contract: ResolvedTaskDocument,
}

/// The nested `resolved_tool_contract` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTaskDocument {
    /// Task id, same as the source contract.
    pub tool_contract_id: String,
    /// Standard/scattered/gathered tag.
    pub task_type: TaskKind,
    /// Copied from the source contract.
    pub is_distributed: bool,
    /// Literal input paths.
    pub input_files: Vec<PathBuf>,
    /// Literal output paths.
    pub output_files: Vec<PathBuf>,
    /// Fully-populated option map.
    pub options: BTreeMap<String, OptionValue>,
    /// Literal processor count.
    pub nproc: u32,
    /// Materialized resources.
    pub resources: Vec<ResolvedResource>,
    /// Literal max chunk count (scatter only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nchunks: Option<u32>,
    /// Chunk keys (scatter only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunk_keys: Vec<String>,
    /// The chunk key to consume (gather only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_key: Option<String>,
}

impl ResolvedToolContract {
    /// Serialize to the document shape.
    pub fn to_document(&self) -> ResolvedToolContractDocument {
        let task = &self.task;
        let (max_nchunks, chunk_keys, chunk_key) = match &task.detail {
            ResolvedTaskDetail::Standard => (None, Vec::new(), None),
            ResolvedTaskDetail::Scatter {
                max_nchunks,
                chunk_keys,
            } => (Some(*max_nchunks), chunk_keys.clone(), None),
            ResolvedTaskDetail::Gather { chunk_key } => (None, Vec::new(), Some(chunk_key.clone())),
        };
        ResolvedToolContractDocument {
            driver: self.driver.clone(),
            resolved_tool_contract: ResolvedTaskDocument {
                tool_contract_id: task.task_id.clone(),
                task_type: task.kind(),
                is_distributed: task.is_distributed,
                input_files: task.input_files.clone(),
                output_files: task.output_files.clone(),
                options: task.options.clone(),
                nproc: task.nproc,
                resources: task.resources.clone(),
                max_nchunks,
                chunk_keys,
                chunk_key,
            },
        }
    }

    /// Reconstruct a resolved contract from its document shape.
    pub fn from_document(doc: ResolvedToolContractDocument) -> Result<Self> {
        let rd = doc.resolved_tool_contract;
        let detail = match rd.task_type {
            TaskKind::Standard => ResolvedTaskDetail::Standard,
            TaskKind::Scattered => ResolvedTaskDetail::Scatter {
                max_nchunks: rd.max_nchunks.ok_or_else(|| {
                    ContractError::MalformedContract {
                        task_id: rd.tool_contract_id.clone(),
                        reason: "resolved scattered task is missing 'max_nchunks'".to_string(),
                    }
                })?,
                chunk_keys: rd.chunk_keys,
            },
            TaskKind::Gathered => ResolvedTaskDetail::Gather {
                chunk_key: rd.chunk_key.ok_or_else(|| ContractError::MalformedContract {
                    task_id: rd.tool_contract_id.clone(),
                    reason: "resolved gathered task is missing 'chunk_key'".to_string(),
                })?,
            },
        };
        Ok(ResolvedToolContract::new(
            ResolvedToolContractTask {
                task_id: rd.tool_contract_id,
                is_distributed: rd.is_distributed,
                input_files: rd.input_files,
                output_files: rd.output_files,
                options: rd.options,
                nproc: rd.nproc,
                resources: rd.resources,
                detail,
            },
            doc.driver,
        ))
    }
}

//! The unresolved tool contract model.
//!
//! A tool contract is the declarative description of a task: typed input and
//! output slots, option schemas, a processor-count symbol, requested
//! resources, and the driver that will execute the resolved form. Contracts
//! are built once with the append-only `add_*` methods and treated as
//! write-once after publication; resolution produces a new object and never
//! mutates the source.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ContractError, Result};
use crate::option::TaskOption;

static RX_TASK_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+\.tasks\.[A-Za-z0-9_]+$").expect("valid task id pattern")
});

/// Symbol understood during resolution for "use max available processors".
pub const SYMBOL_MAX_NPROC: &str = "$max_nproc";
/// Symbol understood during resolution for "use max available chunks".
pub const SYMBOL_MAX_NCHUNKS: &str = "$max_nchunks";

/// Validate a task id against the `<namespace>.tasks.<name>` pattern.
pub fn validate_task_id(task_id: &str) -> Result<()> {
    if RX_TASK_ID.is_match(task_id) {
        Ok(())
    } else {
        Err(ContractError::InvalidTaskId(task_id.to_string()))
    }
}

/// A literal integer or a symbolic "use max available" placeholder.
///
/// Replaces the original string-sentinel encoding (`"$max_nproc"` mixed with
/// ints in one field) with a tagged variant resolved by a single function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntOrSymbol {
    /// Literal value, capped at the caller ceiling during resolution.
    Literal(u32),
    /// Resolve to the caller ceiling.
    UseMax,
}

impl IntOrSymbol {
    /// Encode for a document field, using the field's symbol string.
    pub fn to_json(self, symbol: &str) -> Value {
        match self {
            IntOrSymbol::Literal(n) => Value::from(n),
            IntOrSymbol::UseMax => Value::from(symbol),
        }
    }

    /// Decode from a document field. Anything other than a non-negative
    /// integer or the field's symbol string is rejected.
    pub fn from_json(value: &Value, field: &str, symbol: &str) -> Result<Self> {
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(v) if v <= u64::from(u32::MAX) => Ok(IntOrSymbol::Literal(v as u32)),
                _ => Err(ContractError::InvalidSymbol {
                    field: field.to_string(),
                    value: value.to_string(),
                    symbol: symbol.to_string(),
                }),
            },
            Value::String(s) if s == symbol => Ok(IntOrSymbol::UseMax),
            _ => Err(ContractError::InvalidSymbol {
                field: field.to_string(),
                value: value.to_string(),
                symbol: symbol.to_string(),
            }),
        }
    }
}

/// Ephemeral filesystem resource a task asks to have materialized.
///
/// This is a closed set; document tags outside it are rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    /// Unique temporary directory under the tmp root.
    #[serde(rename = "$tmpdir")]
    TmpDir,
    /// Unique temporary file under the tmp root.
    #[serde(rename = "$tmpfile")]
    TmpFile,
    /// Log file under the output directory, inspectable alongside outputs.
    #[serde(rename = "$logfile")]
    LogFile,
}

impl ResourceType {
    /// Document tag for this resource type.
    pub fn as_tag(self) -> &'static str {
        match self {
            ResourceType::TmpDir => "$tmpdir",
            ResourceType::TmpFile => "$tmpfile",
            ResourceType::LogFile => "$logfile",
        }
    }

    /// Parse a document tag, rejecting anything outside the supported set.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "$tmpdir" => Ok(ResourceType::TmpDir),
            "$tmpfile" => Ok(ResourceType::TmpFile),
            "$logfile" => Ok(ResourceType::LogFile),
            other => Err(ContractError::UnsupportedResourceType(other.to_string())),
        }
    }
}

/// Executable invocation template a contract is handed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Command template, e.g. `"filter-tool run-rtc "`.
    pub exe: String,
    /// Environment map passed to the driver.
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
}

impl Driver {
    /// Create a driver with an empty environment.
    pub fn new(exe: impl Into<String>) -> Self {
        Self {
            exe: exe.into(),
            env: BTreeMap::new(),
        }
    }
}

/// The task-type tag carried by contract documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Plain one-shot task.
    Standard,
    /// Task that splits one input into N chunks.
    Scattered,
    /// Task that merges N chunks' outputs into one.
    Gathered,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            TaskKind::Standard => "standard",
            TaskKind::Scattered => "scattered",
            TaskKind::Gathered => "gathered",
        };
        write!(f, "{tag}")
    }
}

/// An input file slot: a file type id plus display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFileType {
    /// File type id, resolved against the registry during resolution.
    pub file_type_id: String,
    /// Slot name, unique within one task.
    pub label: String,
    /// Display name.
    pub display_name: String,
    /// Description.
    pub description: String,
}

/// Default output file name: a plain file name or a `(base, ext)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultName {
    /// Plain file name, split on the last dot during resolution.
    Name(String),
    /// Explicit `(base, ext)` pair.
    BaseExt(String, String),
}

impl DefaultName {
    /// The `(base, ext)` pair this name resolves to. A plain name without a
    /// dot yields an empty extension.
    pub fn base_ext(&self) -> (String, String) {
        match self {
            DefaultName::BaseExt(base, ext) => (base.clone(), ext.clone()),
            DefaultName::Name(name) => match name.rsplit_once('.') {
                Some((base, ext)) => (base.to_string(), ext.to_string()),
                None => (name.clone(), String::new()),
            },
        }
    }
}

/// An output file slot. Like an input slot, plus an optional default name;
/// slots without one fall back to the registry's `(base_name, ext)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFileType {
    /// File type id, resolved against the registry during resolution.
    pub file_type_id: String,
    /// Slot name, unique within one task.
    pub label: String,
    /// Display name.
    pub display_name: String,
    /// Description.
    pub description: String,
    /// Default output name, if the contract specifies one.
    pub default_name: Option<DefaultName>,
}

/// Scatter/gather-specific declarations, as a closed sum rather than
/// inheritance.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskDetail {
    /// Plain task.
    Standard,
    /// Scatter task: declares the chunk keys it will populate and how many
    /// chunks it may produce.
    Scatter {
        /// Chunk dictionary keys this task populates, `$chunk.`-prefixed.
        chunk_keys: Vec<String>,
        /// Max chunk count, literal or "use max available".
        max_nchunks: IntOrSymbol,
    },
    /// Gather task: declares the single chunk key it consumes.
    Gather {
        /// The `$chunk.`-prefixed key this task reads from each chunk.
        chunk_key: String,
    },
}

impl TaskDetail {
    /// The task-type tag for this detail.
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskDetail::Standard => TaskKind::Standard,
            TaskDetail::Scatter { .. } => TaskKind::Scattered,
            TaskDetail::Gather { .. } => TaskKind::Gathered,
        }
    }
}

/// The declarative, unresolved description of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolContractTask {
    task_id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Semantic version of the task.
    pub version: String,
    /// Whether the task may be distributed across a cluster.
    pub is_distributed: bool,
    /// Processor count: literal or "use max available".
    pub nproc: IntOrSymbol,
    input_file_types: Vec<InputFileType>,
    output_file_types: Vec<OutputFileType>,
    options: Vec<TaskOption>,
    resource_types: Vec<ResourceType>,
    detail: TaskDetail,
}

impl ToolContractTask {
    fn with_detail(
        task_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        detail: TaskDetail,
    ) -> Result<Self> {
        let task_id = task_id.into();
        validate_task_id(&task_id)?;
        Ok(Self {
            task_id,
            name: name.into(),
            description: String::new(),
            version: version.into(),
            is_distributed: true,
            nproc: IntOrSymbol::Literal(1),
            input_file_types: Vec::new(),
            output_file_types: Vec::new(),
            options: Vec::new(),
            resource_types: Vec::new(),
            detail,
        })
    }

    /// Create a standard task. The task id must match
    /// `<namespace>.tasks.<name>`.
    pub fn new(
        task_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        Self::with_detail(task_id, name, version, TaskDetail::Standard)
    }

    /// Create a scatter task declaring its chunk keys and max chunk count.
    pub fn new_scatter(
        task_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        chunk_keys: Vec<String>,
        max_nchunks: IntOrSymbol,
    ) -> Result<Self> {
        Self::with_detail(
            task_id,
            name,
            version,
            TaskDetail::Scatter {
                chunk_keys,
                max_nchunks,
            },
        )
    }

    /// Create a gather task declaring the chunk key it consumes.
    pub fn new_gather(
        task_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        chunk_key: impl Into<String>,
    ) -> Result<Self> {
        Self::with_detail(
            task_id,
            name,
            version,
            TaskDetail::Gather {
                chunk_key: chunk_key.into(),
            },
        )
    }

    /// Task id.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Scatter/gather detail.
    pub fn detail(&self) -> &TaskDetail {
        &self.detail
    }

    /// Task-type tag.
    pub fn kind(&self) -> TaskKind {
        self.detail.kind()
    }

    /// Declared input slots, in order.
    pub fn input_file_types(&self) -> &[InputFileType] {
        &self.input_file_types
    }

    /// Declared output slots, in order.
    pub fn output_file_types(&self) -> &[OutputFileType] {
        &self.output_file_types
    }

    /// Declared option schemas, in order.
    pub fn options(&self) -> &[TaskOption] {
        &self.options
    }

    /// Requested resource types, in order.
    pub fn resource_types(&self) -> &[ResourceType] {
        &self.resource_types
    }

    /// Append an input file slot.
    pub fn add_input_file_type(
        &mut self,
        file_type_id: impl Into<String>,
        label: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.input_file_types.push(InputFileType {
            file_type_id: file_type_id.into(),
            label: label.into(),
            display_name: display_name.into(),
            description: description.into(),
        });
        self
    }

    /// Append an output file slot.
    pub fn add_output_file_type(
        &mut self,
        file_type_id: impl Into<String>,
        label: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        default_name: Option<DefaultName>,
    ) -> &mut Self {
        self.output_file_types.push(OutputFileType {
            file_type_id: file_type_id.into(),
            label: label.into(),
            display_name: display_name.into(),
            description: description.into(),
            default_name,
        });
        self
    }

    /// Append an option schema.
    pub fn add_option(&mut self, option: TaskOption) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Append an integer option.
    pub fn add_int_option(
        &mut self,
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: i64,
    ) -> Result<&mut Self> {
        let option = TaskOption::int(option_id, name, description, default)?;
        Ok(self.add_option(option))
    }

    /// Append a number option.
    pub fn add_float_option(
        &mut self,
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: f64,
    ) -> Result<&mut Self> {
        let option = TaskOption::float(option_id, name, description, default)?;
        Ok(self.add_option(option))
    }

    /// Append a string option.
    pub fn add_str_option(
        &mut self,
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Result<&mut Self> {
        let option = TaskOption::str(option_id, name, description, default)?;
        Ok(self.add_option(option))
    }

    /// Append a boolean option.
    pub fn add_bool_option(
        &mut self,
        option_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        default: bool,
    ) -> Result<&mut Self> {
        let option = TaskOption::boolean(option_id, name, description, default)?;
        Ok(self.add_option(option))
    }

    /// Append a requested resource type.
    pub fn add_resource_type(&mut self, resource_type: ResourceType) -> &mut Self {
        self.resource_types.push(resource_type);
        self
    }

    /// Look up a declared option by id.
    pub fn option(&self, option_id: &str) -> Option<&TaskOption> {
        self.options.iter().find(|o| o.option_id() == option_id)
    }
}

/// A task plus the driver that will execute its resolved form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolContract {
    /// The declarative task description.
    pub task: ToolContractTask,
    /// The driver invocation template.
    pub driver: Driver,
}

impl ToolContract {
    /// Pair a task with its driver.
    pub fn new(task: ToolContractTask, driver: Driver) -> Self {
        Self { task, driver }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_validation() {
        assert!(ToolContractTask::new("ns.tasks.filter", "Filter", "0.1.0").is_ok());
        assert!(matches!(
            ToolContractTask::new("ns.filter", "Filter", "0.1.0").unwrap_err(),
            ContractError::InvalidTaskId(_)
        ));
        assert!(matches!(
            ToolContractTask::new("ns.tasks.filter.extra", "Filter", "0.1.0").unwrap_err(),
            ContractError::InvalidTaskId(_)
        ));
    }

    #[test]
    fn test_append_only_builders() {
        let mut task = ToolContractTask::new("ns.tasks.filter", "Filter", "0.1.0").unwrap();
        task.add_input_file_type("Rivet.FileTypes.Fasta", "fasta_in", "Input FASTA", "");
        task.add_output_file_type(
            "Rivet.FileTypes.Fasta",
            "fasta_out",
            "Filtered FASTA",
            "",
            Some(DefaultName::BaseExt("filtered".to_string(), "fasta".to_string())),
        );
        task.add_int_option("ns.task_options.min_length", "Min Length", "", 25)
            .unwrap();
        task.add_resource_type(ResourceType::TmpDir);

        assert_eq!(task.input_file_types().len(), 1);
        assert_eq!(task.output_file_types().len(), 1);
        assert_eq!(task.options().len(), 1);
        assert_eq!(task.resource_types(), &[ResourceType::TmpDir]);
        assert!(task.option("ns.task_options.min_length").is_some());
    }

    #[test]
    fn test_default_name_base_ext() {
        let name = DefaultName::Name("report.json".to_string());
        assert_eq!(name.base_ext(), ("report".to_string(), "json".to_string()));

        let pair = DefaultName::BaseExt("filtered".to_string(), "fasta".to_string());
        assert_eq!(pair.base_ext(), ("filtered".to_string(), "fasta".to_string()));

        let bare = DefaultName::Name("README".to_string());
        assert_eq!(bare.base_ext(), ("README".to_string(), String::new()));
    }

    #[test]
    fn test_int_or_symbol_json() {
        let v = IntOrSymbol::Literal(4).to_json(SYMBOL_MAX_NPROC);
        assert_eq!(IntOrSymbol::from_json(&v, "nproc", SYMBOL_MAX_NPROC).unwrap(), IntOrSymbol::Literal(4));

        let v = IntOrSymbol::UseMax.to_json(SYMBOL_MAX_NPROC);
        assert_eq!(v, Value::from(SYMBOL_MAX_NPROC));
        assert_eq!(IntOrSymbol::from_json(&v, "nproc", SYMBOL_MAX_NPROC).unwrap(), IntOrSymbol::UseMax);

        let bad = Value::from("$max_nchunks");
        assert!(matches!(
            IntOrSymbol::from_json(&bad, "nproc", SYMBOL_MAX_NPROC).unwrap_err(),
            ContractError::InvalidSymbol { .. }
        ));
        let bad = Value::from(-3);
        assert!(IntOrSymbol::from_json(&bad, "nproc", SYMBOL_MAX_NPROC).is_err());
    }

    #[test]
    fn test_resource_type_tags() {
        assert_eq!(ResourceType::from_tag("$tmpdir").unwrap(), ResourceType::TmpDir);
        assert_eq!(ResourceType::TmpFile.as_tag(), "$tmpfile");
        assert!(matches!(
            ResourceType::from_tag("$outputdir").unwrap_err(),
            ContractError::UnsupportedResourceType(_)
        ));
    }

    #[test]
    fn test_scatter_gather_kinds() {
        let scatter = ToolContractTask::new_scatter(
            "ns.tasks.scatter_fasta",
            "Scatter",
            "0.1.0",
            vec!["$chunk.fasta_id".to_string()],
            IntOrSymbol::UseMax,
        )
        .unwrap();
        assert_eq!(scatter.kind(), TaskKind::Scattered);

        let gather =
            ToolContractTask::new_gather("ns.tasks.gather_fasta", "Gather", "0.1.0", "$chunk.fasta_id")
                .unwrap();
        assert_eq!(gather.kind(), TaskKind::Gathered);
    }
}

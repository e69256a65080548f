//! The resolution engine: converts a [`ToolContract`] plus concrete bindings
//! into a [`ResolvedToolContract`].
//!
//! Resolution is synchronous and pure with respect to its inputs: it
//! synthesizes path strings but performs no filesystem I/O. Creating the
//! temp dirs/files it names is the executing tool's job at run time.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use rivet_contract::{
    FileTypeRegistry, IntOrSymbol, OptionValue, OutputFileType, ResolvedResource,
    ResolvedTaskDetail, ResolvedToolContract, ResolvedToolContractTask, ResourceType, TaskDetail,
    TaskKind, TaskOption, ToolContract, ToolContractTask,
};

use crate::error::{ResolveError, Result};

/// Resolved pieces shared by all task kinds.
struct ResolvedCore {
    output_files: Vec<PathBuf>,
    options: BTreeMap<String, OptionValue>,
    nproc: u32,
    resources: Vec<ResolvedResource>,
}

/// Resolve a standard tool contract.
///
/// `input_paths` must match the contract's declared input slot count; the
/// paths themselves pass through unmodified and their actual file types are
/// deliberately not checked against the declared input types. `overrides`
/// may be empty; every declared option appears in the result either way.
pub fn resolve(
    contract: &ToolContract,
    registry: &FileTypeRegistry,
    input_paths: &[PathBuf],
    output_dir: &Path,
    tmp_dir: &Path,
    max_nproc: u32,
    overrides: &BTreeMap<String, OptionValue>,
) -> Result<ResolvedToolContract> {
    expect_kind(&contract.task, TaskKind::Standard)?;
    let core = resolve_core(
        &contract.task,
        registry,
        input_paths,
        output_dir,
        tmp_dir,
        max_nproc,
        overrides,
    )?;
    Ok(assemble(contract, input_paths, core, ResolvedTaskDetail::Standard))
}

/// Resolve a scatter tool contract.
///
/// `max_nchunks` is the caller's chunk ceiling, applied to the contract's
/// declared max-chunks symbol or literal with the same min/max policy as
/// nproc. `chunk_keys` are carried into the resolved task for the workflow
/// engine to route.
pub fn resolve_scatter(
    contract: &ToolContract,
    registry: &FileTypeRegistry,
    input_paths: &[PathBuf],
    output_dir: &Path,
    tmp_dir: &Path,
    max_nproc: u32,
    overrides: &BTreeMap<String, OptionValue>,
    max_nchunks: u32,
    chunk_keys: &[String],
) -> Result<ResolvedToolContract> {
    let declared = match contract.task.detail() {
        TaskDetail::Scatter { max_nchunks, .. } => *max_nchunks,
        other => {
            return Err(ResolveError::WrongTaskKind {
                expected: TaskKind::Scattered,
                actual: other.kind(),
            });
        }
    };
    let core = resolve_core(
        &contract.task,
        registry,
        input_paths,
        output_dir,
        tmp_dir,
        max_nproc,
        overrides,
    )?;
    let detail = ResolvedTaskDetail::Scatter {
        max_nchunks: resolve_int_or_symbol(declared, max_nchunks),
        chunk_keys: chunk_keys.to_vec(),
    };
    Ok(assemble(contract, input_paths, core, detail))
}

/// Resolve a gather tool contract.
///
/// `chunk_key` is the key the gather task will read from each collected
/// chunk.
pub fn resolve_gather(
    contract: &ToolContract,
    registry: &FileTypeRegistry,
    input_paths: &[PathBuf],
    output_dir: &Path,
    tmp_dir: &Path,
    max_nproc: u32,
    overrides: &BTreeMap<String, OptionValue>,
    chunk_key: &str,
) -> Result<ResolvedToolContract> {
    expect_kind(&contract.task, TaskKind::Gathered)?;
    let core = resolve_core(
        &contract.task,
        registry,
        input_paths,
        output_dir,
        tmp_dir,
        max_nproc,
        overrides,
    )?;
    let detail = ResolvedTaskDetail::Gather {
        chunk_key: chunk_key.to_string(),
    };
    Ok(assemble(contract, input_paths, core, detail))
}

fn expect_kind(task: &ToolContractTask, expected: TaskKind) -> Result<()> {
    let actual = task.kind();
    if actual == expected {
        Ok(())
    } else {
        Err(ResolveError::WrongTaskKind { expected, actual })
    }
}

fn resolve_core(
    task: &ToolContractTask,
    registry: &FileTypeRegistry,
    input_paths: &[PathBuf],
    output_dir: &Path,
    tmp_dir: &Path,
    max_nproc: u32,
    overrides: &BTreeMap<String, OptionValue>,
) -> Result<ResolvedCore> {
    if input_paths.len() != task.input_file_types().len() {
        return Err(ResolveError::IncompatibleInputs {
            task_id: task.task_id().to_string(),
            supplied: input_paths.len(),
            expected: task.input_file_types().len(),
        });
    }

    let output_files = resolve_output_files(task.output_file_types(), registry, output_dir)?;
    let options = resolve_options(task.options(), overrides)?;
    let nproc = resolve_int_or_symbol(task.nproc, max_nproc);
    let resources = materialize_resources(task.resource_types(), output_dir, tmp_dir);

    debug!(
        task_id = %task.task_id(),
        noutputs = output_files.len(),
        nproc,
        "Resolved tool contract core"
    );

    Ok(ResolvedCore {
        output_files,
        options,
        nproc,
        resources,
    })
}

/// Resolve a literal-or-symbol against the caller ceiling: literals are
/// capped at the ceiling, the symbol resolves to it.
fn resolve_int_or_symbol(value: IntOrSymbol, max_value: u32) -> u32 {
    match value {
        IntOrSymbol::Literal(n) => n.min(max_value),
        IntOrSymbol::UseMax => max_value,
    }
}

/// Resolve every output slot to a path under `output_dir`, in declared order.
///
/// The collision counter is local to one resolution call: the first
/// occurrence of a `(base, ext)` pair yields `base.ext`, later occurrences
/// yield `base-1.ext`, `base-2.ext`, and so on, so two slots declaring the
/// same default name never collide on disk.
fn resolve_output_files(
    output_types: &[OutputFileType],
    registry: &FileTypeRegistry,
    output_dir: &Path,
) -> std::result::Result<Vec<PathBuf>, rivet_contract::ContractError> {
    let mut seen: HashMap<(String, String), u32> = HashMap::new();
    output_types
        .iter()
        .map(|output_type| {
            let (base, ext) = match &output_type.default_name {
                Some(default_name) => default_name.base_ext(),
                None => {
                    let file_type = registry.lookup(&output_type.file_type_id)?;
                    (file_type.base_name, file_type.ext)
                }
            };
            let occurrence = seen.entry((base.clone(), ext.clone())).or_insert(0);
            let file_name = output_file_name(&base, &ext, *occurrence);
            *occurrence += 1;
            Ok(output_dir.join(file_name))
        })
        .collect()
}

fn output_file_name(base: &str, ext: &str, occurrence: u32) -> String {
    let base = if occurrence == 0 {
        base.to_string()
    } else {
        format!("{base}-{occurrence}")
    };
    if ext.is_empty() {
        base
    } else {
        format!("{base}.{ext}")
    }
}

/// Resolve every declared option: override if supplied, else the schema
/// default, type-checked either way. The result contains exactly the
/// declared option ids.
fn resolve_options(
    options: &[TaskOption],
    overrides: &BTreeMap<String, OptionValue>,
) -> Result<BTreeMap<String, OptionValue>> {
    let mut resolved = BTreeMap::new();
    for option in options {
        let value = overrides
            .get(option.option_id())
            .cloned()
            .unwrap_or_else(|| option.default().clone());
        let value = option
            .validate_value(value)
            .map_err(|source| ResolveError::OptionResolve {
                option_id: option.option_id().to_string(),
                source,
            })?;
        resolved.insert(option.option_id().to_string(), value);
    }
    Ok(resolved)
}

/// Synthesize a unique path for each requested resource, in declared order.
///
/// Paths carry a uuid token so concurrent resolutions across processes never
/// collide. Nothing is created on disk here.
fn materialize_resources(
    resource_types: &[ResourceType],
    output_dir: &Path,
    tmp_dir: &Path,
) -> Vec<ResolvedResource> {
    resource_types
        .iter()
        .map(|resource_type| {
            let token = Uuid::new_v4().simple().to_string();
            let path = match resource_type {
                ResourceType::TmpDir => tmp_dir.join(format!("tmpdir-{token}")),
                ResourceType::TmpFile => tmp_dir.join(format!("tmpfile-{token}.tmp")),
                ResourceType::LogFile => output_dir.join(format!("task-{token}.log")),
            };
            ResolvedResource {
                resource_type: *resource_type,
                path,
            }
        })
        .collect()
}

fn assemble(
    contract: &ToolContract,
    input_paths: &[PathBuf],
    core: ResolvedCore,
    detail: ResolvedTaskDetail,
) -> ResolvedToolContract {
    ResolvedToolContract::new(
        ResolvedToolContractTask {
            task_id: contract.task.task_id().to_string(),
            is_distributed: contract.task.is_distributed,
            input_files: input_paths.to_vec(),
            output_files: core.output_files,
            options: core.options,
            nproc: core.nproc,
            resources: core.resources,
            detail,
        },
        contract.driver.clone(),
    )
}

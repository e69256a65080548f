//! Integration tests for the resolution engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rivet_contract::{
    ContractError, DefaultName, Driver, FileTypeRegistry, IntOrSymbol, OptionValue,
    ResolvedTaskDetail, ResourceType, ToolContract, ToolContractTask, file_types,
    load_resolved_tool_contract, write_resolved_tool_contract,
};
use rivet_resolver::{ResolveError, resolve, resolve_gather, resolve_scatter};

/// The FASTA filter contract: one FASTA input, one FASTA output defaulting
/// to `(filtered, fasta)`, one int option with default 25, nproc "use max".
fn filter_contract() -> ToolContract {
    let mut task = ToolContractTask::new("ns.tasks.filter", "Filter FASTA", "0.1.0").unwrap();
    task.nproc = IntOrSymbol::UseMax;
    task.add_input_file_type(file_types::FASTA, "fasta_in", "Input FASTA", "Reads to filter");
    task.add_output_file_type(
        file_types::FASTA,
        "fasta_out",
        "Filtered FASTA",
        "Filtered reads",
        Some(DefaultName::BaseExt("filtered".to_string(), "fasta".to_string())),
    );
    task.add_int_option("ns.task_options.min_length", "Min Length", "Minimum read length", 25)
        .unwrap();
    ToolContract::new(task, Driver::new("filter-tool run-rtc "))
}

fn no_overrides() -> BTreeMap<String, OptionValue> {
    BTreeMap::new()
}

#[test]
fn test_filter_scenario() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();
    let inputs = vec![PathBuf::from("/data/in.fasta")];

    let resolved = resolve(
        &contract,
        &registry,
        &inputs,
        Path::new("/out"),
        Path::new("/tmp"),
        4,
        &no_overrides(),
    )
    .unwrap();

    assert_eq!(resolved.task.task_id, "ns.tasks.filter");
    assert_eq!(resolved.task.input_files, inputs);
    assert_eq!(resolved.task.output_files, vec![PathBuf::from("/out/filtered.fasta")]);
    assert_eq!(
        resolved.task.options.get("ns.task_options.min_length"),
        Some(&OptionValue::Int(25))
    );
    assert_eq!(resolved.task.nproc, 4);
    assert_eq!(resolved.task.detail, ResolvedTaskDetail::Standard);
    assert_eq!(resolved.driver, contract.driver);
}

#[test]
fn test_output_collision_avoidance() {
    let mut task = ToolContractTask::new("ns.tasks.dupes", "Dupes", "0.1.0").unwrap();
    task.add_input_file_type(file_types::TXT, "txt_in", "Input", "");
    for label in ["out_a", "out_b", "out_c"] {
        task.add_output_file_type(
            file_types::TXT,
            label,
            "Result",
            "",
            Some(DefaultName::BaseExt("result".to_string(), "txt".to_string())),
        );
    }
    let contract = ToolContract::new(task, Driver::new("dupes-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.txt")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
    )
    .unwrap();

    assert_eq!(
        resolved.task.output_files,
        vec![
            PathBuf::from("/out/result.txt"),
            PathBuf::from("/out/result-1.txt"),
            PathBuf::from("/out/result-2.txt"),
        ]
    );
}

#[test]
fn test_collision_counter_is_per_call() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();
    let inputs = vec![PathBuf::from("/data/in.fasta")];

    // Two successive calls both get the unsuffixed name.
    for _ in 0..2 {
        let resolved = resolve(
            &contract,
            &registry,
            &inputs,
            Path::new("/out"),
            Path::new("/tmp"),
            1,
            &no_overrides(),
        )
        .unwrap();
        assert_eq!(resolved.task.output_files, vec![PathBuf::from("/out/filtered.fasta")]);
    }
}

#[test]
fn test_output_name_falls_back_to_registry() {
    let mut task = ToolContractTask::new("ns.tasks.report", "Report", "0.1.0").unwrap();
    task.add_input_file_type(file_types::TXT, "txt_in", "Input", "");
    task.add_output_file_type(file_types::JSON, "json_out", "Report JSON", "", None);
    let contract = ToolContract::new(task, Driver::new("report-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.txt")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
    )
    .unwrap();

    // Registry's (base_name, ext) for the JSON file type.
    assert_eq!(resolved.task.output_files, vec![PathBuf::from("/out/file.json")]);
}

#[test]
fn test_unregistered_output_file_type_fails() {
    let mut task = ToolContractTask::new("ns.tasks.report", "Report", "0.1.0").unwrap();
    task.add_input_file_type(file_types::TXT, "txt_in", "Input", "");
    task.add_output_file_type("Custom.FileTypes.Unknown", "out", "Out", "", None);
    let contract = ToolContract::new(task, Driver::new("report-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let err = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.txt")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Contract(ContractError::FileTypeNotFound(_))
    ));
}

#[test]
fn test_input_arity_mismatch() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();

    let err = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/a.fasta"), PathBuf::from("/b.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
    )
    .unwrap_err();

    match err {
        ResolveError::IncompatibleInputs {
            supplied, expected, ..
        } => {
            assert_eq!(supplied, 2);
            assert_eq!(expected, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_input_paths_pass_through_untyped() {
    // A BAM path where a FASTA was declared resolves fine: input types are
    // declared shape only, not enforced against the literal paths.
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();
    let inputs = vec![PathBuf::from("/data/aligned.bam")];

    let resolved = resolve(
        &contract,
        &registry,
        &inputs,
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
    )
    .unwrap();
    assert_eq!(resolved.task.input_files, inputs);
}

#[test]
fn test_option_override_applied() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();
    let overrides = BTreeMap::from([(
        "ns.task_options.min_length".to_string(),
        OptionValue::Int(100),
    )]);

    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &overrides,
    )
    .unwrap();

    assert_eq!(
        resolved.task.options.get("ns.task_options.min_length"),
        Some(&OptionValue::Int(100))
    );
}

#[test]
fn test_option_completeness() {
    let mut task = ToolContractTask::new("ns.tasks.multi", "Multi", "0.1.0").unwrap();
    task.add_input_file_type(file_types::TXT, "txt_in", "Input", "");
    task.add_output_file_type(file_types::TXT, "txt_out", "Output", "", None);
    task.add_int_option("ns.task_options.alpha", "Alpha", "", 1).unwrap();
    task.add_float_option("ns.task_options.beta", "Beta", "", 0.5).unwrap();
    task.add_bool_option("ns.task_options.gamma", "Gamma", "", false).unwrap();
    let contract = ToolContract::new(task, Driver::new("multi-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let overrides = BTreeMap::from([("ns.task_options.alpha".to_string(), OptionValue::Int(7))]);
    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/in.txt")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &overrides,
    )
    .unwrap();

    // Exactly the declared ids, no more, no fewer.
    let ids: Vec<&str> = resolved.task.options.keys().map(String::as_str).collect();
    assert_eq!(
        ids,
        vec!["ns.task_options.alpha", "ns.task_options.beta", "ns.task_options.gamma"]
    );
    assert_eq!(resolved.task.options["ns.task_options.alpha"], OptionValue::Int(7));
    assert_eq!(resolved.task.options["ns.task_options.beta"], OptionValue::Float(0.5));
    assert_eq!(resolved.task.options["ns.task_options.gamma"], OptionValue::Bool(false));
}

#[test]
fn test_option_type_mismatch_rejected() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();
    let overrides = BTreeMap::from([(
        "ns.task_options.min_length".to_string(),
        OptionValue::Str("not-an-int".to_string()),
    )]);

    let err = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &overrides,
    )
    .unwrap_err();

    match err {
        ResolveError::OptionResolve { option_id, source } => {
            assert_eq!(option_id, "ns.task_options.min_length");
            assert!(matches!(source, ContractError::OptionTypeMismatch { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_nproc_literal_capped_at_ceiling() {
    let mut contract = filter_contract();
    contract.task.nproc = IntOrSymbol::Literal(3);
    let registry = FileTypeRegistry::with_defaults();

    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
    )
    .unwrap();
    assert_eq!(resolved.task.nproc, 1);
}

#[test]
fn test_resources_materialized_in_declared_order() {
    let mut task = ToolContractTask::new("ns.tasks.heavy", "Heavy", "0.1.0").unwrap();
    task.add_input_file_type(file_types::TXT, "txt_in", "Input", "");
    task.add_output_file_type(file_types::TXT, "txt_out", "Output", "", None);
    task.add_resource_type(ResourceType::TmpDir);
    task.add_resource_type(ResourceType::TmpFile);
    task.add_resource_type(ResourceType::LogFile);
    let contract = ToolContract::new(task, Driver::new("heavy-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let tmp = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/in.txt")],
        out.path(),
        tmp.path(),
        1,
        &no_overrides(),
    )
    .unwrap();

    let resources = &resolved.task.resources;
    assert_eq!(resources.len(), 3);
    assert_eq!(resources[0].resource_type, ResourceType::TmpDir);
    assert_eq!(resources[1].resource_type, ResourceType::TmpFile);
    assert_eq!(resources[2].resource_type, ResourceType::LogFile);
    assert!(resources[0].path.starts_with(tmp.path()));
    assert!(resources[1].path.starts_with(tmp.path()));
    assert!(resources[2].path.starts_with(out.path()));

    // Paths are synthesized, never created by the resolver.
    for resource in resources {
        assert!(!resource.path.exists());
    }
}

#[test]
fn test_resolve_scatter() {
    let mut task = ToolContractTask::new_scatter(
        "ns.tasks.scatter_fasta",
        "Scatter FASTA",
        "0.1.0",
        vec!["$chunk.fasta_id".to_string()],
        IntOrSymbol::UseMax,
    )
    .unwrap();
    task.add_input_file_type(file_types::FASTA, "fasta_in", "Input", "");
    task.add_output_file_type(file_types::JSON, "cjson", "Chunk JSON", "", None);
    let contract = ToolContract::new(task, Driver::new("scatter-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let chunk_keys = vec!["$chunk.fasta_id".to_string()];
    let resolved = resolve_scatter(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        2,
        &no_overrides(),
        24,
        &chunk_keys,
    )
    .unwrap();

    match &resolved.task.detail {
        ResolvedTaskDetail::Scatter {
            max_nchunks,
            chunk_keys: keys,
        } => {
            assert_eq!(*max_nchunks, 24);
            assert_eq!(keys, &chunk_keys);
        }
        other => panic!("unexpected detail: {other:?}"),
    }
    assert_eq!(resolved.task.nproc, 2);
}

#[test]
fn test_resolve_gather() {
    let mut task =
        ToolContractTask::new_gather("ns.tasks.gather_fasta", "Gather FASTA", "0.1.0", "$chunk.fasta_id")
            .unwrap();
    task.add_input_file_type(file_types::JSON, "cjson", "Chunk JSON", "");
    task.add_output_file_type(file_types::FASTA, "fasta_out", "Merged FASTA", "", None);
    let contract = ToolContract::new(task, Driver::new("gather-tool "));
    let registry = FileTypeRegistry::with_defaults();

    let resolved = resolve_gather(
        &contract,
        &registry,
        &[PathBuf::from("/out/chunks.json")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
        "$chunk.fasta_id",
    )
    .unwrap();

    assert_eq!(
        resolved.task.detail,
        ResolvedTaskDetail::Gather {
            chunk_key: "$chunk.fasta_id".to_string()
        }
    );
}

#[test]
fn test_wrong_task_kind_rejected() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();

    let err = resolve_gather(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
        "$chunk.fasta_id",
    )
    .unwrap_err();
    assert!(matches!(err, ResolveError::WrongTaskKind { .. }));

    let err = resolve_scatter(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        1,
        &no_overrides(),
        8,
        &[],
    )
    .unwrap_err();
    assert!(matches!(err, ResolveError::WrongTaskKind { .. }));
}

#[test]
fn test_resolved_contract_file_round_trip() {
    let contract = filter_contract();
    let registry = FileTypeRegistry::with_defaults();

    let resolved = resolve(
        &contract,
        &registry,
        &[PathBuf::from("/data/in.fasta")],
        Path::new("/out"),
        Path::new("/tmp"),
        4,
        &no_overrides(),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resolved_tool_contract.json");
    write_resolved_tool_contract(&resolved, &path).unwrap();
    let loaded = load_resolved_tool_contract(&path).unwrap();
    assert_eq!(loaded, resolved);
}

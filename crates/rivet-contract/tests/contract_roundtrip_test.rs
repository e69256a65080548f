//! Integration tests for contract document round-trips.

use rivet_contract::{
    DefaultName, Driver, IntOrSymbol, OptionValue, ResourceType, TaskKind, TaskOption,
    ToolContract, ToolContractDocument, ToolContractTask, file_types, load_tool_contract,
    write_tool_contract,
};

fn build_contract() -> ToolContract {
    let mut task = ToolContractTask::new("ns.tasks.filter", "Filter FASTA", "1.2.3").unwrap();
    task.description = "Filter reads shorter than a threshold".to_string();
    task.is_distributed = false;
    task.nproc = IntOrSymbol::UseMax;
    task.add_input_file_type(file_types::FASTA, "fasta_in", "Input FASTA", "Reads to filter");
    task.add_output_file_type(
        file_types::FASTA,
        "fasta_out",
        "Filtered FASTA",
        "Filtered reads",
        Some(DefaultName::BaseExt("filtered".to_string(), "fasta".to_string())),
    );
    task.add_output_file_type(file_types::JSON, "report", "Report", "Filter report", None);
    task.add_int_option("ns.task_options.min_length", "Min Length", "Minimum read length", 25)
        .unwrap();
    task.add_str_option("ns.task_options.prefix", "Prefix", "Output id prefix", "filtered")
        .unwrap();
    task.add_option(
        TaskOption::choice_str(
            "ns.task_options.mode",
            "Mode",
            "Filtering mode",
            vec!["strict".to_string(), "lenient".to_string()],
            "strict",
        )
        .unwrap(),
    );
    task.add_resource_type(ResourceType::TmpDir);
    task.add_resource_type(ResourceType::LogFile);
    ToolContract::new(task, Driver::new("filter-tool run-rtc "))
}

#[test]
fn test_full_round_trip_preserves_everything() {
    let contract = build_contract();
    let doc = contract.to_document().unwrap();
    let text = serde_json::to_string_pretty(&doc).unwrap();
    let parsed: ToolContractDocument = serde_json::from_str(&text).unwrap();
    let rebuilt = ToolContract::from_document(parsed).unwrap();

    assert_eq!(rebuilt.task.task_id(), contract.task.task_id());
    assert_eq!(rebuilt.task.version, contract.task.version);
    assert_eq!(rebuilt.task.nproc, IntOrSymbol::UseMax);
    assert_eq!(rebuilt.task.input_file_types(), contract.task.input_file_types());
    assert_eq!(rebuilt.task.output_file_types(), contract.task.output_file_types());
    assert_eq!(rebuilt.task.options(), contract.task.options());
    assert_eq!(rebuilt.task.resource_types(), contract.task.resource_types());
    assert_eq!(rebuilt, contract);

    // Re-serializing yields a field-for-field equal document.
    assert_eq!(rebuilt.to_document().unwrap(), contract.to_document().unwrap());
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tool_contract.json");

    let contract = build_contract();
    write_tool_contract(&contract, &path).unwrap();
    let loaded = load_tool_contract(&path).unwrap();
    assert_eq!(loaded, contract);
}

#[test]
fn test_document_shape_fields() {
    let contract = build_contract();
    let doc = contract.to_document().unwrap();
    let value = serde_json::to_value(&doc).unwrap();

    assert_eq!(value["tool_contract_id"], "ns.tasks.filter");
    assert_eq!(value["version"], "1.2.3");
    assert_eq!(value["driver"]["exe"], "filter-tool run-rtc ");
    let tc = &value["tool_contract"];
    assert_eq!(tc["task_type"], "standard");
    assert_eq!(tc["is_distributed"], false);
    assert_eq!(tc["nproc"], "$max_nproc");
    assert_eq!(tc["input_types"][0]["id"], "fasta_in");
    assert_eq!(tc["input_types"][0]["file_type_id"], file_types::FASTA);
    assert_eq!(tc["output_types"][0]["default_name"][0], "filtered");
    assert_eq!(tc["output_types"][0]["default_name"][1], "fasta");
    assert_eq!(tc["schema_options"][0]["type"], "integer");
    assert_eq!(tc["schema_options"][0]["default"], 25);
    assert_eq!(tc["schema_options"][2]["choices"][1], "lenient");
    assert_eq!(tc["resource_types"][0], "$tmpdir");
}

#[test]
fn test_gather_document_round_trip() {
    let mut task = ToolContractTask::new_gather(
        "ns.tasks.gather_fasta",
        "Gather FASTA",
        "0.1.0",
        "$chunk.fasta_id",
    )
    .unwrap();
    task.add_input_file_type(file_types::JSON, "cjson", "Chunk JSON", "");
    task.add_output_file_type(file_types::FASTA, "fasta_out", "Merged", "", None);
    let contract = ToolContract::new(task, Driver::new("gather-tool "));

    let doc = contract.to_document().unwrap();
    assert_eq!(doc.tool_contract.task_type, TaskKind::Gathered);
    assert_eq!(doc.tool_contract.chunk_key.as_deref(), Some("$chunk.fasta_id"));

    let rebuilt = ToolContract::from_document(doc).unwrap();
    assert_eq!(rebuilt, contract);
}

#[test]
fn test_option_values_survive_as_plain_scalars() {
    let contract = build_contract();
    let doc = contract.to_document().unwrap();
    let value = serde_json::to_value(&doc).unwrap();

    // Untagged scalars, not wrapped objects.
    assert!(value["tool_contract"]["schema_options"][0]["default"].is_i64());
    assert!(value["tool_contract"]["schema_options"][1]["default"].is_string());

    let prefix = OptionValue::Str("filtered".to_string());
    assert_eq!(
        serde_json::to_value(&prefix).unwrap(),
        serde_json::Value::from("filtered")
    );
}

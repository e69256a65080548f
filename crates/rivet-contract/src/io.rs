//! Load/write helpers moving contract and chunk documents through JSON files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::chunk::{ChunkDocument, PipelineChunk};
use crate::contract::ToolContract;
use crate::document::{ResolvedToolContractDocument, ToolContractDocument};
use crate::error::{ContractError, Result};
use crate::resolved::ResolvedToolContract;

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ContractError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| ContractError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a tool contract from a JSON document file.
pub fn load_tool_contract(path: &Path) -> Result<ToolContract> {
    let text = read_file(path)?;
    let doc: ToolContractDocument = serde_json::from_str(&text)?;
    debug!(path = %path.display(), tool_contract_id = %doc.tool_contract_id, "Loaded tool contract");
    ToolContract::from_document(doc)
}

/// Write a tool contract as a JSON document file.
pub fn write_tool_contract(contract: &ToolContract, path: &Path) -> Result<()> {
    let doc = contract.to_document()?;
    let text = serde_json::to_string_pretty(&doc)?;
    write_file(path, &text)
}

/// Load a resolved tool contract from a JSON document file.
pub fn load_resolved_tool_contract(path: &Path) -> Result<ResolvedToolContract> {
    let text = read_file(path)?;
    let doc: ResolvedToolContractDocument = serde_json::from_str(&text)?;
    ResolvedToolContract::from_document(doc)
}

/// Write a resolved tool contract as a JSON document file.
pub fn write_resolved_tool_contract(resolved: &ResolvedToolContract, path: &Path) -> Result<()> {
    let doc = resolved.to_document();
    let text = serde_json::to_string_pretty(&doc)?;
    write_file(path, &text)
}

/// Load a chunk list from a JSON chunk document file.
pub fn load_pipeline_chunks(path: &Path) -> Result<Vec<PipelineChunk>> {
    let text = read_file(path)?;
    let doc: ChunkDocument = serde_json::from_str(&text)?;
    Ok(doc.chunks)
}

/// Write a chunk list as a JSON chunk document file.
pub fn write_pipeline_chunks(chunks: &[PipelineChunk], path: &Path) -> Result<()> {
    let doc = ChunkDocument::new(chunks.to_vec());
    let text = serde_json::to_string_pretty(&doc)?;
    write_file(path, &text)
}

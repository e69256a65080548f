//! Pipeline chunks: the key-value shards a scatter task produces and a
//! gather task consumes.
//!
//! Keys prefixed `$chunk.` are chunk keys, routable by the workflow engine to
//! chunked task inputs; everything else is chunk metadata. Callers commonly
//! forget the prefix, so lookups and chunk-key writes tolerate the bare form:
//! the prefix is re-added with a warning rather than rejecting the call.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ContractError, Result};

/// Reserved prefix marking a chunk key.
pub const CHUNK_KEY_PREFIX: &str = "$chunk.";

/// Normalize a caller-supplied chunk key, re-adding a missing prefix.
fn normalize_chunk_key(key: &str) -> Cow<'_, str> {
    if key.starts_with(CHUNK_KEY_PREFIX) {
        Cow::Borrowed(key)
    } else {
        warn!(key, "Chunk key is missing the '$chunk.' prefix; correcting");
        Cow::Owned(format!("{CHUNK_KEY_PREFIX}{key}"))
    }
}

/// One shard of a scattered workflow: an id plus an open key-value map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineChunk {
    /// Chunk id, e.g. `chunk_0`.
    pub chunk_id: String,
    /// Chunk keys and metadata.
    #[serde(rename = "chunk")]
    datum: BTreeMap<String, Value>,
}

/// Wire form of one chunk entry, before id validation.
#[derive(Debug, Clone, Deserialize)]
struct RawPipelineChunk {
    chunk_id: String,
    chunk: BTreeMap<String, Value>,
}

impl TryFrom<RawPipelineChunk> for PipelineChunk {
    type Error = ContractError;

    fn try_from(raw: RawPipelineChunk) -> Result<Self> {
        let mut chunk = PipelineChunk::new(raw.chunk_id)?;
        chunk.datum = raw.chunk;
        Ok(chunk)
    }
}

impl<'de> Deserialize<'de> for PipelineChunk {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawPipelineChunk::deserialize(deserializer)?;
        PipelineChunk::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl PipelineChunk {
    /// Create an empty chunk. The id must not itself live in the reserved
    /// `$chunk.` key namespace.
    pub fn new(chunk_id: impl Into<String>) -> Result<Self> {
        let chunk_id = chunk_id.into();
        if chunk_id.starts_with(CHUNK_KEY_PREFIX) {
            return Err(ContractError::MalformedChunkId(chunk_id));
        }
        Ok(Self {
            chunk_id,
            datum: BTreeMap::new(),
        })
    }

    /// Set a chunk key to a value, re-adding a missing `$chunk.` prefix.
    pub fn set_chunk_key(&mut self, key: &str, value: impl Into<Value>) {
        let key = normalize_chunk_key(key).into_owned();
        self.datum.insert(key, value.into());
    }

    /// Set a metadata key. Metadata must stay out of the reserved chunk-key
    /// namespace.
    pub fn set_metadata_key(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if key.starts_with(CHUNK_KEY_PREFIX) {
            return Err(ContractError::ReservedChunkKey(key));
        }
        self.datum.insert(key, value.into());
        Ok(())
    }

    /// Look up a chunk key, tolerating a missing `$chunk.` prefix.
    pub fn chunk_key(&self, key: &str) -> Option<&Value> {
        self.datum.get(normalize_chunk_key(key).as_ref())
    }

    /// The chunk keys present in this chunk, in sorted order.
    pub fn chunk_keys(&self) -> Vec<&str> {
        self.datum
            .keys()
            .filter(|k| k.starts_with(CHUNK_KEY_PREFIX))
            .map(String::as_str)
            .collect()
    }

    /// The chunk-key entries of this chunk.
    pub fn chunk_data(&self) -> BTreeMap<&str, &Value> {
        self.datum
            .iter()
            .filter(|(k, _)| k.starts_with(CHUNK_KEY_PREFIX))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// The metadata entries of this chunk.
    pub fn metadata(&self) -> BTreeMap<&str, &Value> {
        self.datum
            .iter()
            .filter(|(k, _)| !k.starts_with(CHUNK_KEY_PREFIX))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

/// The persisted chunk document: `{nchunks, chunks: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDocument {
    /// Number of chunks in the document.
    pub nchunks: usize,
    /// The chunks, in scatter order.
    pub chunks: Vec<PipelineChunk>,
}

impl ChunkDocument {
    /// Build a document from a chunk list.
    pub fn new(chunks: Vec<PipelineChunk>) -> Self {
        Self {
            nchunks: chunks.len(),
            chunks,
        }
    }
}

/// Collect the value of `chunk_key` from every chunk, in order.
///
/// Scatter/gather pairing is a contract between producer and consumer: a
/// chunk missing the required key is a hard failure naming the key and the
/// chunk, never skipped.
pub fn gather_chunk_values<'a>(chunks: &'a [PipelineChunk], chunk_key: &str) -> Result<Vec<&'a Value>> {
    let key = normalize_chunk_key(chunk_key);
    chunks
        .iter()
        .map(|chunk| {
            chunk
                .datum
                .get(key.as_ref())
                .ok_or_else(|| ContractError::MissingChunkKey {
                    chunk_id: chunk.chunk_id.clone(),
                    key: key.to_string(),
                })
        })
        .collect()
}

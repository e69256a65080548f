//! File type descriptors and the registry that acts as the shared vocabulary
//! between contracts and resolution.
//!
//! The registry is an explicit object rather than process-global state so
//! tests can instantiate isolated registries. Registration is idempotent and
//! first-registration-wins: a conflicting re-registration logs a warning and
//! returns the descriptor already on record. Looking up an unregistered id is
//! the only hard failure in this module.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ContractError, Result};

/// Well-known file type ids pre-registered by [`FileTypeRegistry::with_defaults`].
pub mod file_types {
    /// FASTA sequence file.
    pub const FASTA: &str = "Rivet.FileTypes.Fasta";
    /// FASTQ sequence file.
    pub const FASTQ: &str = "Rivet.FileTypes.Fastq";
    /// BAM alignment file.
    pub const BAM: &str = "Rivet.FileTypes.Bam";
    /// GFF annotation file.
    pub const GFF: &str = "Rivet.FileTypes.Gff";
    /// Generic JSON file.
    pub const JSON: &str = "Rivet.FileTypes.Json";
    /// Generic plain-text file.
    pub const TXT: &str = "Rivet.FileTypes.Txt";
    /// Log file.
    pub const LOG: &str = "Rivet.FileTypes.Log";
    /// Comma-separated values.
    pub const CSV: &str = "Rivet.FileTypes.Csv";
}

/// Descriptor for a registered file type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileType {
    /// Globally unique file type id, e.g. `Rivet.FileTypes.Fasta`.
    pub file_type_id: String,
    /// Default base name (without extension) for files of this type.
    pub base_name: String,
    /// File extension, without the leading dot.
    pub ext: String,
    /// MIME type.
    pub mime_type: String,
}

impl FileType {
    /// Create a file type descriptor.
    pub fn new(
        file_type_id: impl Into<String>,
        base_name: impl Into<String>,
        ext: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            file_type_id: file_type_id.into(),
            base_name: base_name.into(),
            ext: ext.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Default file name synthesized from the base name and extension.
    pub fn default_name(&self) -> String {
        format!("{}.{}", self.base_name, self.ext)
    }
}

/// Registry mapping file type ids to their descriptors.
///
/// Writes are expected to happen at startup, before resolution begins; the
/// registry is effectively read-only afterwards.
#[derive(Debug, Default)]
pub struct FileTypeRegistry {
    types: RwLock<HashMap<String, FileType>>,
}

impl FileTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in file types.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(file_types::FASTA, "file", "fasta", "text/plain");
        registry.register(file_types::FASTQ, "file", "fastq", "text/plain");
        registry.register(file_types::BAM, "alignments", "bam", "application/octet-stream");
        registry.register(file_types::GFF, "file", "gff", "text/plain");
        registry.register(file_types::JSON, "file", "json", "application/json");
        registry.register(file_types::TXT, "file", "txt", "text/plain");
        registry.register(file_types::LOG, "file", "log", "text/plain");
        registry.register(file_types::CSV, "file", "csv", "text/csv");
        registry
    }

    /// Register a file type, returning the descriptor on record.
    ///
    /// The first registration of an id wins. Re-registering with identical
    /// attributes is a no-op; re-registering with different attributes logs a
    /// warning and returns the already-registered descriptor, never the new
    /// one. Multiple modules importing overlapping file-type constants is
    /// expected, so this never errors.
    pub fn register(
        &self,
        file_type_id: impl Into<String>,
        base_name: impl Into<String>,
        ext: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> FileType {
        let candidate = FileType::new(file_type_id, base_name, ext, mime_type);
        let mut types = self.types.write();
        match types.get(&candidate.file_type_id) {
            Some(existing) => {
                if *existing != candidate {
                    warn!(
                        file_type_id = %candidate.file_type_id,
                        "Conflicting re-registration of file type; keeping first registration"
                    );
                }
                existing.clone()
            }
            None => {
                types.insert(candidate.file_type_id.clone(), candidate.clone());
                candidate
            }
        }
    }

    /// Look up a file type by id.
    pub fn lookup(&self, file_type_id: &str) -> Result<FileType> {
        self.types
            .read()
            .get(file_type_id)
            .cloned()
            .ok_or_else(|| ContractError::FileTypeNotFound(file_type_id.to_string()))
    }

    /// Whether an id has been registered.
    pub fn is_registered(&self, file_type_id: &str) -> bool {
        self.types.read().contains_key(file_type_id)
    }

    /// Number of registered file types.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

//! Batch collection and acceptance policy.
//!
//! Candidates come from whatever file picker the presentation layer wraps;
//! this module decides what gets into the batch and nothing else.

use thiserror::Error;

/// Only PDF documents are accepted for analysis.
pub const SUPPORTED_DOCUMENT_TYPE: &str = "application/pdf";
/// Size ceiling per document, in bytes.
pub const MAX_DOCUMENT_BYTES: u64 = 100_000_000;

/// A raw file-like input before the acceptance policy has been applied.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub bytes: Vec<u8>,
    pub declared_type: String,
}

/// An accepted document. Immutable once added to the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    bytes: Vec<u8>,
    declared_type: String,
}

impl Document {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Why a candidate was refused. The rendered message names the offending
/// file so the user can act on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchRejection {
    #[error("{name}: only {} documents are supported (got {declared_type})", SUPPORTED_DOCUMENT_TYPE)]
    UnsupportedType { name: String, declared_type: String },
    #[error("{name}: {size} bytes exceeds the {} byte ceiling", MAX_DOCUMENT_BYTES)]
    TooLarge { name: String, size: u64 },
    #[error("{name}: a document with this name is already staged")]
    DuplicateName { name: String },
}

/// Accumulates the batch for one submission. Rejection never mutates the
/// batch; duplicate names are refused outright so the outbound form can key
/// fields by name without ambiguity.
#[derive(Debug, Default)]
pub struct BatchCollector {
    documents: Vec<Document>,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the acceptance policy to one candidate. On success the
    /// candidate becomes a `Document` appended to the batch.
    pub fn add(&mut self, candidate: Candidate) -> Result<(), BatchRejection> {
        if candidate.declared_type != SUPPORTED_DOCUMENT_TYPE {
            return Err(BatchRejection::UnsupportedType {
                name: candidate.name,
                declared_type: candidate.declared_type,
            });
        }
        let size = candidate.bytes.len() as u64;
        if size > MAX_DOCUMENT_BYTES {
            return Err(BatchRejection::TooLarge {
                name: candidate.name,
                size,
            });
        }
        if self.documents.iter().any(|d| d.name == candidate.name) {
            return Err(BatchRejection::DuplicateName {
                name: candidate.name,
            });
        }
        self.documents.push(Document {
            name: candidate.name,
            bytes: candidate.bytes,
            declared_type: candidate.declared_type,
        });
        Ok(())
    }

    /// Re-evaluate a fresh selection against the same policy. The previous
    /// batch is discarded first; rejections for the new set are returned in
    /// input order.
    pub fn replace_all(
        &mut self,
        candidates: impl IntoIterator<Item = Candidate>,
    ) -> Vec<BatchRejection> {
        self.documents.clear();
        candidates
            .into_iter()
            .filter_map(|c| self.add(c).err())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Hand the batch over for submission, leaving the collector empty.
    /// A batch is never reused once submission begins.
    pub fn take_batch(&mut self) -> Vec<Document> {
        std::mem::take(&mut self.documents)
    }
}

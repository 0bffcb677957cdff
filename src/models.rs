use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::DocCoverage;

/// A single chunk of source-file text with provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChunk {
    /// Owning repository slug, e.g. "rust-lang/rust".
    pub repo: String,
    pub file_name: String,
    pub file_path: String,
    /// File extension with leading dot, e.g. ".py".
    pub file_type: String,
    /// Zero-based ordinal within the file.
    pub chunk_index: usize,
    pub content: String,
}

/// A single chat turn sent to the answering model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Process-repository request
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRepoRequest {
    pub url: String,
}

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Summary of the currently processed repository.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub repo: String,
    pub file_count: usize,
    pub chunk_count: usize,
    pub documentation: DocCoverage,
    pub processed_at: DateTime<Utc>,
}

/// Answer to a question plus the chunks used as evidence, in retrieval order.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<FileChunk>,
}

impl QueryResult {
    /// A degraded result carrying an in-band explanation instead of evidence.
    pub fn failed(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
        }
    }
}

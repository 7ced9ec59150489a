//! Error taxonomy for the retrieval core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document not found: {0}")]
    NotFound(usize),

    #[error("Index/corpus mismatch: {0}")]
    IndexCorpusMismatch(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("Corpus has no documents with text to embed")]
    EmptyEmbeddableCorpus,

    #[error("Another build holds the lock at {}; remove it if no build is running", .0.display())]
    BuildInProgress(std::path::PathBuf),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Answerer error: {0}")]
    Answerer(String),

    #[error("Corpus error: {0}")]
    Corpus(#[from] csv::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Failures caused by the caller's input rather than the deployment
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::NotFound(_))
    }

    /// Failures meaning the index on disk cannot serve this corpus
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::IndexCorpusMismatch(_) | Self::CorruptIndex(_))
    }
}

//! tldr-bot library
//!
//! Semantic search over a fixed article corpus, with summaries and grounded
//! answers for the articles it finds.
//!
//! # Modules
//!
//! - `core`: documents, corpus loading, configuration and paths
//! - `search`: vector index, index builder, retriever and serving engine
//! - `assist`: summarization and question answering collaborators

pub mod assist;
pub mod core;
pub mod error;
pub mod search;

// Re-exports for convenience
pub use core::config::Config;
pub use core::corpus::{Corpus, CorpusFingerprint};
pub use core::document::Document;
pub use core::paths::AppPaths;
pub use error::{Result, SearchError};
pub use search::{
    Embedder, HtpEmbedder, IndexBuilder, RankedDocument, Retriever, SearchEngine, VectorIndex,
};

//! Retrieval core
//!
//! - `index`: exact k-NN over embedding vectors, with binary persistence
//! - `builder`: offline corpus → index build
//! - `retriever`: index positions → ranked documents
//! - `engine`: serving state shared by the CLI and the MCP server

pub mod builder;
pub mod catalog;
pub mod embedding;
pub mod engine;
pub mod index;
pub mod retriever;

pub use builder::{BuildLock, EMBEDDER_META_KEY, BuildReport, BuildTargets, IndexBuilder};
pub use catalog::{BuildCatalog, BuildRecord};
pub use embedding::{Embedder, HtpEmbedder, EMBEDDING_DIM};
pub use engine::{SearchEngine, SearchLimits};
pub use index::{Neighbor, VectorIndex};
pub use retriever::{to_score, RankedDocument, Retriever};

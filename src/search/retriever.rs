//! Retriever: VectorIndex + Corpus → ranked documents

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::index::VectorIndex;
use crate::core::corpus::Corpus;
use crate::core::document::Document;
use crate::error::{Result, SearchError};

/// Map a distance in `[0, ∞)` to a relevance score in `(0, 1]`
pub fn to_score(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument<'a> {
    pub document: &'a Document,
    pub distance: f32,
    pub score: f32,
}

/// Read-only search over one index and the corpus it was built from
///
/// Both halves are immutable after construction, so a `Retriever` can be
/// shared across threads without locking.
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    corpus: Arc<Corpus>,
}

impl Retriever {
    /// Pair an index with a corpus, rejecting any misalignment up front
    ///
    /// The index must hold exactly one vector per embeddable document and,
    /// when stamped, carry the same corpus fingerprint.
    pub fn new(index: Arc<VectorIndex>, corpus: Arc<Corpus>) -> Result<Self> {
        if index.size() != corpus.embeddable_len() {
            warn!(
                index_size = index.size(),
                corpus_size = corpus.embeddable_len(),
                "Index and corpus sizes disagree"
            );
            return Err(SearchError::IndexCorpusMismatch(format!(
                "index holds {} vectors but the corpus has {} embeddable documents",
                index.size(),
                corpus.embeddable_len()
            )));
        }

        if let Some(stamped) = index.fingerprint() {
            let current = corpus.fingerprint();
            if *stamped != current {
                warn!(index = %stamped, corpus = %current, "Corpus fingerprint changed since build");
                return Err(SearchError::IndexCorpusMismatch(format!(
                    "index was built from corpus {stamped}, serving corpus is {current}"
                )));
            }
        }

        Ok(Self { index, corpus })
    }

    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<RankedDocument<'_>>> {
        self.index
            .search(query_vector, k)?
            .into_iter()
            .map(|hit| {
                Ok(RankedDocument {
                    document: self.corpus.document_at_position(hit.position)?,
                    distance: hit.distance,
                    score: to_score(hit.distance),
                })
            })
            .collect()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Vector dimension queries must match
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }
}

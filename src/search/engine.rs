//! Search Engine - process-wide serving state
//!
//! Built once at startup and read-only afterwards. Holds the retriever and the
//! injected embedding, summarization and answering collaborators.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::embedding::{Embedder, HtpEmbedder};
use super::index::VectorIndex;
use super::retriever::{RankedDocument, Retriever};
use crate::assist::{
    answer_question, summarize_article, Answerer, ExtractiveSummarizer, OverlapAnswerer, Summarizer,
    SummaryOutcome,
};
use crate::core::config::Config;
use crate::core::corpus::Corpus;
use crate::core::document::Document;
use crate::core::paths::AppPaths;
use crate::error::{Result, SearchError};

/// Search limits applied at the service boundary
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub default_k: usize,
    pub max_k: usize,
    pub min_summary_words: usize,
}

impl From<&Config> for SearchLimits {
    fn from(config: &Config) -> Self {
        Self {
            default_k: config.search.default_k,
            max_k: config.search.max_k,
            min_summary_words: config.summary.min_words,
        }
    }
}

pub struct SearchEngine {
    retriever: Retriever,
    embedder: Box<dyn Embedder>,
    summarizer: Box<dyn Summarizer>,
    answerer: Box<dyn Answerer>,
    limits: SearchLimits,
}

impl SearchEngine {
    pub fn new(
        retriever: Retriever,
        embedder: Box<dyn Embedder>,
        summarizer: Box<dyn Summarizer>,
        answerer: Box<dyn Answerer>,
        limits: SearchLimits,
    ) -> Result<Self> {
        let expected = retriever.dimension();
        if !retriever.index().is_empty() && embedder.dimension() != expected {
            return Err(SearchError::DimensionMismatch {
                expected,
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            retriever,
            embedder,
            summarizer,
            answerer,
            limits,
        })
    }

    /// Load corpus and index from disk and wire up the local collaborators
    pub fn open(paths: &AppPaths, config: &Config) -> Result<Self> {
        let corpus = Corpus::load(&paths.corpus, &config.corpus.default_url)?;
        let index = VectorIndex::load(&paths.index)?;
        let retriever = Retriever::new(Arc::new(index), Arc::new(corpus))?;

        info!(
            documents = retriever.corpus().size(),
            vectors = retriever.index().size(),
            "Search engine ready"
        );

        Self::new(
            retriever,
            Box::new(HtpEmbedder::new()),
            Box::new(ExtractiveSummarizer::new(config.summary.max_sentences)),
            Box::new(OverlapAnswerer),
            SearchLimits::from(config),
        )
    }

    /// Convenience for callers that only know the project root
    pub fn open_root(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root)?;
        let paths = AppPaths::from_root(root.to_path_buf(), &config);
        Ok(Self::open(&paths, &config)?)
    }

    /// Search for articles similar to a natural-language query
    pub fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<RankedDocument<'_>>> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidArgument(
                "query cannot be empty".to_string(),
            ));
        }

        let k = k.unwrap_or(self.limits.default_k);
        if k > self.limits.max_k {
            return Err(SearchError::InvalidArgument(format!(
                "k must be at most {}",
                self.limits.max_k
            )));
        }

        let query_vector = self.embedder.embed(query)?;
        self.retriever.search(&query_vector, k)
    }

    pub fn document(&self, id: usize) -> Result<&Document> {
        self.retriever.corpus().get(id)
    }

    pub fn summarize(&self, id: usize) -> Result<SummaryOutcome> {
        let doc = self.document(id)?;
        Ok(summarize_article(
            self.summarizer.as_ref(),
            doc.text(),
            self.limits.min_summary_words,
        ))
    }

    /// Answer a question using only the text of article `id`
    pub fn ask(&self, id: usize, question: &str) -> Result<String> {
        let doc = self.document(id)?;
        answer_question(self.answerer.as_ref(), question, doc.text())
    }
}

//! Article corpus loaded from a CSV source
//!
//! Every row becomes a [`Document`] whose id is its row offset. The subset of
//! documents that carry text is exposed as the embeddable view; index build
//! and retrieval both go through that one view so vector positions and
//! document ids can never drift apart.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::document::Document;
use crate::error::{Result, SearchError};

pub const DEFAULT_URL: &str = "http://example.com";

#[derive(Debug, Deserialize)]
struct ArticleRow {
    #[serde(rename = "Headline", alias = "headline")]
    headline: String,
    #[serde(rename = "Article text", alias = "article_text", default)]
    article_text: Option<String>,
    #[serde(rename = "Url", alias = "url", default)]
    url: Option<String>,
}

/// SHA-256 digest of the embeddable view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusFingerprint(pub [u8; 32]);

impl CorpusFingerprint {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for CorpusFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Immutable, ordered collection of documents
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    embeddable: Vec<usize>,
}

impl Corpus {
    /// Load a corpus from a CSV file
    pub fn load(path: &Path, default_url: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let corpus = Self::from_reader(file, default_url)?;
        info!(
            path = %path.display(),
            documents = corpus.size(),
            embeddable = corpus.embeddable_len(),
            "Loaded corpus"
        );
        Ok(corpus)
    }

    /// Parse a corpus from any CSV reader with a header row
    pub fn from_reader<R: Read>(reader: R, default_url: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut documents = Vec::new();
        for (id, row) in csv_reader.deserialize::<ArticleRow>().enumerate() {
            let row = row?;
            let url = row
                .url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| default_url.to_string());
            documents.push(Document::new(id, row.headline, row.article_text, url));
        }

        Ok(Self::from_documents(documents))
    }

    /// Build a corpus from documents; ids are reassigned to row order
    pub fn from_documents(mut documents: Vec<Document>) -> Self {
        for (id, doc) in documents.iter_mut().enumerate() {
            doc.id = id;
        }

        let embeddable: Vec<usize> = documents
            .iter()
            .filter(|d| d.is_embeddable())
            .map(|d| d.id)
            .collect();

        let skipped = documents.len() - embeddable.len();
        if skipped > 0 {
            debug!(skipped, "Documents without text excluded from the embeddable view");
        }

        Self {
            documents,
            embeddable,
        }
    }

    pub fn get(&self, id: usize) -> Result<&Document> {
        self.documents.get(id).ok_or(SearchError::NotFound(id))
    }

    pub fn size(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Ids of documents with text, in corpus order
    pub fn embeddable_ids(&self) -> &[usize] {
        &self.embeddable
    }

    pub fn embeddable_len(&self) -> usize {
        self.embeddable.len()
    }

    /// Iterate documents with text, in corpus order
    pub fn embeddable(&self) -> impl Iterator<Item = &Document> {
        self.embeddable.iter().map(move |&id| &self.documents[id])
    }

    /// Document owning the vector at `position` of an index built from this corpus
    pub fn document_at_position(&self, position: usize) -> Result<&Document> {
        let id = self.embeddable.get(position).copied().ok_or_else(|| {
            SearchError::IndexCorpusMismatch(format!(
                "index position {position} has no embeddable document ({} available)",
                self.embeddable.len()
            ))
        })?;
        self.get(id)
    }

    /// Fingerprint of the embeddable view: ids, headlines and full texts
    ///
    /// Fields are length-prefixed, so no two distinct views share an encoding.
    pub fn fingerprint(&self) -> CorpusFingerprint {
        let mut hasher = Sha256::new();
        for doc in self.embeddable() {
            hasher.update((doc.id as u64).to_le_bytes());
            for field in [doc.headline.as_str(), doc.text().unwrap_or_default()] {
                hasher.update((field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        CorpusFingerprint(hasher.finalize().into())
    }
}

//! Offline index build: embed the corpus, persist the index

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::catalog::{BuildCatalog, BuildRecord};
use super::embedding::Embedder;
use super::index::{save_embedding_matrix, VectorIndex};
use crate::core::corpus::Corpus;
use crate::error::{Result, SearchError};

const BATCH_SIZE: usize = 500;

/// Where a build writes its artifacts
#[derive(Debug, Clone)]
pub struct BuildTargets {
    pub index: PathBuf,
    /// Raw embedding matrix, written only when set
    pub embeddings: Option<PathBuf>,
}

/// Outcome of a persisted build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: usize,
    pub dimension: usize,
    pub fingerprint: String,
    pub duration_ms: u128,
}

/// Exclusive build lock: `<index>.lock`, removed on drop
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    pub fn acquire(index_path: &Path) -> Result<Self> {
        let mut name = index_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        let path = index_path.with_file_name(name);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SearchError::BuildInProgress(path));
            }
            Err(e) => return Err(e.into()),
        };
        let lock = Self { path };
        writeln!(file, "{}", std::process::id())?;

        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to release build lock");
        }
    }
}

/// Catalog meta key naming the embedder of the latest build
pub const EMBEDDER_META_KEY: &str = "embedder";

pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    /// Embed every document with text, in corpus order
    ///
    /// Fails with `EmptyEmbeddableCorpus` instead of producing an empty index.
    pub fn embed_corpus(&self, corpus: &Corpus) -> Result<Vec<Vec<f32>>> {
        if corpus.embeddable_len() == 0 {
            return Err(SearchError::EmptyEmbeddableCorpus);
        }

        // embeddable() only yields documents with text
        let texts: Vec<&str> = corpus
            .embeddable()
            .map(|doc| doc.text().unwrap_or_default())
            .collect();

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let embedded = self.embedder.embed_batch(batch)?;
            if embedded.len() != batch.len() {
                return Err(SearchError::Embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    embedded.len(),
                    batch.len()
                )));
            }

            for vector in embedded {
                if let Some(first) = vectors.first() {
                    if vector.len() != first.len() {
                        return Err(SearchError::DimensionMismatch {
                            expected: first.len(),
                            actual: vector.len(),
                        });
                    }
                }
                vectors.push(vector);
            }

            debug!(embedded = vectors.len(), total = texts.len(), "Embedding corpus");
        }

        Ok(vectors)
    }

    /// Build an in-memory index stamped with the corpus fingerprint
    pub fn build(&self, corpus: &Corpus) -> Result<VectorIndex> {
        let vectors = self.embed_corpus(corpus)?;
        Ok(VectorIndex::build(vectors)?.with_fingerprint(corpus.fingerprint()))
    }

    /// Build, persist and record in the catalog
    ///
    /// Holds the build lock throughout. Nothing is written unless every vector
    /// passes validation; the index goes first, then the raw matrix. Both files
    /// are replaced atomically, so readers see either the previous or the new
    /// index.
    pub fn build_and_save(
        &self,
        corpus: &Corpus,
        targets: &BuildTargets,
        catalog: Option<&BuildCatalog>,
    ) -> Result<BuildReport> {
        let start = Instant::now();
        let _lock = BuildLock::acquire(&targets.index)?;

        let vectors = self.embed_corpus(corpus)?;
        let fingerprint = corpus.fingerprint();

        let index = VectorIndex::build(vectors)?.with_fingerprint(fingerprint);
        index.save(&targets.index)?;

        if let Some(path) = &targets.embeddings {
            save_embedding_matrix(path, &index)?;
            debug!(path = %path.display(), "Saved raw embedding matrix");
        }

        let report = BuildReport {
            indexed: index.size(),
            skipped: corpus.size() - corpus.embeddable_len(),
            dimension: index.dimension(),
            fingerprint: fingerprint.to_hex(),
            duration_ms: start.elapsed().as_millis(),
        };

        if let Some(catalog) = catalog {
            catalog.record_build(&BuildRecord {
                built_at: chrono::Utc::now().timestamp(),
                index_path: targets.index.to_string_lossy().to_string(),
                vector_count: report.indexed,
                dimension: report.dimension,
                skipped: report.skipped,
                corpus_size: corpus.size(),
                fingerprint: report.fingerprint.clone(),
                duration_ms: report.duration_ms as i64,
            })?;
            catalog.set_meta(EMBEDDER_META_KEY, self.embedder.name())?;
        }

        info!(
            indexed = report.indexed,
            skipped = report.skipped,
            dimension = report.dimension,
            duration_ms = report.duration_ms as u64,
            "Index build complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Two-dimensional embedder keyed on the first word of the text
    struct TableEmbedder;

    impl Embedder for TableEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            match text.split_whitespace().next() {
                Some("east") => Ok(vec![1.0, 0.0]),
                Some("north") => Ok(vec![0.0, 1.0]),
                Some("northeast") => Ok(vec![1.0, 1.0]),
                other => Err(SearchError::Embedding(format!("unknown text {other:?}"))),
            }
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    /// Changes output dimension after the first call
    struct DriftingEmbedder {
        calls: AtomicUsize,
    }

    impl Embedder for DriftingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.5; 2 + call])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    /// Valid dimension, but the first component is NaN
    struct NanEmbedder;

    impl Embedder for NanEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![f32::NAN, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn doc(headline: &str, text: Option<&str>) -> Document {
        Document::new(0, headline, text.map(String::from), "http://example.com")
    }

    #[test]
    fn test_skips_textless_documents() -> Result<()> {
        let corpus = Corpus::from_documents(vec![
            doc("A", Some("east wind")),
            doc("B", None),
            doc("C", Some("north star")),
        ]);

        let index = IndexBuilder::new(&TableEmbedder).build(&corpus)?;
        assert_eq!(index.size(), 2);
        assert_eq!(index.vector(1), Some(&[0.0, 1.0][..]));
        assert_eq!(corpus.get(1)?.headline, "B");
        assert_eq!(index.fingerprint(), Some(&corpus.fingerprint()));
        Ok(())
    }

    #[test]
    fn test_inconsistent_dimensions_abort() {
        let corpus = Corpus::from_documents(vec![doc("A", Some("one")), doc("B", Some("two"))]);
        let embedder = DriftingEmbedder {
            calls: AtomicUsize::new(0),
        };

        assert!(matches!(
            IndexBuilder::new(&embedder).build(&corpus),
            Err(SearchError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_empty_embeddable_corpus_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let targets = BuildTargets {
            index: dir.path().join("index.bin"),
            embeddings: Some(dir.path().join("embeddings.bin")),
        };
        let corpus = Corpus::from_documents(vec![doc("A", None), doc("B", Some("  "))]);

        let result = IndexBuilder::new(&TableEmbedder).build_and_save(&corpus, &targets, None);
        assert!(matches!(result, Err(SearchError::EmptyEmbeddableCorpus)));
        assert!(!targets.index.exists());
        assert!(!dir.path().join("embeddings.bin").exists());
        Ok(())
    }

    #[test]
    fn test_embedding_failure_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let targets = BuildTargets {
            index: dir.path().join("index.bin"),
            embeddings: None,
        };
        let corpus = Corpus::from_documents(vec![doc("A", Some("east")), doc("B", Some("sideways"))]);

        let result = IndexBuilder::new(&TableEmbedder).build_and_save(&corpus, &targets, None);
        assert!(matches!(result, Err(SearchError::Embedding(_))));
        assert!(!targets.index.exists());
        Ok(())
    }

    #[test]
    fn test_non_finite_embedding_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let targets = BuildTargets {
            index: dir.path().join("index.bin"),
            embeddings: Some(dir.path().join("embeddings.bin")),
        };
        let corpus = Corpus::from_documents(vec![doc("A", Some("anything"))]);

        let result = IndexBuilder::new(&NanEmbedder).build_and_save(&corpus, &targets, None);
        assert!(matches!(result, Err(SearchError::InvalidArgument(_))));
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_concurrent_build_is_refused() -> Result<()> {
        let dir = TempDir::new()?;
        let targets = BuildTargets {
            index: dir.path().join("index.bin"),
            embeddings: None,
        };
        let corpus = Corpus::from_documents(vec![doc("A", Some("east"))]);

        let held = BuildLock::acquire(&targets.index)?;
        let result = IndexBuilder::new(&TableEmbedder).build_and_save(&corpus, &targets, None);
        assert!(matches!(result, Err(SearchError::BuildInProgress(ref p)) if p == held.path()));
        assert!(!targets.index.exists());

        drop(held);
        IndexBuilder::new(&TableEmbedder).build_and_save(&corpus, &targets, None)?;
        assert!(targets.index.exists());
        assert!(!dir.path().join("index.bin.lock").exists());
        Ok(())
    }

    #[test]
    fn test_build_and_save_records_catalog() -> Result<()> {
        let dir = TempDir::new()?;
        let targets = BuildTargets {
            index: dir.path().join("index.bin"),
            embeddings: Some(dir.path().join("embeddings.bin")),
        };
        let catalog = BuildCatalog::open_in_memory()?;
        let corpus = Corpus::from_documents(vec![
            doc("A", Some("east")),
            doc("B", None),
            doc("C", Some("northeast")),
        ]);

        let report = IndexBuilder::new(&TableEmbedder).build_and_save(&corpus, &targets, Some(&catalog))?;
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.dimension, 2);

        let loaded = VectorIndex::load(&targets.index)?;
        assert_eq!(loaded.size(), 2);
        assert!(dir.path().join("embeddings.bin").exists());

        let latest = catalog.latest_build()?.expect("build recorded");
        assert_eq!(latest.vector_count, 2);
        assert_eq!(latest.corpus_size, 3);
        assert_eq!(latest.fingerprint, report.fingerprint);
        assert_eq!(catalog.get_meta(EMBEDDER_META_KEY)?, Some("unnamed".to_string()));
        Ok(())
    }
}

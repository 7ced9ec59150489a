// End-to-end retrieval: CSV corpus on disk, persisted index, serving engine.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use tldr_bot::search::{BuildCatalog, BuildTargets, HtpEmbedder, IndexBuilder, VectorIndex};
use tldr_bot::{AppPaths, Config, Corpus, SearchEngine, SearchError};

const VOLCANO: &str = "A volcano erupted near the coastal village, sending ash over the harbour.";
const ELECTION: &str = "Voters returned the mayor to office after a close municipal election count.";
const MARKETS: &str = "Stock markets rallied as central bank officials signalled lower interest rates.";

fn write_corpus(root: &Path, rows: &[(&str, &str, &str)]) {
    let mut writer = csv::Writer::from_path(root.join("articles.csv")).expect("can create csv");
    writer
        .write_record(["Headline", "Article text", "Url"])
        .expect("can write header");
    for (headline, text, url) in rows {
        writer.write_record([headline, text, url]).expect("can write row");
    }
    writer.flush().expect("can flush csv");
}

fn setup(rows: &[(&str, &str, &str)]) -> (TempDir, Config, AppPaths) {
    let temp_dir = TempDir::new().expect("can create temp dir");
    fs::write(
        temp_dir.path().join("tldr.toml"),
        "[corpus]\npath = \"articles.csv\"\n\n[search]\ndefault_k = 2\nmax_k = 5\n",
    )
    .expect("can write config");
    write_corpus(temp_dir.path(), rows);

    let config = Config::load(temp_dir.path()).expect("can load config");
    let paths = AppPaths::from_root(temp_dir.path().to_path_buf(), &config);
    (temp_dir, config, paths)
}

fn build_index(config: &Config, paths: &AppPaths) {
    let corpus = Corpus::load(&paths.corpus, &config.corpus.default_url).expect("can load corpus");
    let catalog = BuildCatalog::open(&paths.catalog).expect("can open catalog");
    let targets = BuildTargets {
        index: paths.index.clone(),
        embeddings: None,
    };
    let embedder = HtpEmbedder::new();
    IndexBuilder::new(&embedder)
        .build_and_save(&corpus, &targets, Some(&catalog))
        .expect("can build index");
}

fn default_rows() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("Volcano erupts", VOLCANO, "http://news.test/volcano"),
        ("Untitled wire item", "", ""),
        ("Mayor re-elected", ELECTION, "http://news.test/election"),
        ("Markets rally", MARKETS, "http://news.test/markets"),
    ]
}

#[test]
fn build_then_serve_round_trip() {
    let (_temp_dir, config, paths) = setup(&default_rows());
    build_index(&config, &paths);

    let index = VectorIndex::load(&paths.index).expect("can load index");
    assert_eq!(index.size(), 3);
    assert!(index.fingerprint().is_some());

    let engine = SearchEngine::open(&paths, &config).expect("engine opens");
    let results = engine.search(ELECTION, Some(3)).expect("search succeeds");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].document.id, 2);
    assert_eq!(results[0].distance, 0.0);
    assert_eq!(results[0].score, 1.0);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    assert!(results.iter().all(|r| r.document.id != 1));
}

#[test]
fn default_and_max_k_come_from_config() {
    let (_temp_dir, config, paths) = setup(&default_rows());
    build_index(&config, &paths);
    let engine = SearchEngine::open(&paths, &config).expect("engine opens");

    assert_eq!(engine.search("volcano ash", None).expect("search succeeds").len(), 2);
    assert!(matches!(
        engine.search("volcano ash", Some(6)),
        Err(SearchError::InvalidArgument(_))
    ));
}

#[test]
fn textless_article_is_still_addressable() {
    let (_temp_dir, config, paths) = setup(&default_rows());
    build_index(&config, &paths);
    let engine = SearchEngine::open(&paths, &config).expect("engine opens");

    let doc = engine.document(1).expect("document exists");
    assert_eq!(doc.headline, "Untitled wire item");
    assert_eq!(doc.url, "http://example.com");
    assert_eq!(doc.display_text(), "No text available.");

    assert!(matches!(engine.document(4), Err(SearchError::NotFound(4))));
}

#[test]
fn reordered_corpus_is_rejected() {
    let (temp_dir, config, paths) = setup(&default_rows());
    build_index(&config, &paths);

    let mut rows = default_rows();
    rows.swap(0, 2);
    write_corpus(temp_dir.path(), &rows);

    match SearchEngine::open(&paths, &config) {
        Err(err) => {
            assert!(matches!(err, SearchError::IndexCorpusMismatch(_)));
            assert!(err.is_unavailable());
        }
        Ok(_) => panic!("engine should refuse a reordered corpus"),
    }
}

#[test]
fn catalog_records_the_build() {
    let (_temp_dir, config, paths) = setup(&default_rows());
    build_index(&config, &paths);

    let catalog = BuildCatalog::open(&paths.catalog).expect("can open catalog");
    let record = catalog
        .latest_build()
        .expect("can query catalog")
        .expect("a build was recorded");

    assert_eq!(record.vector_count, 3);
    assert_eq!(record.skipped, 1);
    assert_eq!(record.corpus_size, 4);
    assert_eq!(record.dimension, 384);
}

#[test]
fn corpus_without_text_refuses_to_build() {
    let (_temp_dir, config, paths) = setup(&[("Only a headline", "", "")]);
    let corpus = Corpus::load(&paths.corpus, &config.corpus.default_url).expect("can load corpus");
    let embedder = HtpEmbedder::new();
    let targets = BuildTargets {
        index: paths.index.clone(),
        embeddings: None,
    };

    let result = IndexBuilder::new(&embedder).build_and_save(&corpus, &targets, None);
    assert!(matches!(result, Err(SearchError::EmptyEmbeddableCorpus)));
    assert!(!paths.index.exists());
}

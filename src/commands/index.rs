//! Index command - Build the article vector index

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use tldr_bot::search::{
    BuildCatalog, BuildTargets, Embedder, HtpEmbedder, IndexBuilder, Retriever, VectorIndex,
    EMBEDDER_META_KEY,
};
use tldr_bot::{AppPaths, Config, Corpus, SearchError};

/// Run index command
pub fn run(root: Option<PathBuf>, status_only: bool, rebuild: bool, json: bool) -> Result<()> {
    let (config, paths) = super::project(root)?;

    if status_only {
        return show_status(&paths, json);
    }

    if !paths.corpus.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "error": "Corpus not found",
                    "corpus_path": paths.corpus.display().to_string(),
                })
            );
        } else {
            eprintln!(
                "{} Corpus not found at: {}",
                "Error:".red().bold(),
                paths.corpus.display()
            );
            eprintln!("Set [corpus] path in tldr.toml or place the CSV at the default location.");
        }
        std::process::exit(1);
    }

    let corpus = Corpus::load(&paths.corpus, &config.corpus.default_url)
        .with_context(|| format!("Failed to load corpus: {}", paths.corpus.display()))?;

    if !rebuild && index_is_current(&paths, &corpus, &HtpEmbedder::new()) {
        if json {
            println!("{}", serde_json::json!({ "up_to_date": true }));
        } else {
            println!(
                "{} Index is up to date. Use {} to rebuild anyway.",
                "✓".green().bold(),
                "--rebuild".cyan()
            );
        }
        return Ok(());
    }

    if !json {
        println!("{} Building article index...", "→".dimmed());
    }

    let report = build(&config, &paths, &corpus)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": report.indexed,
                "skipped": report.skipped,
                "dimension": report.dimension,
                "fingerprint": report.fingerprint,
                "duration_ms": report.duration_ms,
            })
        );
    } else {
        println!();
        println!(
            "{} Indexed {} articles in {:.2}s",
            "✓".green().bold(),
            report.indexed.to_string().cyan(),
            report.duration_ms as f64 / 1000.0
        );
        if report.skipped > 0 {
            println!(
                "  {} {} articles skipped (no text)",
                "→".dimmed(),
                report.skipped
            );
        }
        println!("  {} Index saved to: {}", "→".dimmed(), paths.index.display());
    }

    Ok(())
}

fn build(config: &Config, paths: &AppPaths, corpus: &Corpus) -> Result<tldr_bot::search::BuildReport> {
    let embedder = HtpEmbedder::new();
    let catalog = BuildCatalog::open(&paths.catalog)
        .with_context(|| format!("Failed to open build catalog: {}", paths.catalog.display()))?;
    let targets = BuildTargets {
        index: paths.index.clone(),
        embeddings: config
            .index
            .save_embeddings
            .then(|| paths.embeddings.clone()),
    };

    match IndexBuilder::new(&embedder).build_and_save(corpus, &targets, Some(&catalog)) {
        Ok(report) => Ok(report),
        Err(SearchError::EmptyEmbeddableCorpus) => {
            anyhow::bail!(
                "No articles with text in {}; refusing to write an empty index",
                paths.corpus.display()
            )
        }
        Err(e) => Err(e.into()),
    }
}

/// Current means: stamped for this corpus and built by the embedder in use
fn index_is_current(paths: &AppPaths, corpus: &Corpus, embedder: &dyn Embedder) -> bool {
    if !paths.index.exists() || !paths.catalog.exists() {
        return false;
    }
    let built_with = BuildCatalog::open(&paths.catalog)
        .and_then(|catalog| catalog.get_meta(EMBEDDER_META_KEY));
    if !matches!(built_with, Ok(Some(name)) if name == embedder.name()) {
        return false;
    }
    match VectorIndex::load(&paths.index) {
        Ok(index) => index.fingerprint().is_some()
            && Retriever::new(Arc::new(index), Arc::new(corpus.clone())).is_ok(),
        Err(_) => false,
    }
}

/// Show index status
fn show_status(paths: &AppPaths, json: bool) -> Result<()> {
    if !paths.index.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "error": "Index not found"
                })
            );
        } else {
            println!(
                "{} Index not found. Run {} first.",
                "!".yellow().bold(),
                "tldr index".cyan()
            );
        }
        return Ok(());
    }

    let catalog = BuildCatalog::open(&paths.catalog)?;
    let latest = catalog.latest_build()?;
    let stats = catalog.get_stats()?;
    let file_size = std::fs::metadata(&paths.index).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "builds": stats.build_count,
                "vector_count": latest.as_ref().map(|b| b.vector_count),
                "dimension": latest.as_ref().map(|b| b.dimension),
                "skipped": latest.as_ref().map(|b| b.skipped),
                "fingerprint": latest.as_ref().map(|b| b.fingerprint.clone()),
                "last_built": stats.last_built,
                "file_size_bytes": file_size,
            })
        );
        return Ok(());
    }

    println!("{}", "Index Status".bold());
    println!();
    match &latest {
        Some(build) => {
            println!(
                "  {} {} vectors ({} dims)",
                "→".dimmed(),
                build.vector_count.to_string().cyan(),
                build.dimension
            );
            println!("  {} {} articles skipped (no text)", "→".dimmed(), build.skipped);
            println!("  {} Corpus fingerprint: {}", "→".dimmed(), super::truncate(&build.fingerprint, 16));
        }
        None => println!("  {} No builds recorded in catalog", "!".yellow()),
    }
    println!("  {} Size: {:.2} KB", "→".dimmed(), file_size as f64 / 1024.0);
    if let Some(ts) = stats.last_built {
        let dt = chrono::DateTime::from_timestamp(ts, 0)
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        println!("  {} Last built: {}", "→".dimmed(), dt);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tldr_bot::Document;

    fn corpus() -> Corpus {
        Corpus::from_documents(vec![
            Document::new(0, "Harbour ash", Some("Ash covered the harbour.".to_string()), "u0"),
            Document::new(1, "Recount", Some("The recount confirmed the mayor.".to_string()), "u1"),
        ])
    }

    #[test]
    fn test_index_is_current_tracks_embedder() -> Result<()> {
        let dir = TempDir::new()?;
        let config = Config::default();
        let paths = AppPaths::from_root(dir.path().to_path_buf(), &config);
        let corpus = corpus();
        let embedder = HtpEmbedder::new();

        assert!(!index_is_current(&paths, &corpus, &embedder));

        build(&config, &paths, &corpus)?;
        assert!(index_is_current(&paths, &corpus, &embedder));

        BuildCatalog::open(&paths.catalog)?.set_meta(EMBEDDER_META_KEY, "some-other-model")?;
        assert!(!index_is_current(&paths, &corpus, &embedder));
        Ok(())
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use colored::*;
use serde::Serialize;

use tldr_bot::search::{Retriever, VectorIndex};
use tldr_bot::Corpus;

#[derive(Serialize)]
struct ServingStatus {
    corpus_path: String,
    corpus_documents: Option<usize>,
    embeddable_documents: Option<usize>,
    index_path: String,
    index_vectors: Option<usize>,
    index_dimension: Option<usize>,
    ready: bool,
    problem: Option<String>,
}

pub fn run(root: Option<PathBuf>, json: bool) -> Result<()> {
    let (config, paths) = super::project(root)?;

    let corpus = Corpus::load(&paths.corpus, &config.corpus.default_url);
    let index = VectorIndex::load(&paths.index);

    let problem = match (&corpus, &index) {
        (Err(e), _) => Some(format!("corpus unavailable: {e}")),
        (_, Err(e)) => Some(format!("index unavailable: {e}")),
        (Ok(corpus), Ok(index)) => {
            Retriever::new(Arc::new(index.clone()), Arc::new(corpus.clone()))
                .err()
                .map(|e| e.to_string())
        }
    };

    let status = ServingStatus {
        corpus_path: paths.corpus.display().to_string(),
        corpus_documents: corpus.as_ref().ok().map(Corpus::size),
        embeddable_documents: corpus.as_ref().ok().map(Corpus::embeddable_len),
        index_path: paths.index.display().to_string(),
        index_vectors: index.as_ref().ok().map(VectorIndex::size),
        index_dimension: index.as_ref().ok().map(VectorIndex::dimension),
        ready: problem.is_none(),
        problem,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Serving Status".bold());
    println!("{}", "=".repeat(60));
    println!("Corpus: {}", status.corpus_path);
    if let (Some(total), Some(embeddable)) = (status.corpus_documents, status.embeddable_documents) {
        println!("  {} articles, {} with text", total.to_string().cyan(), embeddable);
    }
    println!("Index:  {}", status.index_path);
    if let (Some(vectors), Some(dimension)) = (status.index_vectors, status.index_dimension) {
        println!("  {} vectors, {} dims", vectors.to_string().cyan(), dimension);
    }
    println!();

    match &status.problem {
        None => println!("{}", "✓ Ready to serve".green()),
        Some(problem) => {
            println!("{} {}", "✗ Not ready:".red().bold(), problem);
            println!("  Run {} to rebuild the index.", "tldr index --rebuild".cyan());
        }
    }

    Ok(())
}

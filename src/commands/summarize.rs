//! Summarize command - summary of one article

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use tldr_bot::assist::SummaryOutcome;
use tldr_bot::SearchEngine;

pub fn run(root: Option<PathBuf>, id: usize, json: bool) -> Result<()> {
    let (config, paths) = super::project(root)?;
    let engine = SearchEngine::open(&paths, &config)?;

    let doc = engine.document(id)?;
    let outcome = engine.summarize(id)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "article_id": id,
                "headline": doc.headline,
                "outcome": outcome,
            })
        );
        return Ok(());
    }

    println!("{}", doc.headline.bold());
    println!("{}", doc.url.dimmed());
    println!();
    match &outcome {
        SummaryOutcome::Summarized { summary } => println!("{summary}"),
        SummaryOutcome::TooShort { .. } => println!("{}", outcome.to_string().yellow()),
        SummaryOutcome::SummarizerError { .. } => println!("{}", outcome.to_string().red()),
    }

    Ok(())
}

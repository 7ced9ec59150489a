//! Search command - semantic article search

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use tldr_bot::SearchEngine;

/// Run semantic search command
pub fn run(root: Option<PathBuf>, query: &str, k: Option<usize>, json: bool) -> Result<()> {
    let (config, paths) = super::project(root)?;
    let engine = SearchEngine::open(&paths, &config)?;
    let results = engine.search(query, k)?;

    if json {
        let json_results: Vec<_> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.document.id,
                    "headline": r.document.headline,
                    "url": r.document.url,
                    "distance": r.distance,
                    "score": r.score,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        results.len(),
        query.cyan()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let score_str = format!("{:.2}", result.score);
        let score_colored = if result.score > 0.8 {
            score_str.green()
        } else if result.score > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] {} {}",
            (i + 1).to_string().bold(),
            score_colored,
            result.document.headline.cyan(),
            format!("(#{})", result.document.id).dimmed()
        );
        println!("   {}", super::truncate(result.document.display_text(), 100).dimmed());
        println!("   {}", result.document.url);
        println!();
    }

    Ok(())
}

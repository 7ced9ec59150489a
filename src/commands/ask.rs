//! Ask command - question answered from one article's text

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use tldr_bot::assist::CANNOT_FIND_ANSWER;
use tldr_bot::SearchEngine;

pub fn run(root: Option<PathBuf>, id: usize, question: &str, json: bool) -> Result<()> {
    let (config, paths) = super::project(root)?;
    let engine = SearchEngine::open(&paths, &config)?;

    let answer = engine.ask(id, question)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "article_id": id,
                "question": question,
                "answer": answer,
                "found": answer != CANNOT_FIND_ANSWER,
            })
        );
    } else if answer == CANNOT_FIND_ANSWER {
        println!("{}", answer.yellow());
    } else {
        println!("{} {}", "→".dimmed(), answer);
    }

    Ok(())
}

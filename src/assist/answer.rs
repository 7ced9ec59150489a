//! Grounded question answering collaborator

use std::collections::HashSet;

use super::{split_sentences, STOPWORDS};
use crate::error::{Result, SearchError};
use crate::search::embedding::tokenize;

/// Returned whenever the answer is not derivable from the context
pub const CANNOT_FIND_ANSWER: &str = "I cannot find the answer in this article.";

const QUESTION_WORDS: &[&str] = &["what", "who", "whom", "whose", "when", "where", "why", "how", "which"];

/// (question, context) → answer grounded in the context, or [`CANNOT_FIND_ANSWER`]
pub trait Answerer: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<String>;
}

/// Validate the question and route absent context straight to the sentinel
pub fn answer_question(answerer: &dyn Answerer, question: &str, context: Option<&str>) -> Result<String> {
    let question = question.trim();
    if question.is_empty() {
        return Err(SearchError::InvalidArgument(
            "question cannot be empty".to_string(),
        ));
    }

    match context {
        Some(context) if !context.trim().is_empty() => answerer.answer(question, context),
        _ => Ok(CANNOT_FIND_ANSWER.to_string()),
    }
}

/// Picks the context sentence sharing the most content words with the question
#[derive(Debug, Clone, Default)]
pub struct OverlapAnswerer;

impl Answerer for OverlapAnswerer {
    fn answer(&self, question: &str, context: &str) -> Result<String> {
        let ignored: HashSet<&str> = STOPWORDS.iter().chain(QUESTION_WORDS).copied().collect();
        let keywords: HashSet<String> = tokenize(question)
            .into_iter()
            .filter(|w| !ignored.contains(w.as_str()))
            .collect();

        if keywords.is_empty() {
            return Ok(CANNOT_FIND_ANSWER.to_string());
        }

        let mut best: Option<(usize, &str)> = None;
        for sentence in split_sentences(context) {
            let words: HashSet<String> = tokenize(sentence).into_iter().collect();
            let overlap = keywords.intersection(&words).count();
            if overlap > 0 && best.map_or(true, |(top, _)| overlap > top) {
                best = Some((overlap, sentence));
            }
        }

        Ok(best
            .map(|(_, sentence)| sentence.to_string())
            .unwrap_or_else(|| CANNOT_FIND_ANSWER.to_string()))
    }
}

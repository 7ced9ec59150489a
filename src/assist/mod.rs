//! Summarization and question answering around retrieved articles
//!
//! Both collaborators sit behind traits so a model-backed implementation can
//! replace the local extractive ones without touching callers.

pub mod answer;
pub mod summarize;

pub use answer::{answer_question, Answerer, OverlapAnswerer, CANNOT_FIND_ANSWER};
pub use summarize::{summarize_article, ExtractiveSummarizer, Summarizer, SummaryOutcome};

pub(crate) const STOPWORDS: &[&str] = &[
    "a", "about", "after", "also", "an", "and", "are", "as", "at", "be", "been", "before", "being",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "i", "if", "in", "into", "is", "it", "its", "many", "me", "more", "most", "much",
    "my", "no", "not", "of", "on", "or", "our", "over", "s", "she", "should", "so", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "to", "was", "we",
    "were", "will", "with", "would", "you", "your",
];

/// Split text into trimmed sentences ending in `.`, `!` or `?`
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

//! Summarization collaborator and its result wrapper

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::{split_sentences, STOPWORDS};
use crate::error::Result;
use crate::search::embedding::tokenize;

/// Text → summary
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String>;
}

/// Tagged outcome of a summary attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summarized { summary: String },
    TooShort { words: usize, min_words: usize },
    SummarizerError { message: String },
}

impl SummaryOutcome {
    pub fn summary(&self) -> Option<&str> {
        match self {
            Self::Summarized { summary } => Some(summary),
            _ => None,
        }
    }
}

impl fmt::Display for SummaryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summarized { summary } => write!(f, "{summary}"),
            Self::TooShort { words, min_words } => write!(
                f,
                "Warning: Article is too short to summarize ({words} words, more than {min_words} needed)."
            ),
            Self::SummarizerError { message } => {
                write!(f, "Error: Could not generate summary. ({message})")
            }
        }
    }
}

/// Run `summarizer` on `text` unless it has `min_words` words or fewer
pub fn summarize_article(
    summarizer: &dyn Summarizer,
    text: Option<&str>,
    min_words: usize,
) -> SummaryOutcome {
    let text = text.unwrap_or_default();
    let words = text.split_whitespace().count();
    if words <= min_words {
        return SummaryOutcome::TooShort { words, min_words };
    }

    match summarizer.summarize(text) {
        Ok(summary) if summary.trim().is_empty() => SummaryOutcome::SummarizerError {
            message: "summarizer returned an empty result".to_string(),
        },
        Ok(summary) => SummaryOutcome::Summarized {
            summary: summary.trim().to_string(),
        },
        Err(e) => {
            debug!(error = %e, "Summarizer failed");
            SummaryOutcome::SummarizerError {
                message: e.to_string(),
            }
        }
    }
}

/// Frequency-scored extractive summarizer
///
/// Sentences are scored by the mean corpus frequency of their content words;
/// the best `max_sentences` are returned in their original order.
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    max_sentences: usize,
}

impl ExtractiveSummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        let sentences = split_sentences(text);
        if sentences.len() <= self.max_sentences {
            return Ok(sentences.join(" "));
        }

        let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();
        let content_words = |s: &str| -> Vec<String> {
            tokenize(s)
                .into_iter()
                .filter(|w| !stopwords.contains(w.as_str()))
                .collect()
        };

        let mut frequency: HashMap<String, usize> = HashMap::new();
        for &sentence in &sentences {
            for word in content_words(sentence) {
                *frequency.entry(word).or_insert(0) += 1;
            }
        }

        let mut scored: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(i, &sentence)| {
                let words = content_words(sentence);
                let score = if words.is_empty() {
                    0.0
                } else {
                    words.iter().map(|w| frequency[w] as f64).sum::<f64>() / words.len() as f64
                };
                (i, score)
            })
            .collect();

        // Highest score first, earlier sentence on ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut chosen: Vec<usize> = scored.iter().take(self.max_sentences).map(|(i, _)| *i).collect();
        chosen.sort_unstable();

        Ok(chosen
            .into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    struct FixedSummarizer(&'static str);

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, _text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _text: &str) -> Result<String> {
            Err(SearchError::Summarizer("model unavailable".to_string()))
        }
    }

    fn long_text(words: usize) -> String {
        vec!["word"; words].join(" ")
    }

    #[test]
    fn test_too_short() {
        let text = long_text(40);
        let outcome = summarize_article(&FixedSummarizer("summary"), Some(&text), 40);
        assert_eq!(outcome, SummaryOutcome::TooShort { words: 40, min_words: 40 });
        assert!(outcome.summary().is_none());
        assert!(outcome.to_string().starts_with("Warning:"));
    }

    #[test]
    fn test_absent_text_is_too_short() {
        let outcome = summarize_article(&FixedSummarizer("summary"), None, 40);
        assert_eq!(outcome, SummaryOutcome::TooShort { words: 0, min_words: 40 });
    }

    #[test]
    fn test_summarized() {
        let text = long_text(41);
        let outcome = summarize_article(&FixedSummarizer("  The gist. "), Some(&text), 40);
        assert_eq!(outcome.summary(), Some("The gist."));
        assert_eq!(outcome.to_string(), "The gist.");
    }

    #[test]
    fn test_empty_result_is_an_error() {
        let text = long_text(50);
        let outcome = summarize_article(&FixedSummarizer(""), Some(&text), 40);
        assert!(matches!(outcome, SummaryOutcome::SummarizerError { .. }));
    }

    #[test]
    fn test_failure_is_tagged() {
        let text = long_text(50);
        let outcome = summarize_article(&FailingSummarizer, Some(&text), 40);
        assert_eq!(
            outcome,
            SummaryOutcome::SummarizerError {
                message: "Summarizer error: model unavailable".to_string()
            }
        );
        assert!(outcome.to_string().starts_with("Error:"));
    }

    #[test]
    fn test_outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(SummaryOutcome::TooShort { words: 3, min_words: 40 }).unwrap();
        assert_eq!(json["kind"], "too_short");
        assert_eq!(json["words"], 3);
    }

    #[test]
    fn test_extractive_keeps_order_and_limit() {
        let text = "The flood hit the valley. Rescue teams reached the valley flood zone. \
                    A cat slept. Officials said the flood in the valley was the worst in decades.";
        let summary = ExtractiveSummarizer::new(2).summarize(text).unwrap();

        assert_eq!(
            summary,
            "The flood hit the valley. Rescue teams reached the valley flood zone."
        );
    }

    #[test]
    fn test_extractive_short_text_returned_whole() {
        let summary = ExtractiveSummarizer::new(3).summarize("One line. Two lines.").unwrap();
        assert_eq!(summary, "One line. Two lines.");
    }
}

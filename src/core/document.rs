use serde::Serialize;

/// Shown in place of a missing article body
pub const NO_TEXT_PLACEHOLDER: &str = "No text available.";

/// A single article of the corpus
///
/// `id` is the row offset at load time and never changes for the lifetime
/// of the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: usize,
    pub headline: String,
    pub body_text: Option<String>,
    pub url: String,
}

impl Document {
    pub fn new(id: usize, headline: impl Into<String>, body_text: Option<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            headline: headline.into(),
            body_text,
            url: url.into(),
        }
    }

    /// Article body, if present and not blank
    pub fn text(&self) -> Option<&str> {
        self.body_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// Whether this document can own a vector in the index
    pub fn is_embeddable(&self) -> bool {
        self.text().is_some()
    }

    pub fn display_text(&self) -> &str {
        self.text().unwrap_or(NO_TEXT_PLACEHOLDER)
    }

    pub fn word_count(&self) -> usize {
        self.text()
            .map(|t| t.split_whitespace().count())
            .unwrap_or(0)
    }
}

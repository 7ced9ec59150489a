//! Article MCP Server implementation

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tldr_bot::assist::{SummaryOutcome, CANNOT_FIND_ANSWER};
use tldr_bot::{SearchEngine, SearchError};

/// Parameters for article_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Natural language search query (e.g., "floods in southern europe")
    #[schemars(description = "Natural language search query")]
    pub query: String,
    /// Maximum number of results to return
    #[schemars(description = "Maximum number of results (default from tldr.toml, usually 10)")]
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Parameters for tools addressing a single article
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ArticleParams {
    #[schemars(description = "Article id as returned by article_search")]
    pub article_id: i64,
}

/// Parameters for article_chat tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChatParams {
    #[schemars(description = "Article id as returned by article_search")]
    pub article_id: i64,
    #[schemars(description = "Question to answer from the article text only")]
    pub question: String,
}

#[derive(Debug, Serialize)]
struct SearchResultJson {
    id: usize,
    headline: String,
    url: String,
    score: f32,
}

#[derive(Debug, Serialize)]
struct SummaryJson {
    article_id: usize,
    outcome: SummaryOutcome,
}

#[derive(Debug, Serialize)]
struct ChatJson {
    article_id: usize,
    question: String,
    answer: String,
    found: bool,
}

#[derive(Debug, Serialize)]
struct ArticleJson {
    id: usize,
    headline: String,
    url: String,
    text: String,
    has_text: bool,
    word_count: usize,
}

/// Article MCP Service
#[derive(Clone)]
pub struct ArticleService {
    engine: Arc<SearchEngine>,
    tool_router: ToolRouter<Self>,
}

fn to_mcp_error(err: SearchError) -> McpError {
    if err.is_client_error() {
        McpError::invalid_params(err.to_string(), None)
    } else {
        McpError::internal_error(err.to_string(), None)
    }
}

fn article_id(raw: i64) -> Result<usize, McpError> {
    usize::try_from(raw)
        .map_err(|_| McpError::invalid_params(format!("Article ID not found: {raw}"), None))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("JSON serialization failed: {}", e), None))
}

impl ArticleService {
    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    fn search_json(&self, params: &SearchParams) -> Result<String, McpError> {
        let k = match params.limit {
            None => None,
            Some(n) if n <= 0 => {
                return Err(McpError::invalid_params(
                    "limit must be a positive integer".to_string(),
                    None,
                ))
            }
            Some(n) => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        };

        let results: Vec<SearchResultJson> = self
            .engine
            .search(&params.query, k)
            .map_err(to_mcp_error)?
            .into_iter()
            .map(|r| SearchResultJson {
                id: r.document.id,
                headline: r.document.headline.clone(),
                url: r.document.url.clone(),
                score: r.score,
            })
            .collect();

        to_json(&results)
    }

    fn summary_json(&self, params: &ArticleParams) -> Result<String, McpError> {
        let id = article_id(params.article_id)?;
        let outcome = self.engine.summarize(id).map_err(to_mcp_error)?;
        to_json(&SummaryJson {
            article_id: id,
            outcome,
        })
    }

    fn chat_json(&self, params: &ChatParams) -> Result<String, McpError> {
        let id = article_id(params.article_id)?;
        let answer = self
            .engine
            .ask(id, &params.question)
            .map_err(to_mcp_error)?;
        to_json(&ChatJson {
            article_id: id,
            question: params.question.clone(),
            found: answer != CANNOT_FIND_ANSWER,
            answer,
        })
    }

    fn article_json(&self, params: &ArticleParams) -> Result<String, McpError> {
        let id = article_id(params.article_id)?;
        let doc = self.engine.document(id).map_err(to_mcp_error)?;
        to_json(&ArticleJson {
            id: doc.id,
            headline: doc.headline.clone(),
            url: doc.url.clone(),
            text: doc.display_text().to_string(),
            has_text: doc.text().is_some(),
            word_count: doc.word_count(),
        })
    }
}

#[tool_router]
impl ArticleService {
    /// Search articles using semantic similarity
    #[tool(description = "Search the news article corpus by meaning. Returns article ids, headlines, urls and relevance scores (higher is better).")]
    async fn article_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.search_json(&params.0)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// Summarize a single article
    #[tool(description = "Summarize one article. The outcome kind is 'summarized', 'too_short' or 'summarizer_error'.")]
    async fn article_summarize(
        &self,
        params: Parameters<ArticleParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.summary_json(&params.0)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// Answer a question grounded in one article
    #[tool(description = "Answer a question using only the text of one article. Returns 'found': false when the article does not contain the answer.")]
    async fn article_chat(
        &self,
        params: Parameters<ChatParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.chat_json(&params.0)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    /// Get the full text of a single article
    #[tool(description = "Get the headline, url and full text of one article.")]
    async fn article_get(
        &self,
        params: Parameters<ArticleParams>,
    ) -> Result<CallToolResult, McpError> {
        let output = self.article_json(&params.0)?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}

#[tool_handler]
impl ServerHandler for ArticleService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "News article assistant. Use article_search to find articles, then article_summarize, article_chat or article_get with an article id.".to_string()
            ),
            ..Default::default()
        }
    }
}

/// Run the MCP server
///
/// The engine is loaded once before serving; an index that does not match the
/// corpus stops startup instead of serving misaligned results.
pub async fn run_mcp_server(root: PathBuf) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let engine = match SearchEngine::open_root(&root) {
        Ok(engine) => engine,
        Err(e) => {
            let unavailable = e
                .downcast_ref::<SearchError>()
                .is_some_and(SearchError::is_unavailable);
            if unavailable {
                warn!(error = %e, "Index does not match corpus; run `tldr index --rebuild`");
            }
            return Err(e).context("Service unavailable: failed to load search engine");
        }
    };

    info!(root = %root.display(), "Starting MCP server on stdio");
    let service = ArticleService::new(Arc::new(engine));
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tldr_bot::assist::{ExtractiveSummarizer, OverlapAnswerer};
    use tldr_bot::search::{HtpEmbedder, IndexBuilder, Retriever, SearchLimits};
    use tldr_bot::{Corpus, Document};

    fn service() -> ArticleService {
        let corpus = Corpus::from_documents(vec![
            Document::new(0, "Wildfire spreads", Some("The wildfire spread across the hills overnight.".to_string()), "http://news.test/0"),
            Document::new(1, "Untitled", None, "http://news.test/1"),
        ]);
        let embedder = HtpEmbedder::new();
        let index = IndexBuilder::new(&embedder).build(&corpus).unwrap();
        let retriever = Retriever::new(Arc::new(index), Arc::new(corpus)).unwrap();
        let engine = SearchEngine::new(
            retriever,
            Box::new(embedder),
            Box::new(ExtractiveSummarizer::new(3)),
            Box::new(OverlapAnswerer),
            SearchLimits {
                default_k: 10,
                max_k: 100,
                min_summary_words: 40,
            },
        )
        .unwrap();
        ArticleService::new(Arc::new(engine))
    }

    #[test]
    fn test_search_json() {
        let output = service()
            .search_json(&SearchParams {
                query: "wildfire".to_string(),
                limit: Some(5),
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["headline"], "Wildfire spreads");
    }

    #[test]
    fn test_blank_query_is_invalid_params() {
        let err = service()
            .search_json(&SearchParams {
                query: "  ".to_string(),
                limit: None,
            })
            .unwrap_err();
        assert_eq!(err.code, McpError::invalid_params("", None).code);
    }

    #[test]
    fn test_non_positive_limit_rejected() {
        let err = service()
            .search_json(&SearchParams {
                query: "wildfire".to_string(),
                limit: Some(0),
            })
            .unwrap_err();
        assert_eq!(err.code, McpError::invalid_params("", None).code);
    }

    #[test]
    fn test_unknown_article_is_invalid_params() {
        let service = service();
        for id in [-1, 2] {
            let err = service.summary_json(&ArticleParams { article_id: id }).unwrap_err();
            assert_eq!(err.code, McpError::invalid_params("", None).code);
        }
    }

    #[test]
    fn test_chat_and_get_on_textless_article() {
        let service = service();

        let chat: serde_json::Value = serde_json::from_str(
            &service
                .chat_json(&ChatParams {
                    article_id: 1,
                    question: "What happened?".to_string(),
                })
                .unwrap(),
        )
        .unwrap();
        assert_eq!(chat["found"], false);
        assert_eq!(chat["answer"], CANNOT_FIND_ANSWER);

        let article: serde_json::Value =
            serde_json::from_str(&service.article_json(&ArticleParams { article_id: 1 }).unwrap()).unwrap();
        assert_eq!(article["has_text"], false);
        assert_eq!(article["text"], "No text available.");
        assert_eq!(article["word_count"], 0);
    }

    #[test]
    fn test_summary_reports_too_short() {
        let summary: serde_json::Value =
            serde_json::from_str(&service().summary_json(&ArticleParams { article_id: 0 }).unwrap()).unwrap();
        assert_eq!(summary["outcome"]["kind"], "too_short");
    }
}

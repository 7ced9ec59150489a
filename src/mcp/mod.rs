//! MCP Server for the article corpus
//!
//! Exposes search, summary and question answering as MCP tools over stdio.

mod server;

pub use server::run_mcp_server;

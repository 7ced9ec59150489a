mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tldr")]
#[command(about = "Semantic search, summaries and answers over a news article corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root holding tldr.toml (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the article vector index
    Index {
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "Force rebuild index")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Semantic search over the corpus
    Search {
        query: String,
        #[arg(short, long, help = "Number of results")]
        k: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Summarize one article
    Summarize {
        id: usize,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Answer a question from one article's text
    Ask {
        id: usize,
        question: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Check that the corpus and index are ready to serve
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server on stdio
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show client configuration instructions")]
        install: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // stdout carries command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root;

    match cli.command {
        Commands::Index {
            status,
            rebuild,
            json,
        } => commands::index::run(root, status, rebuild, json),
        Commands::Search { query, k, json } => commands::search::run(root, &query, k, json),
        Commands::Summarize { id, json } => commands::summarize::run(root, id, json),
        Commands::Ask { id, question, json } => commands::ask::run(root, id, &question, json),
        Commands::Status { json } => commands::status::run(root, json),

        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions(root);
                Ok(())
            } else {
                run_mcp_server(root)
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn run_mcp_server(root: Option<PathBuf>) -> anyhow::Result<()> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(root))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(root: Option<PathBuf>) {
    use colored::Colorize;

    let project_path = root
        .or_else(|| std::env::current_dir().ok())
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "/path/to/your/project".to_string());

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "tldr".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(r#"{{
  "mcpServers": {{
    "tldr-bot": {{
      "command": "{}",
      "args": ["--root", "{}", "mcp"]
    }}
  }}
}}"#, binary_path, project_path);
    println!();
    println!("Build the index first with {}.", "tldr index".cyan());
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Semantic search over articles", "article_search".green());
    println!("  • {} - Summarize one article", "article_summarize".green());
    println!("  • {} - Answer a question from one article", "article_chat".green());
    println!("  • {} - Get full article text", "article_get".green());
}

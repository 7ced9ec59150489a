pub mod ask;
pub mod index;
pub mod search;
pub mod status;
pub mod summarize;

use std::path::PathBuf;

use anyhow::Result;
use tldr_bot::{AppPaths, Config};

/// Load configuration and resolve paths for a project root
pub fn project(root: Option<PathBuf>) -> Result<(Config, AppPaths)> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let config = Config::load(&root)?;
    let paths = AppPaths::from_root(root, &config);
    Ok((config, paths))
}

/// Truncate for display (char-aware for Unicode)
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("가나다라마", 2), "가나...");
    }
}

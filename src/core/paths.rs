use std::path::{Path, PathBuf};

use super::config::Config;

/// Resolved filesystem locations for one project root
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub corpus: PathBuf,
    pub index: PathBuf,
    pub embeddings: PathBuf,
    pub catalog: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf, config: &Config) -> Self {
        Self {
            corpus: resolve(&root, &config.corpus.path),
            index: resolve(&root, &config.index.path),
            embeddings: resolve(&root, &config.index.embeddings_path),
            catalog: resolve(&root, &config.index.catalog_path),
            root,
        }
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

//! Build catalog using SQLite
//!
//! Records every successful index build so the serving side and the CLI can
//! report what is deployed without parsing the index file.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::Result;

pub struct BuildCatalog {
    conn: Connection,
}

/// One completed build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecord {
    pub built_at: i64,
    pub index_path: String,
    pub vector_count: usize,
    pub dimension: usize,
    pub skipped: usize,
    pub corpus_size: usize,
    pub fingerprint: String,
    pub duration_ms: i64,
}

/// Catalog statistics
#[derive(Debug)]
pub struct CatalogStats {
    pub build_count: usize,
    pub last_built: Option<i64>,
}

impl BuildCatalog {
    /// Open or create catalog at path
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let catalog = Self { conn };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Open in-memory catalog (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self { conn };
        catalog.init_schema()?;
        Ok(catalog)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS builds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                built_at INTEGER NOT NULL,
                index_path TEXT NOT NULL,
                vector_count INTEGER NOT NULL,
                dimension INTEGER NOT NULL,
                skipped INTEGER NOT NULL,
                corpus_size INTEGER NOT NULL,
                fingerprint TEXT NOT NULL,
                duration_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_builds_built_at ON builds(built_at);
            "#,
        )?;

        Ok(())
    }

    pub fn record_build(&self, record: &BuildRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO builds (built_at, index_path, vector_count, dimension, skipped, corpus_size, fingerprint, duration_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.built_at,
                record.index_path,
                record.vector_count as i64,
                record.dimension as i64,
                record.skipped as i64,
                record.corpus_size as i64,
                record.fingerprint,
                record.duration_ms,
            ],
        )?;

        self.set_meta("last_fingerprint", &record.fingerprint)?;
        Ok(())
    }

    /// Most recent build, if any
    pub fn latest_build(&self) -> Result<Option<BuildRecord>> {
        let record = self
            .conn
            .query_row(
                r#"
                SELECT built_at, index_path, vector_count, dimension, skipped, corpus_size, fingerprint, duration_ms
                FROM builds
                ORDER BY id DESC
                LIMIT 1
                "#,
                [],
                |row| {
                    Ok(BuildRecord {
                        built_at: row.get(0)?,
                        index_path: row.get(1)?,
                        vector_count: row.get::<_, i64>(2)? as usize,
                        dimension: row.get::<_, i64>(3)? as usize,
                        skipped: row.get::<_, i64>(4)? as usize,
                        corpus_size: row.get::<_, i64>(5)? as usize,
                        fingerprint: row.get(6)?,
                        duration_ms: row.get(7)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    pub fn get_stats(&self) -> Result<CatalogStats> {
        let build_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM builds", [], |row| row.get(0))?;

        let last_built: Option<i64> = self
            .conn
            .query_row("SELECT MAX(built_at) FROM builds", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(CatalogStats {
            build_count: build_count as usize,
            last_built,
        })
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(built_at: i64, vector_count: usize) -> BuildRecord {
        BuildRecord {
            built_at,
            index_path: "saved_index/article_index.bin".to_string(),
            vector_count,
            dimension: 384,
            skipped: 2,
            corpus_size: vector_count + 2,
            fingerprint: format!("{built_at:064x}"),
            duration_ms: 1200,
        }
    }

    #[test]
    fn test_empty_catalog() -> Result<()> {
        let catalog = BuildCatalog::open_in_memory()?;
        assert!(catalog.latest_build()?.is_none());

        let stats = catalog.get_stats()?;
        assert_eq!(stats.build_count, 0);
        assert_eq!(stats.last_built, None);
        Ok(())
    }

    #[test]
    fn test_latest_build_wins() -> Result<()> {
        let catalog = BuildCatalog::open_in_memory()?;
        catalog.record_build(&record(1_704_067_200, 10))?;
        catalog.record_build(&record(1_704_153_600, 12))?;

        let latest = catalog.latest_build()?.expect("latest build");
        assert_eq!(latest, record(1_704_153_600, 12));

        let stats = catalog.get_stats()?;
        assert_eq!(stats.build_count, 2);
        assert_eq!(stats.last_built, Some(1_704_153_600));
        assert_eq!(catalog.get_meta("last_fingerprint")?, Some(latest.fingerprint));
        Ok(())
    }

    #[test]
    fn test_meta_upsert() -> Result<()> {
        let catalog = BuildCatalog::open_in_memory()?;
        assert_eq!(catalog.get_meta("embedder")?, None);
        catalog.set_meta("embedder", "htp")?;
        catalog.set_meta("embedder", "htp-v2")?;
        assert_eq!(catalog.get_meta("embedder")?, Some("htp-v2".to_string()));
        Ok(())
    }
}

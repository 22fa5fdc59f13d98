//! Translated document cache using SQLite

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

pub struct TranslationCache {
    conn: Connection,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub languages: Vec<(String, usize)>,
}

/// Identity of one cached translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub source_hash: String,
    pub target_lang: String,
    pub domain_hint: String,
    pub provider: String,
}

impl CacheKey {
    pub fn new(html: &str, target_lang: &str, domain_hint: &str, provider: &str) -> Self {
        Self {
            source_hash: format!("{:x}", md5::compute(html.as_bytes())),
            target_lang: target_lang.to_string(),
            domain_hint: domain_hint.to_string(),
            provider: provider.to_string(),
        }
    }
}

impl TranslationCache {
    pub fn open() -> Result<Self> {
        Self::open_at(&Self::cache_path()?)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open translation cache")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY,
                source_hash TEXT NOT NULL,
                target_lang TEXT NOT NULL,
                domain_hint TEXT NOT NULL,
                provider TEXT NOT NULL,
                translated_html TEXT NOT NULL,
                created_at INTEGER DEFAULT (strftime('%s', 'now')),
                UNIQUE(source_hash, target_lang, domain_hint, provider)
            )",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.conn
            .query_row(
                "SELECT translated_html FROM documents
                 WHERE source_hash = ?1 AND target_lang = ?2 AND domain_hint = ?3 AND provider = ?4",
                params![key.source_hash, key.target_lang, key.domain_hint, key.provider],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()
    }

    pub fn set(&self, key: &CacheKey, translated: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents
                (source_hash, target_lang, domain_hint, provider, translated_html)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.source_hash,
                key.target_lang,
                key.domain_hint,
                key.provider,
                translated
            ],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let total: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT target_lang, COUNT(*) FROM documents GROUP BY target_lang ORDER BY target_lang")?;
        let languages: Vec<(String, usize)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(CacheStats {
            total_entries: total,
            languages,
        })
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM documents", [])?;
        Ok(removed)
    }

    pub fn cache_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .context("Failed to find cache directory")?
            .join(crate::config::APP_NAME);
        Ok(cache_dir.join("documents.db"))
    }
}

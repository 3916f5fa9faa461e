//! `SQLite`-backed ledger of completed downloads.
//!
//! Every successfully fetched item gets one row keyed by its catalog id.
//! The engine only asks two questions of the ledger ("is this id recorded?"
//! and "record this id"), plus a one-time import of the legacy
//! `archive.json` ledger on startup.
//!
//! # Example
//!
//! ```ignore
//! use zspot_core::{Archive, Database, Ledger};
//!
//! let db = Database::open(Path::new("archive.db")).await?;
//! let archive = Archive::new(db);
//! if !archive.exists("4uLU6hMCjMI75M1A2tKUQC").await? {
//!     // ... download ...
//! }
//! ```

mod error;
mod legacy;

pub use error::ArchiveError;
pub use legacy::LEGACY_ARCHIVE_FILE;

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{ContentCategory, Ledger};
use crate::db::Database;

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub id: String,
    pub artist: String,
    pub track_name: String,
    /// Absolute path of the finished file.
    pub full_path: PathBuf,
    pub category: ContentCategory,
    /// Byte size of the finished file, the completion marker.
    pub size_bytes: Option<u64>,
}

/// Ledger persisted in the archive database.
#[derive(Debug, Clone)]
pub struct Archive {
    db: Database,
}

impl Archive {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Looks up one record by id.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<ArchiveRecord>, ArchiveError> {
        let row = sqlx::query(
            "SELECT id, artist, track_name, full_path, category, size_bytes FROM archive WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    /// All records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Database`] if the query fails.
    #[instrument(skip(self))]
    pub async fn records(&self) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let rows = sqlx::query(
            "SELECT id, artist, track_name, full_path, category, size_bytes FROM archive ORDER BY rowid",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Number of recorded items.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Database`] if the query fails.
    pub async fn count(&self) -> Result<u64, ArchiveError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM archive")
            .fetch_one(self.db.pool())
            .await?;
        Ok(u64::try_from(count.0).unwrap_or(0))
    }

    async fn insert(&self, record: &ArchiveRecord, source: &str) -> Result<u64, ArchiveError> {
        let size = record.size_bytes.and_then(|size| i64::try_from(size).ok());
        let result = sqlx::query(
            r"INSERT INTO archive (id, artist, track_name, full_path, category, size_bytes, source)
              VALUES (?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT(id) DO UPDATE SET
                artist = excluded.artist,
                track_name = excluded.track_name,
                full_path = excluded.full_path,
                category = excluded.category,
                size_bytes = excluded.size_bytes,
                downloaded_at = datetime('now')
              WHERE excluded.source = 'download'",
        )
        .bind(&record.id)
        .bind(&record.artist)
        .bind(&record.track_name)
        .bind(record.full_path.to_string_lossy().as_ref())
        .bind(record.category.as_str())
        .bind(size)
        .bind(source)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ArchiveRecord, ArchiveError> {
    let id: String = row.try_get("id")?;
    let category: String = row.try_get("category")?;
    let category = category
        .parse()
        .map_err(|reason: String| ArchiveError::corrupt_row(&id, reason))?;
    let full_path: String = row.try_get("full_path")?;
    let size: Option<i64> = row.try_get("size_bytes")?;

    Ok(ArchiveRecord {
        artist: row.try_get("artist")?,
        track_name: row.try_get("track_name")?,
        full_path: PathBuf::from(full_path),
        category,
        size_bytes: size.and_then(|size| u64::try_from(size).ok()),
        id,
    })
}

#[async_trait]
impl Ledger for Archive {
    #[instrument(skip(self))]
    async fn exists(&self, id: &str) -> Result<bool, ArchiveError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM archive WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.is_some())
    }

    async fn lookup(&self, id: &str) -> Result<Option<ArchiveRecord>, ArchiveError> {
        self.get(id).await
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn add(&self, record: &ArchiveRecord) -> Result<(), ArchiveError> {
        self.insert(record, "download").await?;
        debug!(path = %record.full_path.display(), "recorded download");
        Ok(())
    }

    #[instrument(skip(self, roots), fields(roots = roots.len()))]
    async fn migrate(&self, roots: &[PathBuf]) -> Result<usize, ArchiveError> {
        let mut imported = 0;
        for root in roots {
            let legacy = match legacy::read_legacy_archive(root).await {
                Ok(Some(legacy)) => legacy,
                Ok(None) => continue,
                Err(error) => {
                    warn!(root = %root.display(), error = %error, "skipping unreadable legacy archive");
                    continue;
                }
            };
            let (path, records) = legacy;
            let mut from_file = 0;
            for record in &records {
                // Existing rows win over legacy rows (conflict clause is a no-op for migrations).
                if self.insert(record, "migration").await? > 0 {
                    from_file += 1;
                }
            }
            info!(path = %path.display(), imported = from_file, "migrated legacy archive");
            imported += from_file;
        }
        Ok(imported)
    }
}

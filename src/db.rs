//! `SQLite` storage behind the archive ledger.
//!
//! The ledger is one small file in the config directory, written by a
//! single sequential process. Connections are opened with WAL journaling
//! and a busy timeout so a second `zspot` started by mistake waits instead
//! of failing. The schema lives in `migrations/` and is applied on open.
//!
//! # Example
//!
//! ```no_run
//! use zspot_core::{Archive, Database};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::open(Path::new("archive.db")).await?;
//! let archive = Archive::new(db.clone());
//! // ... run downloads ...
//! db.close().await;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use thiserror::Error;
use tracing::{debug, instrument};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// One writer plus one reader for skip checks is all a sequential run uses.
const MAX_CONNECTIONS: u32 = 2;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database-related errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// The archive file could not be opened or created.
    #[error("failed to open archive database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    /// An in-memory database could not be created.
    #[error("failed to create in-memory database: {0}")]
    Connection(#[from] sqlx::Error),

    /// The archive schema could not be applied.
    #[error("failed to apply archive schema: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Pooled handle on the archive database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the archive at `path`, creating the file if needed, and applies
    /// pending schema migrations. The parent directory must exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] if the file cannot be opened,
    /// or [`DbError::Migration`] if the schema cannot be applied.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|source| DbError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        MIGRATOR.run(&pool).await?;
        debug!("archive database ready");

        Ok(Self { pool })
    }

    /// Creates a private in-memory archive.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] if the connection fails,
    /// or [`DbError::Migration`] if the schema cannot be applied.
    pub async fn new_in_memory() -> Result<Self, DbError> {
        // Every in-memory connection is a separate database, so keep one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool, checkpointing the WAL into the main file.
    pub async fn close(self) {
        self.pool.close().await;
        debug!("archive database closed");
    }
}

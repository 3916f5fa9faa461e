//! Reader for the legacy `archive.json` ledger.
//!
//! The file is a JSON object keyed by item id:
//!
//! ```json
//! {
//!   "4uLU6hMCjMI75M1A2tKUQC": {
//!     "artist": "Rick Astley",
//!     "track_name": "Never Gonna Give You Up",
//!     "fullpath": "/home/me/Music/ZSpotify Music/Rick Astley - Never Gonna Give You Up.mp3",
//!     "audio_type": "music",
//!     "timestamp": 1660000000
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{ArchiveError, ArchiveRecord};
use crate::catalog::ContentCategory;

/// File name of the legacy ledger inside a scanned root.
pub const LEGACY_ARCHIVE_FILE: &str = "archive.json";

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    artist: String,
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    fullpath: String,
    #[serde(default)]
    audio_type: Option<String>,
}

/// Reads the legacy ledger under `root`, if one exists.
///
/// Entries are returned sorted by id so repeated imports are deterministic.
pub(crate) async fn read_legacy_archive(
    root: &Path,
) -> Result<Option<(PathBuf, Vec<ArchiveRecord>)>, ArchiveError> {
    let path = root.join(LEGACY_ARCHIVE_FILE);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(None);
    }

    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ArchiveError::io(&path, source))?;
    let entries: BTreeMap<String, LegacyEntry> =
        serde_json::from_str(&raw).map_err(|source| ArchiveError::LegacyFormat {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), entries = entries.len(), "read legacy archive");

    let records = entries
        .into_iter()
        .map(|(id, entry)| ArchiveRecord {
            id,
            artist: entry.artist,
            track_name: entry.track_name,
            full_path: PathBuf::from(entry.fullpath),
            category: entry
                .audio_type
                .as_deref()
                .and_then(|value| value.parse().ok())
                .unwrap_or(ContentCategory::Music),
            size_bytes: None,
        })
        .collect();

    Ok(Some((path, records)))
}

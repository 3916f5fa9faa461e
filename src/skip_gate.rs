//! Pre-fetch skip decisions.
//!
//! Two cheap checks decide whether an item needs downloading at all: is its
//! id in the archive ledger, and is there already a file at the expected
//! path with one of the known audio extensions. Neither check inspects file
//! content. An empty file does not count as present, and neither does a
//! file whose length differs from the size the ledger recorded for the same
//! format, so a write that was cut off is retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::archive::ArchiveRecord;
use crate::catalog::Ledger;
use crate::filename::append_extension;

/// Extensions checked by the filesystem gate, whatever the configured format.
pub const AUDIO_EXTENSIONS: [&str; 2] = ["mp3", "ogg"];

/// Outcome of the skip gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipDecision {
    Proceed,
    /// The ledger already records the id.
    AlreadyRecorded,
    /// A finished file already exists at this path.
    AlreadyOnDisk(PathBuf),
}

impl SkipDecision {
    #[must_use]
    pub fn is_skip(&self) -> bool {
        !matches!(self, Self::Proceed)
    }
}

/// Skip gate over a ledger and the filesystem.
#[derive(Clone)]
pub struct SkipGate {
    ledger: Arc<dyn Ledger>,
}

impl SkipGate {
    #[must_use]
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Decides whether the item `id`, expected at `expected_without_ext`,
    /// can be skipped. The ledger is consulted first.
    pub async fn should_skip(
        &self,
        id: &str,
        expected_without_ext: &Path,
        skip_by_archive: bool,
        skip_by_filesystem: bool,
    ) -> SkipDecision {
        if !skip_by_archive && !skip_by_filesystem {
            return SkipDecision::Proceed;
        }

        let record = self.recorded(id).await;
        if skip_by_archive && record.is_some() {
            return SkipDecision::AlreadyRecorded;
        }
        if skip_by_filesystem
            && let Some(existing) = existing_audio_file(expected_without_ext, record.as_ref()).await
        {
            return SkipDecision::AlreadyOnDisk(existing);
        }
        SkipDecision::Proceed
    }

    /// Ledger record for `id`. A failing lookup is logged and treated as
    /// "not recorded".
    async fn recorded(&self, id: &str) -> Option<ArchiveRecord> {
        match self.ledger.lookup(id).await {
            Ok(record) => record,
            Err(error) => {
                warn!(id, error = %error, "archive lookup failed, not skipping");
                None
            }
        }
    }
}

/// Returns the first complete file at `path` + a known audio extension.
async fn existing_audio_file(
    expected_without_ext: &Path,
    record: Option<&ArchiveRecord>,
) -> Option<PathBuf> {
    for extension in AUDIO_EXTENSIONS {
        let candidate = append_extension(expected_without_ext, extension);
        let Ok(meta) = tokio::fs::metadata(&candidate).await else {
            continue;
        };
        if !meta.is_file() || meta.len() == 0 {
            debug!(path = %candidate.display(), "ignoring empty or non-file entry");
            continue;
        }
        if let Some(expected_len) = recorded_size(record, extension)
            && meta.len() != expected_len
        {
            debug!(
                path = %candidate.display(),
                found = meta.len(),
                expected = expected_len,
                "size differs from recorded download, treating as partial"
            );
            continue;
        }
        return Some(candidate);
    }
    None
}

/// Size the ledger recorded for a file of the same format.
fn recorded_size(record: Option<&ArchiveRecord>, extension: &str) -> Option<u64> {
    let record = record?;
    let same_format = record
        .full_path
        .extension()
        .is_some_and(|recorded| recorded.eq_ignore_ascii_case(extension));
    if same_format { record.size_bytes } else { None }
}

//! The per-item download step shared by every traversal.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::TraversalEngine;
use crate::archive::ArchiveRecord;
use crate::catalog::{CatalogItem, ContentCategory, TrackTags};
use crate::filename::{FilenameContext, FilenameParts, build_filename};
use crate::skip_gate::SkipDecision;

/// One leaf item to fetch, built by a traversal and consumed at once.
#[derive(Debug, Clone)]
pub(super) struct DownloadOperation<'a> {
    pub id: &'a str,
    pub target_dir: &'a Path,
    pub context: FilenameContext,
}

/// What happened to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Outcome {
    Downloaded(PathBuf),
    /// Already recorded or already on disk.
    Skipped,
    /// Metadata missing or not playable.
    Unavailable,
    /// The fetch produced nothing; nothing recorded, so a rerun retries it.
    FetchFailed,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded(_) | Self::Skipped)
    }
}

impl TraversalEngine {
    /// Runs one operation and counts its outcome.
    pub(super) async fn process_item(&self, operation: DownloadOperation<'_>) -> Outcome {
        let outcome = self.run_operation(&operation).await;
        match &outcome {
            Outcome::Downloaded(_) => self.stats.increment_downloaded(),
            Outcome::Skipped => self.stats.increment_skipped(),
            Outcome::Unavailable => self.stats.increment_unavailable(),
            Outcome::FetchFailed => self.stats.increment_failed(),
        }
        outcome
    }

    #[instrument(skip(self, operation), fields(id = operation.id, context = operation.context.as_str()))]
    async fn run_operation(&self, operation: &DownloadOperation<'_>) -> Outcome {
        let id = operation.id;
        let episodic = operation.context.is_episodic();
        let lookup = if episodic {
            self.provider.episode_info(id).await
        } else {
            self.provider.track_info(id).await
        };
        let item = match lookup {
            Ok(Some(item)) => item,
            Ok(None) => {
                info!("Skipping {id} - Could not get track info");
                return Outcome::Unavailable;
            }
            Err(error) => {
                warn!(error = %error, "Skipping {id} - Could not get track info");
                return Outcome::Unavailable;
            }
        };
        if !item.is_playable {
            info!("Skipping {} - Not Available", item.name);
            return Outcome::Unavailable;
        }

        let filename = build_filename(
            operation.context,
            &FilenameParts {
                name: &item.name,
                number: item.number,
                artist: &item.artist,
                album_artist: &item.album_artist,
                album_name: &item.album_name,
            },
            self.config.album_in_filename,
        );
        let expected = operation.target_dir.join(&filename);

        match self
            .gate
            .should_skip(
                id,
                &expected,
                self.config.skip_downloaded,
                self.config.skip_existing,
            )
            .await
        {
            SkipDecision::Proceed => {}
            SkipDecision::AlreadyRecorded => {
                info!("Skipping {filename} - Already Downloaded");
                return Outcome::Skipped;
            }
            SkipDecision::AlreadyOnDisk(existing) => {
                let shown = existing.file_name().map_or_else(
                    || existing.display().to_string(),
                    |name| name.to_string_lossy().into_owned(),
                );
                info!("Skipping {shown} - Already downloaded");
                return Outcome::Skipped;
            }
        }

        let category = if episodic {
            ContentCategory::Episode
        } else {
            ContentCategory::Music
        };
        let fetched = self
            .provider
            .fetch_and_convert(id, category, &expected, self.config.audio_format)
            .await;
        self.pacer.wait_short().await;

        let output = match fetched {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!(expected = %expected.display(), "fetch produced no file");
                return Outcome::FetchFailed;
            }
            Err(error) => {
                warn!(error = %error, "fetch failed for {filename}");
                return Outcome::FetchFailed;
            }
        };

        self.record(id, &item, category, &output).await;

        debug!("Setting audiotags {filename}");
        if let Err(error) = self.tagger.apply_tags(&output, &TrackTags::from(&item)).await {
            warn!(error = %error, path = %output.display(), "tagging failed");
        }

        info!("Finished downloading {filename}");
        Outcome::Downloaded(output)
    }

    async fn record(
        &self,
        id: &str,
        item: &CatalogItem,
        category: ContentCategory,
        output: &Path,
    ) {
        let size_bytes = tokio::fs::metadata(output).await.ok().map(|meta| meta.len());
        let full_path = std::path::absolute(output).unwrap_or_else(|_| output.to_path_buf());
        let record = ArchiveRecord {
            id: id.to_string(),
            artist: item.artist.clone(),
            track_name: item.name.clone(),
            full_path,
            category,
            size_bytes,
        };
        if let Err(error) = self.ledger.add(&record).await {
            warn!(error = %error, id = %record.id, "failed to record download in archive");
        }
    }
}

//! JSON-LD metadata sidecars for finished downloads.
//!
//! Audio containers are produced by the external fetcher, so instead of
//! embedding tags the default [`Tagger`] writes a Schema.org
//! `MusicRecording` document next to each file (`Song.mp3` gets
//! `Song.json`). A re-download overwrites the sidecar.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::catalog::{Tagger, TrackTags};

/// Errors produced while writing a sidecar.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// I/O error writing the sidecar file to disk.
    #[error("I/O error writing sidecar '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct MusicRecording<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    type_: &'static str,
    name: &'a str,
    #[serde(rename = "byArtist")]
    by_artist: Party<'a>,
    #[serde(rename = "inAlbum")]
    in_album: Album<'a>,
    position: u32,
    #[serde(rename = "discNumber")]
    disc_number: u32,
    identifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Party<'a> {
    #[serde(rename = "@type")]
    type_: &'static str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Album<'a> {
    #[serde(rename = "@type")]
    type_: &'static str,
    name: &'a str,
    #[serde(rename = "byArtist")]
    by_artist: Party<'a>,
    #[serde(rename = "datePublished", skip_serializing_if = "Option::is_none")]
    date_published: Option<String>,
}

impl<'a> From<&'a TrackTags> for MusicRecording<'a> {
    fn from(tags: &'a TrackTags) -> Self {
        Self {
            context: "https://schema.org",
            type_: "MusicRecording",
            name: &tags.name,
            by_artist: Party {
                type_: "MusicGroup",
                name: &tags.artist,
            },
            in_album: Album {
                type_: "MusicAlbum",
                name: &tags.album_name,
                by_artist: Party {
                    type_: "MusicGroup",
                    name: &tags.album_artist,
                },
                date_published: tags.release_year.map(|year| year.to_string()),
            },
            position: tags.track_number,
            disc_number: tags.disc_number,
            identifier: &tags.content_id,
            image: tags.artwork_url.as_deref(),
        }
    }
}

/// Tagger writing JSON-LD sidecars, or doing nothing when disabled.
#[derive(Debug, Clone, Copy)]
pub struct SidecarTagger {
    enabled: bool,
}

impl SidecarTagger {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Derives the sidecar path: `Song.mp3` becomes `Song.json`.
#[must_use]
pub fn sidecar_path(audio_path: &Path) -> PathBuf {
    let mut path = audio_path.to_path_buf();
    path.set_extension("json");
    path
}

#[async_trait]
impl Tagger for SidecarTagger {
    #[instrument(skip(self, tags), fields(path = %path.display()))]
    async fn apply_tags(&self, path: &Path, tags: &TrackTags) -> Result<(), TaggerError> {
        if !self.enabled {
            debug!("sidecars disabled, skipping");
            return Ok(());
        }

        let target = sidecar_path(path);
        let document = serde_json::to_vec_pretty(&MusicRecording::from(tags))?;
        tokio::fs::write(&target, document)
            .await
            .map_err(|source| TaggerError::Io {
                path: target.clone(),
                source,
            })?;

        debug!(sidecar = %target.display(), "sidecar written");
        Ok(())
    }
}

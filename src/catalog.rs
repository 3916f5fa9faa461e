//! Catalog data model and the contracts of the engine's collaborators.
//!
//! The engine never talks to the network, the disk ledger or the tagger
//! directly; it goes through the traits below so that each collaborator can
//! be swapped (HTTP provider, in-memory fakes in tests, ...).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

use crate::archive::{ArchiveError, ArchiveRecord};
use crate::config::AudioFormat;
use crate::provider::ProviderError;
use crate::tagger::TaggerError;

/// Provider metadata for one track or episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album_name: String,
    pub album_artist: String,
    /// Track number within the album, or episode number within the show.
    pub number: u32,
    pub disc_number: u32,
    pub release_year: Option<i32>,
    pub is_playable: bool,
    /// Provider-internal content id, written into the tags.
    pub content_id: String,
    pub artwork_url: Option<String>,
}

/// One entry of an ordered track/episode listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub id: String,
    pub disc_number: u32,
}

impl SongRef {
    #[must_use]
    pub fn new(id: impl Into<String>, disc_number: u32) -> Self {
        Self {
            id: id.into(),
            disc_number,
        }
    }
}

/// Id and display name of a playlist, artist, show or album listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntry {
    pub id: String,
    pub name: String,
}

impl NamedEntry {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumInfo {
    pub name: String,
    /// Album artists joined for display.
    pub artists: String,
    pub release_date: String,
}

/// Kind of a search result, which decides the download entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Track,
    Album,
    Playlist,
    Artist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    /// Artists for tracks and albums, `None` for playlists and artists.
    pub artists: Option<String>,
    pub kind: SearchKind,
}

impl SearchHit {
    /// Display line without the index.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.artists {
            Some(artists) => format!("{artists} - {}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub tracks: Vec<SearchHit>,
    pub albums: Vec<SearchHit>,
    pub playlists: Vec<SearchHit>,
    pub artists: Vec<SearchHit>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
            && self.albums.is_empty()
            && self.playlists.is_empty()
            && self.artists.is_empty()
    }

    /// All hits in display order: tracks, albums, playlists, artists.
    /// Position `i` in the returned list is selection index `i + 1`.
    #[must_use]
    pub fn enumerate(&self) -> Vec<&SearchHit> {
        self.tracks
            .iter()
            .chain(&self.albums)
            .chain(&self.playlists)
            .chain(&self.artists)
            .collect()
    }
}

/// Category recorded in the ledger for a finished download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Music,
    Episode,
}

impl ContentCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Episode => "episode",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "music" => Ok(Self::Music),
            "episode" | "podcast" => Ok(Self::Episode),
            other => Err(format!("unknown content category '{other}'")),
        }
    }
}

/// Metadata handed to the tagger after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackTags {
    pub artist: String,
    pub name: String,
    pub album_name: String,
    pub release_year: Option<i32>,
    pub disc_number: u32,
    pub track_number: u32,
    pub album_artist: String,
    pub content_id: String,
    pub artwork_url: Option<String>,
}

impl From<&CatalogItem> for TrackTags {
    fn from(item: &CatalogItem) -> Self {
        Self {
            artist: item.artist.clone(),
            name: item.name.clone(),
            album_name: item.album_name.clone(),
            release_year: item.release_year,
            disc_number: item.disc_number,
            track_number: item.number,
            album_artist: item.album_artist.clone(),
            content_id: item.content_id.clone(),
            artwork_url: item.artwork_url.clone(),
        }
    }
}

/// Remote catalog: metadata lookups plus the audio fetch.
///
/// Lookups return `Ok(None)` / an empty list when the entity does not exist
/// or has no children; `Err` is reserved for transport and decoding
/// failures.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn track_info(&self, id: &str) -> Result<Option<CatalogItem>, ProviderError>;

    async fn episode_info(&self, id: &str) -> Result<Option<CatalogItem>, ProviderError>;

    async fn playlist_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError>;

    /// Playlist tracks in playlist order.
    async fn playlist_songs(&self, id: &str) -> Result<Vec<SongRef>, ProviderError>;

    async fn album_info(&self, id: &str) -> Result<Option<AlbumInfo>, ProviderError>;

    /// Album tracks in disc/track order.
    async fn album_songs(&self, id: &str) -> Result<Vec<SongRef>, ProviderError>;

    async fn artist_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError>;

    async fn artist_albums(&self, id: &str) -> Result<Vec<NamedEntry>, ProviderError>;

    async fn show_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError>;

    async fn show_episodes(&self, id: &str) -> Result<Vec<SongRef>, ProviderError>;

    async fn liked_tracks(&self) -> Result<Vec<SongRef>, ProviderError>;

    async fn user_playlists(&self) -> Result<Vec<NamedEntry>, ProviderError>;

    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults, ProviderError>;

    /// Fetches the audio for `id` and writes it next to `target_without_ext`.
    ///
    /// Returns the final output path, or `None` when the fetch produced
    /// nothing.
    async fn fetch_and_convert(
        &self,
        id: &str,
        category: ContentCategory,
        target_without_ext: &Path,
        format: AudioFormat,
    ) -> Result<Option<PathBuf>, ProviderError>;
}

/// Writes item metadata into (or next to) a finished file.
#[async_trait]
pub trait Tagger: Send + Sync {
    async fn apply_tags(&self, path: &Path, tags: &TrackTags) -> Result<(), TaggerError>;
}

/// Persistent record of completed downloads keyed by item id.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, ArchiveError>;

    /// The record stored for `id`, if any.
    async fn lookup(&self, id: &str) -> Result<Option<ArchiveRecord>, ArchiveError>;

    async fn add(&self, record: &ArchiveRecord) -> Result<(), ArchiveError>;

    /// One-time import of legacy records found under `roots`. Returns the
    /// number of records imported.
    async fn migrate(&self, roots: &[PathBuf]) -> Result<usize, ArchiveError>;
}

/// Interactive source of selection input.
#[async_trait]
pub trait SelectionPrompt: Send + Sync {
    /// Shows `listing` and `instructions`, then reads one line of input.
    ///
    /// Returns `None` when input is exhausted.
    async fn choose(&self, listing: &[String], instructions: &str) -> Option<String>;
}

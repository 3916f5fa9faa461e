//! Traversal engine: expands catalog entities into per-item downloads.
//!
//! Every entry point turns one parent (playlist, album, artist, show, the
//! liked-songs collection, the playlist library) into an ordered sequence
//! of leaf items and drives them one at a time through the shared per-item
//! step: archive check, metadata lookup, filename, filesystem check, fetch,
//! archive append, tagging.
//!
//! Entry points return `true` when the parent was expanded and walked.
//! Item-level problems (unavailable, already downloaded, failed fetch) are
//! reported and never abort the batch; only a missing or empty parent, or
//! an invalid locator, returns `false`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zspot_core::{
//!     Archive, CommandFetcher, Database, EngineConfig, Pacer, SidecarTagger, TraversalEngine,
//!     WebApiProvider,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::new("/music", "/podcasts");
//! let pacer = Arc::new(Pacer::new(config.short_pause, config.long_pause));
//! let provider = Arc::new(WebApiProvider::new(None, CommandFetcher::default())?);
//! let ledger = Arc::new(Archive::new(Database::new_in_memory().await?));
//! let engine = TraversalEngine::new(config, provider, ledger, Arc::new(SidecarTagger::new(true)), pacer);
//!
//! engine.download_by_locator("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy").await;
//! println!("downloaded {}", engine.stats().downloaded());
//! # Ok(())
//! # }
//! ```

mod item;
mod search;
mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::catalog::{CatalogProvider, Ledger, NamedEntry, SelectionPrompt, SongRef, Tagger};
use crate::config::{EngineConfig, LIKED_SONGS_DIR};
use crate::filename::{FilenameContext, sanitize_filename, zero_pad};
use crate::locator::{Category, Locator, resolve, split_input};
use crate::pacing::Pacer;
use crate::provider::ProviderError;
use crate::skip_gate::SkipGate;

use item::DownloadOperation;
pub use stats::EngineStats;

/// Width of the zero-padded disc subfolder of multi-disc albums.
const DISC_FOLDER_WIDTH: usize = 2;

/// Orchestrates catalog traversal over its collaborators.
///
/// Processing is strictly sequential: one item runs to completion before
/// the next starts, so archive insertions follow provider listing order.
pub struct TraversalEngine {
    config: EngineConfig,
    provider: Arc<dyn CatalogProvider>,
    ledger: Arc<dyn Ledger>,
    gate: SkipGate,
    tagger: Arc<dyn Tagger>,
    pacer: Arc<Pacer>,
    stats: EngineStats,
}

impl std::fmt::Debug for TraversalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalEngine")
            .field("config", &self.config)
            .field("pacer", &self.pacer)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl TraversalEngine {
    /// Creates an engine over the given collaborators.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(music_dir = %config.music_dir.display()))]
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn CatalogProvider>,
        ledger: Arc<dyn Ledger>,
        tagger: Arc<dyn Tagger>,
        pacer: Arc<Pacer>,
    ) -> Self {
        debug!(
            skip_existing = config.skip_existing,
            skip_downloaded = config.skip_downloaded,
            format = %config.audio_format,
            "creating traversal engine"
        );
        Self {
            gate: SkipGate::new(Arc::clone(&ledger)),
            config,
            provider,
            ledger,
            tagger,
            pacer,
            stats: EngineStats::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    #[must_use]
    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    // ==================== Leaf Entry Points ====================

    /// Downloads one track into the music root.
    #[instrument(skip(self))]
    pub async fn download_track(&self, id: &str) -> bool {
        self.process_item(DownloadOperation {
            id,
            target_dir: &self.config.music_dir,
            context: FilenameContext::Track,
        })
        .await
        .is_success()
    }

    /// Downloads one podcast episode into the episodes root.
    #[instrument(skip(self))]
    pub async fn download_episode(&self, id: &str) -> bool {
        self.process_item(DownloadOperation {
            id,
            target_dir: &self.config.episodes_dir,
            context: FilenameContext::Episode,
        })
        .await
        .is_success()
    }

    // ==================== Collection Entry Points ====================

    /// Downloads every track of a playlist into `music_dir/<playlist name>`.
    #[instrument(skip(self))]
    pub async fn download_playlist(&self, id: &str) -> bool {
        let Some(playlist) = found(self.provider.playlist_info(id).await) else {
            warn!("Playlist not found");
            return false;
        };
        let Some(songs) = non_empty(self.provider.playlist_songs(id).await) else {
            warn!("Playlist is empty");
            return false;
        };

        let name = display_name(&playlist, id);
        info!(tracks = songs.len(), "Downloading {name} playlist");
        let dir = self.config.music_dir.join(sanitize_filename(name));
        self.process_songs(&songs, &dir, FilenameContext::Playlist).await;
        info!("Finished downloading {name} playlist");
        true
    }

    /// Downloads an album into `music_dir/<artists>/<release date - name>`,
    /// adding a zero-padded disc folder when the album spans several discs.
    #[instrument(skip(self))]
    pub async fn download_album(&self, id: &str) -> bool {
        let Some(album) = found(self.provider.album_info(id).await) else {
            warn!("Album not found");
            return false;
        };
        let Some(songs) = non_empty(self.provider.album_songs(id).await) else {
            warn!("Album is empty");
            return false;
        };

        let multi_disc = songs.iter().any(|song| song.disc_number > 1);
        let artists = sanitize_filename(&album.artists);
        let title = sanitize_filename(&format!("{} - {}", album.release_date, album.name));
        info!(tracks = songs.len(), multi_disc, "Downloading {artists} - {title} album");

        let base = self.config.music_dir.join(&artists).join(&title);
        for song in &songs {
            let dir = if multi_disc {
                base.join(zero_pad(song.disc_number, DISC_FOLDER_WIDTH))
            } else {
                base.clone()
            };
            self.process_item(DownloadOperation {
                id: &song.id,
                target_dir: &dir,
                context: FilenameContext::Album,
            })
            .await;
        }

        info!("Finished downloading {} - {} album", album.artists, album.name);
        true
    }

    /// Downloads every album of an artist, pausing long after each one.
    #[instrument(skip(self))]
    pub async fn download_artist(&self, id: &str) -> bool {
        let Some(artist) = found(self.provider.artist_info(id).await) else {
            warn!("Artist not found");
            return false;
        };
        let Some(albums) = non_empty(self.provider.artist_albums(id).await) else {
            warn!("Artist has no albums");
            return false;
        };

        info!(albums = albums.len(), "Downloading {} artist", artist.name);
        for album in &albums {
            self.download_album(&album.id).await;
            self.pacer.wait_long().await;
        }
        info!("Finished downloading {} artist", artist.name);
        true
    }

    /// Downloads every episode of a show into `episodes_dir/<show name>`.
    #[instrument(skip(self))]
    pub async fn download_show(&self, id: &str) -> bool {
        let Some(show) = found(self.provider.show_info(id).await) else {
            warn!("Show not found");
            return false;
        };
        let Some(episodes) = non_empty(self.provider.show_episodes(id).await) else {
            warn!("Show has no episodes");
            return false;
        };

        let name = display_name(&show, id);
        info!(episodes = episodes.len(), "Downloading {name} show");
        let dir = self.config.episodes_dir.join(sanitize_filename(name));
        self.process_songs(&episodes, &dir, FilenameContext::Show).await;
        info!("Finished downloading {name} show");
        true
    }

    /// Downloads the liked-songs collection into `music_dir/Liked Songs`.
    #[instrument(skip(self))]
    pub async fn download_liked_songs(&self) -> bool {
        let Some(songs) = non_empty(self.provider.liked_tracks().await) else {
            warn!("No liked songs found");
            return false;
        };

        info!(tracks = songs.len(), "Downloading liked songs");
        let dir = self.config.music_dir.join(LIKED_SONGS_DIR);
        self.process_songs(&songs, &dir, FilenameContext::LikedSongs).await;
        info!("Finished downloading liked songs");
        true
    }

    // ==================== Library Entry Points ====================

    /// Downloads every playlist of the user's library, pausing long after
    /// each one.
    #[instrument(skip(self))]
    pub async fn download_all_playlists(&self) -> bool {
        let Some(playlists) = self.library_playlists().await else {
            return false;
        };
        for playlist in &playlists {
            self.download_playlist(&playlist.id).await;
            self.pacer.wait_long().await;
        }
        info!("Finished downloading all user playlists");
        true
    }

    /// Lists the library, asks for a selection, then downloads the chosen
    /// playlists in ascending index order, pausing long after each one.
    #[instrument(skip(self, prompt))]
    pub async fn download_selected_playlists(&self, prompt: &dyn SelectionPrompt) -> bool {
        let Some(playlists) = self.library_playlists().await else {
            return false;
        };
        let listing: Vec<String> = playlists
            .iter()
            .enumerate()
            .map(|(index, playlist)| format!("    {}. {}", index + 1, playlist.name))
            .collect();

        let Some(selection) = self
            .prompt_selection(prompt, &listing, search::PLAYLIST_INSTRUCTIONS, playlists.len())
            .await
        else {
            return false;
        };

        for playlist in selection.valid.iter().filter_map(|index| playlists.get(index - 1)) {
            self.download_playlist(&playlist.id).await;
            self.pacer.wait_long().await;
        }
        info!("Finished downloading selected playlists");
        true
    }

    // ==================== Locator Dispatch ====================

    /// Resolves a URL, URI or id and dispatches it by category.
    ///
    /// Bare ids carry no category and are reported as invalid; use
    /// [`Self::download_in_context`] when the category is known.
    #[instrument(skip(self))]
    pub async fn download_by_locator(&self, input: &str) -> bool {
        self.dispatch(&resolve(input)).await
    }

    /// Like [`Self::download_by_locator`], but a bare id is taken to be of
    /// `category`.
    #[instrument(skip(self))]
    pub async fn download_in_context(&self, input: &str, category: Category) -> bool {
        self.dispatch(&resolve(input).in_context(category)).await
    }

    /// Processes every locator of a bulk list, one per line. Blank lines
    /// and lines starting with `#` are ignored; a line may hold several
    /// locators separated by `,` or `;`.
    ///
    /// Returns `true` when every locator succeeded.
    #[instrument(skip_all, fields(lines = contents.lines().count()))]
    pub async fn download_bulk(&self, contents: &str) -> bool {
        let mut all_succeeded = true;
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            for token in split_input(line) {
                all_succeeded &= self.download_by_locator(token).await;
            }
        }
        all_succeeded
    }

    /// Imports legacy ledger files found under `roots`. Failures are
    /// logged; returns the number of imported records.
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub async fn migrate_archive(&self, roots: &[PathBuf]) -> usize {
        match self.ledger.migrate(roots).await {
            Ok(imported) => imported,
            Err(error) => {
                warn!(error = %error, "archive migration failed");
                0
            }
        }
    }

    async fn dispatch(&self, locator: &Locator) -> bool {
        let Some(id) = locator.id() else {
            warn!(input = locator.raw(), "Invalid URL");
            return false;
        };
        match locator.category() {
            Category::Track => self.download_track(id).await,
            Category::Playlist => self.download_playlist(id).await,
            Category::Album => self.download_album(id).await,
            Category::Artist => self.download_artist(id).await,
            Category::Episode => self.download_episode(id).await,
            Category::Show => self.download_show(id).await,
            Category::None => {
                warn!(input = locator.raw(), "Invalid URL");
                false
            }
        }
    }

    // ==================== Helpers ====================

    async fn process_songs(&self, songs: &[SongRef], dir: &Path, context: FilenameContext) {
        for song in songs {
            self.process_item(DownloadOperation {
                id: &song.id,
                target_dir: dir,
                context,
            })
            .await;
        }
    }

    async fn library_playlists(&self) -> Option<Vec<NamedEntry>> {
        let playlists = non_empty(self.provider.user_playlists().await);
        if playlists.is_none() {
            warn!("No playlists found");
        }
        playlists
    }
}

/// Parent lookup: a provider error counts as "not found".
fn found<P>(lookup: Result<Option<P>, ProviderError>) -> Option<P> {
    lookup.unwrap_or_else(|error| {
        warn!(error = %error, "catalog lookup failed");
        None
    })
}

/// Listing lookup: a provider error counts as "empty".
fn non_empty<T>(listing: Result<Vec<T>, ProviderError>) -> Option<Vec<T>> {
    match listing {
        Ok(items) if items.is_empty() => None,
        Ok(items) => Some(items),
        Err(error) => {
            warn!(error = %error, "catalog listing failed");
            None
        }
    }
}

/// Name shown and used as folder; falls back to the id when blank.
fn display_name<'a>(entry: &'a NamedEntry, id: &'a str) -> &'a str {
    if entry.name.trim().is_empty() {
        id
    } else {
        &entry.name
    }
}

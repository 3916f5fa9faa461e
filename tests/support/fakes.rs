//! In-memory collaborators for driving the traversal engine without a
//! network, plus a harness wiring them to a real in-memory archive.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use zspot_core::filename::append_extension;
use zspot_core::{
    AlbumInfo, Archive, AudioFormat, CatalogItem, CatalogProvider, ContentCategory, Database,
    EngineConfig, NamedEntry, Pacer, ProviderError, SearchResults, SelectionPrompt, SongRef,
    Tagger, TaggerError, TrackTags, TraversalEngine,
};

/// Builds a playable item whose album artist equals its artist.
pub fn item(id: &str, name: &str, artist: &str, number: u32, disc_number: u32) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: name.to_string(),
        artist: artist.to_string(),
        album_name: "Album".to_string(),
        album_artist: artist.to_string(),
        number,
        disc_number,
        release_year: Some(2020),
        is_playable: true,
        content_id: format!("spotify:track:{id}"),
        artwork_url: None,
    }
}

/// Catalog backed by hash maps. Every fetch writes a small `.mp3` file.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    tracks: HashMap<String, CatalogItem>,
    episodes: HashMap<String, CatalogItem>,
    playlists: HashMap<String, (NamedEntry, Vec<SongRef>)>,
    albums: HashMap<String, (AlbumInfo, Vec<SongRef>)>,
    artists: HashMap<String, (NamedEntry, Vec<NamedEntry>)>,
    shows: HashMap<String, (NamedEntry, Vec<SongRef>)>,
    liked: Vec<SongRef>,
    library: Vec<NamedEntry>,
    search_results: SearchResults,
    failing_fetches: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_track(mut self, track: CatalogItem) -> Self {
        self.tracks.insert(track.id.clone(), track);
        self
    }

    /// Adds a track `id` named `name` by `Artist`.
    pub fn with_simple_track(self, id: &str, name: &str) -> Self {
        self.with_track(item(id, name, "Artist", 1, 1))
    }

    pub fn with_episode(mut self, episode: CatalogItem) -> Self {
        self.episodes.insert(episode.id.clone(), episode);
        self
    }

    pub fn with_playlist(mut self, id: &str, name: &str, song_ids: &[&str]) -> Self {
        let songs = song_ids.iter().map(|song| SongRef::new(*song, 1)).collect();
        self.playlists
            .insert(id.to_string(), (NamedEntry::new(id, name), songs));
        self
    }

    pub fn with_album(mut self, id: &str, info: AlbumInfo, songs: Vec<SongRef>) -> Self {
        self.albums.insert(id.to_string(), (info, songs));
        self
    }

    pub fn with_artist(mut self, id: &str, name: &str, album_ids: &[&str]) -> Self {
        let albums = album_ids
            .iter()
            .map(|album| NamedEntry::new(*album, format!("album {album}")))
            .collect();
        self.artists
            .insert(id.to_string(), (NamedEntry::new(id, name), albums));
        self
    }

    pub fn with_show(mut self, id: &str, name: &str, episode_ids: &[&str]) -> Self {
        let episodes = episode_ids.iter().map(|episode| SongRef::new(*episode, 1)).collect();
        self.shows
            .insert(id.to_string(), (NamedEntry::new(id, name), episodes));
        self
    }

    pub fn with_liked(mut self, song_ids: &[&str]) -> Self {
        self.liked = song_ids.iter().map(|song| SongRef::new(*song, 1)).collect();
        self
    }

    pub fn with_library(mut self, playlist_ids: &[&str]) -> Self {
        self.library = playlist_ids
            .iter()
            .map(|id| {
                let name = self
                    .playlists
                    .get(*id)
                    .map_or_else(|| (*id).to_string(), |(entry, _)| entry.name.clone());
                NamedEntry::new(*id, name)
            })
            .collect();
        self
    }

    pub fn with_search_results(mut self, results: SearchResults) -> Self {
        self.search_results = results;
        self
    }

    pub fn with_failing_fetch(mut self, id: &str) -> Self {
        self.failing_fetches.insert(id.to_string());
        self
    }

    /// Ids passed to `fetch_and_convert`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    async fn track_info(&self, id: &str) -> Result<Option<CatalogItem>, ProviderError> {
        Ok(self.tracks.get(id).cloned())
    }

    async fn episode_info(&self, id: &str) -> Result<Option<CatalogItem>, ProviderError> {
        Ok(self.episodes.get(id).cloned())
    }

    async fn playlist_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError> {
        Ok(self.playlists.get(id).map(|(entry, _)| entry.clone()))
    }

    async fn playlist_songs(&self, id: &str) -> Result<Vec<SongRef>, ProviderError> {
        Ok(self.playlists.get(id).map(|(_, songs)| songs.clone()).unwrap_or_default())
    }

    async fn album_info(&self, id: &str) -> Result<Option<AlbumInfo>, ProviderError> {
        Ok(self.albums.get(id).map(|(info, _)| info.clone()))
    }

    async fn album_songs(&self, id: &str) -> Result<Vec<SongRef>, ProviderError> {
        Ok(self.albums.get(id).map(|(_, songs)| songs.clone()).unwrap_or_default())
    }

    async fn artist_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError> {
        Ok(self.artists.get(id).map(|(entry, _)| entry.clone()))
    }

    async fn artist_albums(&self, id: &str) -> Result<Vec<NamedEntry>, ProviderError> {
        Ok(self.artists.get(id).map(|(_, albums)| albums.clone()).unwrap_or_default())
    }

    async fn show_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError> {
        Ok(self.shows.get(id).map(|(entry, _)| entry.clone()))
    }

    async fn show_episodes(&self, id: &str) -> Result<Vec<SongRef>, ProviderError> {
        Ok(self.shows.get(id).map(|(_, songs)| songs.clone()).unwrap_or_default())
    }

    async fn liked_tracks(&self) -> Result<Vec<SongRef>, ProviderError> {
        Ok(self.liked.clone())
    }

    async fn user_playlists(&self) -> Result<Vec<NamedEntry>, ProviderError> {
        Ok(self.library.clone())
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<SearchResults, ProviderError> {
        Ok(self.search_results.clone())
    }

    async fn fetch_and_convert(
        &self,
        id: &str,
        _category: ContentCategory,
        target_without_ext: &Path,
        _format: AudioFormat,
    ) -> Result<Option<PathBuf>, ProviderError> {
        self.fetched.lock().unwrap().push(id.to_string());
        if self.failing_fetches.contains(id) {
            return Ok(None);
        }
        let output = append_extension(target_without_ext, "mp3");
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(&output, b"ID3 fake audio").await.unwrap();
        Ok(Some(output))
    }
}

/// Tagger that only remembers which files it was asked to tag.
#[derive(Debug, Default)]
pub struct RecordingTagger {
    tagged: Mutex<Vec<PathBuf>>,
}

impl RecordingTagger {
    pub fn tagged(&self) -> Vec<PathBuf> {
        self.tagged.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tagger for RecordingTagger {
    async fn apply_tags(&self, path: &Path, _tags: &TrackTags) -> Result<(), TaggerError> {
        self.tagged.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Prompt answering from a fixed script; `None` once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    listings: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|answer| (*answer).to_string()).collect()),
            listings: Mutex::new(Vec::new()),
        }
    }

    /// Every listing shown so far.
    pub fn listings(&self) -> Vec<Vec<String>> {
        self.listings.lock().unwrap().clone()
    }
}

#[async_trait]
impl SelectionPrompt for ScriptedPrompt {
    async fn choose(&self, listing: &[String], _instructions: &str) -> Option<String> {
        self.listings.lock().unwrap().push(listing.to_vec());
        self.answers.lock().unwrap().pop_front()
    }
}

/// Engine over fakes, a real in-memory archive and a disabled pacer.
pub struct Harness {
    pub engine: TraversalEngine,
    pub catalog: Arc<FakeCatalog>,
    pub archive: Archive,
    pub tagger: Arc<RecordingTagger>,
    pub pacer: Arc<Pacer>,
    pub root: TempDir,
}

impl Harness {
    pub async fn new(catalog: FakeCatalog) -> Self {
        Self::with_config(catalog, |_| {}).await
    }

    pub async fn with_config(catalog: FakeCatalog, adjust: impl FnOnce(&mut EngineConfig)) -> Self {
        let root = TempDir::new().unwrap();
        let mut config = EngineConfig::new(root.path().join("music"), root.path().join("episodes"));
        adjust(&mut config);

        let archive = Archive::new(Database::new_in_memory().await.unwrap());
        let catalog = Arc::new(catalog);
        let tagger = Arc::new(RecordingTagger::default());
        let pacer = Arc::new(Pacer::disabled());
        let engine = TraversalEngine::new(
            config,
            Arc::clone(&catalog) as Arc<dyn CatalogProvider>,
            Arc::new(archive.clone()),
            Arc::clone(&tagger) as Arc<dyn Tagger>,
            Arc::clone(&pacer),
        );

        Self {
            engine,
            catalog,
            archive,
            tagger,
            pacer,
            root,
        }
    }

    pub fn music_dir(&self) -> PathBuf {
        self.engine.config().music_dir.clone()
    }

    pub fn episodes_dir(&self) -> PathBuf {
        self.engine.config().episodes_dir.clone()
    }

    /// Recorded archive ids in insertion order.
    pub async fn recorded_ids(&self) -> Vec<String> {
        self.archive
            .records()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect()
    }
}

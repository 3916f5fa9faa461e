//! [`CatalogProvider`] implementation over the public Web API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::http_client::{build_http_client, parse_retry_after};
use super::{CommandFetcher, ProviderError};
use crate::catalog::{
    AlbumInfo, CatalogItem, CatalogProvider, ContentCategory, NamedEntry, SearchHit, SearchKind,
    SearchResults, SongRef,
};
use crate::config::AudioFormat;

/// Default Web API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1/";

/// Requests made for one URL before a throttled call gives up.
const MAX_THROTTLE_ATTEMPTS: u32 = 3;

/// Wait used when a 429 response carries no usable Retry-After.
const DEFAULT_THROTTLE_WAIT: Duration = Duration::from_secs(1);

/// Upper bound on followed `next` links for one listing.
const MAX_PAGES: usize = 1_000;

/// Longest error body kept in [`ProviderError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

// ==================== Web API Response Types ====================

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    items: Vec<Option<T>>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: String,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    album: Option<AlbumObject>,
    #[serde(default)]
    track_number: u32,
    #[serde(default = "first_disc")]
    disc_number: u32,
    #[serde(default)]
    is_playable: Option<bool>,
    #[serde(default)]
    uri: String,
}

/// Listing entry: just enough to order and group.
#[derive(Debug, Deserialize)]
struct ListedTrack {
    #[serde(default)]
    id: Option<String>,
    #[serde(default = "first_disc")]
    disc_number: u32,
}

/// Playlist and saved-track entries wrap the track object.
#[derive(Debug, Deserialize)]
struct WrappedTrack {
    #[serde(default)]
    track: Option<ListedTrack>,
}

#[derive(Debug, Deserialize)]
struct ShowObject {
    #[serde(default)]
    name: String,
    #[serde(default)]
    publisher: String,
}

#[derive(Debug, Deserialize)]
struct EpisodeObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    show: Option<ShowObject>,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    images: Vec<ImageObject>,
    #[serde(default)]
    is_playable: Option<bool>,
    #[serde(default)]
    uri: String,
}

/// Playlists, artists, shows and album listing entries.
#[derive(Debug, Deserialize)]
struct NamedObject {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<Page<TrackObject>>,
    #[serde(default)]
    albums: Option<Page<AlbumObject>>,
    #[serde(default)]
    playlists: Option<Page<NamedObject>>,
    #[serde(default)]
    artists: Option<Page<NamedObject>>,
}

fn first_disc() -> u32 {
    1
}

// ==================== WebApiProvider ====================

/// Catalog metadata over HTTP plus audio through a fetch command.
pub struct WebApiProvider {
    client: Client,
    base_url: Url,
    token: Option<String>,
    fetcher: CommandFetcher,
}

impl std::fmt::Debug for WebApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebApiProvider")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.token.is_some())
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl WebApiProvider {
    /// Creates a provider for the default API root.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if HTTP client construction fails.
    pub fn new(token: Option<String>, fetcher: CommandFetcher) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_API_BASE_URL, token, fetcher)
    }

    /// Creates a provider against a custom API root (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Endpoint`] for an unparseable root and
    /// [`ProviderError::ClientBuild`] if client construction fails.
    #[instrument(skip(token, fetcher), fields(has_token = token.is_some()))]
    pub fn with_base_url(
        base_url: &str,
        token: Option<String>,
        fetcher: CommandFetcher,
    ) -> Result<Self, ProviderError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let parsed = Url::parse(&normalized)
            .map_err(|error| ProviderError::endpoint(base_url, error.to_string()))?;
        let token = token
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            client: build_http_client()?,
            base_url: parsed,
            token,
            fetcher,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|error| ProviderError::endpoint(path, error.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GETs `url` as JSON. Returns `Ok(None)` for 400/404.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ProviderError> {
        let mut attempts = 0_u32;
        loop {
            attempts += 1;
            let mut request = self.client.get(url.clone());
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            let response = request.send().await?;
            let status = response.status().as_u16();

            match status {
                200..=299 => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body)
                        .map(Some)
                        .map_err(|error| ProviderError::decode(url.as_str(), error.to_string()));
                }
                400 | 404 => {
                    debug!(url = %url, status, "catalog entity not found");
                    return Ok(None);
                }
                429 => {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_retry_after);
                    if attempts >= MAX_THROTTLE_ATTEMPTS {
                        return Err(ProviderError::Throttled {
                            url: url.to_string(),
                            attempts,
                            retry_after,
                        });
                    }
                    let wait = retry_after.unwrap_or(DEFAULT_THROTTLE_WAIT);
                    warn!(url = %url, attempts, wait_ms = wait.as_millis(), "catalog throttled, backing off");
                    tokio::time::sleep(wait).await;
                }
                _ => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ProviderError::Status {
                        url: url.to_string(),
                        status,
                        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                    });
                }
            }
        }
    }

    /// Collects every page of a listing by following `next` links.
    async fn get_all_pages<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>, ProviderError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0_usize;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                warn!(url = %url, "listing exceeded page limit, truncating");
                break;
            }
            let Some(page) = self.get_json::<Page<T>>(url).await? else {
                break;
            };
            items.extend(page.items.into_iter().flatten());
            next = page
                .next
                .map(|link| {
                    Url::parse(&link).map_err(|error| ProviderError::decode(&link, error.to_string()))
                })
                .transpose()?;
        }

        debug!(count = items.len(), pages, "listing collected");
        Ok(items)
    }

    async fn named(&self, path: &str) -> Result<Option<NamedEntry>, ProviderError> {
        let url = self.endpoint(path, &[])?;
        Ok(self
            .get_json::<NamedObject>(url)
            .await?
            .map(|object| NamedEntry::new(object.id, object.name)))
    }

    async fn named_listing(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<NamedEntry>, ProviderError> {
        let url = self.endpoint(path, query)?;
        Ok(self
            .get_all_pages::<NamedObject>(url)
            .await?
            .into_iter()
            .map(|object| NamedEntry::new(object.id, object.name))
            .collect())
    }

    async fn wrapped_songs(&self, url: Url) -> Result<Vec<SongRef>, ProviderError> {
        Ok(self
            .get_all_pages::<WrappedTrack>(url)
            .await?
            .into_iter()
            .filter_map(|entry| entry.track)
            .filter_map(song_ref)
            .collect())
    }
}

// ==================== Conversion Helpers ====================

fn join_artists(artists: &[ArtistObject]) -> String {
    artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn release_year(release_date: &str) -> Option<i32> {
    release_date.get(..4).and_then(|year| year.parse().ok())
}

fn first_image(images: &[ImageObject]) -> Option<String> {
    images.first().map(|image| image.url.clone())
}

fn song_ref(track: ListedTrack) -> Option<SongRef> {
    // Local files in playlists have no catalog id.
    track.id.map(|id| SongRef::new(id, track.disc_number))
}

fn track_item(requested_id: &str, track: TrackObject) -> CatalogItem {
    let id = track.id.unwrap_or_else(|| requested_id.to_string());
    let content_id = if track.uri.is_empty() {
        format!("spotify:track:{id}")
    } else {
        track.uri
    };
    let (album_name, album_artist, release_year, artwork_url) = match &track.album {
        Some(album) => (
            album.name.clone(),
            join_artists(&album.artists),
            release_year(&album.release_date),
            first_image(&album.images),
        ),
        None => (String::new(), String::new(), None, None),
    };

    CatalogItem {
        id,
        name: track.name,
        artist: join_artists(&track.artists),
        album_name,
        album_artist,
        number: track.track_number,
        disc_number: track.disc_number,
        release_year,
        is_playable: track.is_playable.unwrap_or(true),
        content_id,
        artwork_url,
    }
}

/// Episodes carry no number in the Web API, so `number` is 0. The show
/// stands in for artist and album.
fn episode_item(requested_id: &str, episode: EpisodeObject) -> CatalogItem {
    let id = episode.id.unwrap_or_else(|| requested_id.to_string());
    let content_id = if episode.uri.is_empty() {
        format!("spotify:episode:{id}")
    } else {
        episode.uri
    };
    let (show_name, publisher) = episode
        .show
        .map(|show| (show.name, show.publisher))
        .unwrap_or_default();

    CatalogItem {
        id,
        name: episode.name,
        artist: show_name.clone(),
        album_name: show_name,
        album_artist: publisher,
        number: 0,
        disc_number: 1,
        release_year: release_year(&episode.release_date),
        is_playable: episode.is_playable.unwrap_or(true),
        content_id,
        artwork_url: first_image(&episode.images),
    }
}

fn search_results(response: SearchResponse) -> SearchResults {
    let tracks = response
        .tracks
        .map(|page| page.items.into_iter().flatten().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|track| {
            let id = track.id?;
            Some(SearchHit {
                id,
                artists: Some(join_artists(&track.artists)),
                name: track.name,
                kind: SearchKind::Track,
            })
        })
        .collect();
    let albums = response
        .albums
        .map(|page| page.items.into_iter().flatten().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|album| {
            let id = album.id?;
            Some(SearchHit {
                id,
                artists: Some(join_artists(&album.artists)),
                name: album.name,
                kind: SearchKind::Album,
            })
        })
        .collect();

    SearchResults {
        tracks,
        albums,
        playlists: named_hits(response.playlists, SearchKind::Playlist),
        artists: named_hits(response.artists, SearchKind::Artist),
    }
}

fn named_hits(page: Option<Page<NamedObject>>, kind: SearchKind) -> Vec<SearchHit> {
    page.map(|page| page.items)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|object| SearchHit {
            id: object.id,
            name: object.name,
            artists: None,
            kind,
        })
        .collect()
}

#[async_trait]
impl CatalogProvider for WebApiProvider {
    #[instrument(skip(self))]
    async fn track_info(&self, id: &str) -> Result<Option<CatalogItem>, ProviderError> {
        let url = self.endpoint(&format!("tracks/{id}"), &[])?;
        Ok(self
            .get_json::<TrackObject>(url)
            .await?
            .map(|track| track_item(id, track)))
    }

    #[instrument(skip(self))]
    async fn episode_info(&self, id: &str) -> Result<Option<CatalogItem>, ProviderError> {
        let url = self.endpoint(&format!("episodes/{id}"), &[])?;
        Ok(self
            .get_json::<EpisodeObject>(url)
            .await?
            .map(|episode| episode_item(id, episode)))
    }

    #[instrument(skip(self))]
    async fn playlist_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError> {
        self.named(&format!("playlists/{id}")).await
    }

    #[instrument(skip(self))]
    async fn playlist_songs(&self, id: &str) -> Result<Vec<SongRef>, ProviderError> {
        let url = self.endpoint(&format!("playlists/{id}/tracks"), &[("limit", "100")])?;
        self.wrapped_songs(url).await
    }

    #[instrument(skip(self))]
    async fn album_info(&self, id: &str) -> Result<Option<AlbumInfo>, ProviderError> {
        let url = self.endpoint(&format!("albums/{id}"), &[])?;
        Ok(self.get_json::<AlbumObject>(url).await?.map(|album| AlbumInfo {
            artists: join_artists(&album.artists),
            name: album.name,
            release_date: album.release_date,
        }))
    }

    #[instrument(skip(self))]
    async fn album_songs(&self, id: &str) -> Result<Vec<SongRef>, ProviderError> {
        let url = self.endpoint(&format!("albums/{id}/tracks"), &[("limit", "50")])?;
        Ok(self
            .get_all_pages::<ListedTrack>(url)
            .await?
            .into_iter()
            .filter_map(song_ref)
            .collect())
    }

    #[instrument(skip(self))]
    async fn artist_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError> {
        self.named(&format!("artists/{id}")).await
    }

    #[instrument(skip(self))]
    async fn artist_albums(&self, id: &str) -> Result<Vec<NamedEntry>, ProviderError> {
        self.named_listing(
            &format!("artists/{id}/albums"),
            &[("include_groups", "album,single"), ("limit", "50")],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn show_info(&self, id: &str) -> Result<Option<NamedEntry>, ProviderError> {
        self.named(&format!("shows/{id}")).await
    }

    #[instrument(skip(self))]
    async fn show_episodes(&self, id: &str) -> Result<Vec<SongRef>, ProviderError> {
        let url = self.endpoint(&format!("shows/{id}/episodes"), &[("limit", "50")])?;
        Ok(self
            .get_all_pages::<ListedTrack>(url)
            .await?
            .into_iter()
            .filter_map(song_ref)
            .collect())
    }

    #[instrument(skip(self))]
    async fn liked_tracks(&self) -> Result<Vec<SongRef>, ProviderError> {
        let url = self.endpoint("me/tracks", &[("limit", "50")])?;
        self.wrapped_songs(url).await
    }

    #[instrument(skip(self))]
    async fn user_playlists(&self) -> Result<Vec<NamedEntry>, ProviderError> {
        self.named_listing("me/playlists", &[("limit", "50")]).await
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<SearchResults, ProviderError> {
        let limit = limit.to_string();
        let url = self.endpoint(
            "search",
            &[
                ("q", query),
                ("type", "track,album,playlist,artist"),
                ("limit", &limit),
            ],
        )?;
        Ok(self
            .get_json::<SearchResponse>(url)
            .await?
            .map(search_results)
            .unwrap_or_default())
    }

    async fn fetch_and_convert(
        &self,
        id: &str,
        category: ContentCategory,
        target_without_ext: &Path,
        format: AudioFormat,
    ) -> Result<Option<PathBuf>, ProviderError> {
        self.fetcher
            .fetch(id, category, target_without_ext, format)
            .await
    }
}

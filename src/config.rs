//! Immutable configuration handed to the traversal engine at construction.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Pause after each remote fetch.
pub const DEFAULT_SHORT_PAUSE: Duration = Duration::from_secs(5);

/// Pause after each album/playlist in a multi-batch operation.
pub const DEFAULT_LONG_PAUSE: Duration = Duration::from_secs(30);

/// Results per category for search-and-select.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Folder under the music root for the liked-songs collection.
pub const LIKED_SONGS_DIR: &str = "Liked Songs";

/// Output container requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Mp3,
    Ogg,
    /// Whatever the service delivers, without conversion.
    Source,
}

impl AudioFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Source => "source",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg" => Ok(Self::Ogg),
            "source" => Ok(Self::Source),
            other => Err(format!(
                "unsupported audio format '{other}', expected mp3, ogg or source"
            )),
        }
    }
}

/// Settings that shape traversal, naming, skipping and pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root for tracks, albums, playlists and liked songs.
    pub music_dir: PathBuf,
    /// Root for podcast episodes and shows.
    pub episodes_dir: PathBuf,
    pub audio_format: AudioFormat,
    /// Prefix album tracks / infix playlist tracks with the album name.
    pub album_in_filename: bool,
    /// Skip items whose file already exists at the expected path.
    pub skip_existing: bool,
    /// Skip items already recorded in the archive ledger.
    pub skip_downloaded: bool,
    pub short_pause: Duration,
    pub long_pause: Duration,
    pub search_limit: usize,
}

impl EngineConfig {
    /// Config rooted at the given directories, everything else default.
    #[must_use]
    pub fn new(music_dir: impl Into<PathBuf>, episodes_dir: impl Into<PathBuf>) -> Self {
        Self {
            music_dir: music_dir.into(),
            episodes_dir: episodes_dir.into(),
            audio_format: AudioFormat::default(),
            album_in_filename: false,
            skip_existing: true,
            skip_downloaded: false,
            short_pause: DEFAULT_SHORT_PAUSE,
            long_pause: DEFAULT_LONG_PAUSE,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

//! Merges CLI flags, environment and the config file into run settings.
//!
//! Precedence: CLI flag (or its environment variable) > config file >
//! built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use zspot_core::config::{DEFAULT_SEARCH_LIMIT, EngineConfig};
use zspot_core::CommandFetcher;

use super::config::{FileConfig, env_var_non_empty_os};
use crate::cli::Args;

/// Archive database file inside the config folder.
pub(crate) const ARCHIVE_DB_FILE: &str = "archive.db";

const DEFAULT_CONFIG_DIR: &str = ".zspotify";
const DEFAULT_DOWNLOAD_DIR: &str = "Music";
const MUSIC_SUBDIR: &str = "ZSpotify Music";
const EPISODES_SUBDIR: &str = "ZSpotify Podcast";
const DEFAULT_SHORT_PAUSE_SECS: u64 = 5;
const DEFAULT_LONG_PAUSE_SECS: u64 = 30;

/// Everything a run needs besides the collaborators themselves.
#[derive(Clone)]
pub(crate) struct Settings {
    pub(crate) engine: EngineConfig,
    pub(crate) config_dir: PathBuf,
    pub(crate) download_dir: PathBuf,
    pub(crate) token: Option<String>,
    pub(crate) api_base_url: Option<String>,
    pub(crate) fetcher: CommandFetcher,
    pub(crate) sidecar: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("engine", &self.engine)
            .field("config_dir", &self.config_dir)
            .field("download_dir", &self.download_dir)
            .field("has_token", &self.token.is_some())
            .field("api_base_url", &self.api_base_url)
            .field("fetcher", &self.fetcher)
            .field("sidecar", &self.sidecar)
            .finish()
    }
}

impl Settings {
    /// Resolves settings against the user's home directory.
    pub(crate) fn resolve(args: &Args, file: Option<FileConfig>) -> Result<Self> {
        let Some(home) = env_var_non_empty_os("HOME") else {
            bail!("HOME is not set; pass --config-dir and --download-dir explicitly");
        };
        Self::resolve_with_home(args, file.unwrap_or_default(), Path::new(&home))
    }

    pub(crate) fn resolve_with_home(args: &Args, file: FileConfig, home: &Path) -> Result<Self> {
        let config_dir = args
            .config_dir
            .clone()
            .or(file.config_dir)
            .unwrap_or_else(|| home.join(DEFAULT_CONFIG_DIR));
        let download_dir = args
            .download_dir
            .clone()
            .or(file.download_dir)
            .unwrap_or_else(|| home.join(DEFAULT_DOWNLOAD_DIR));
        let music_dir = args
            .music_dir
            .clone()
            .or(file.music_dir)
            .unwrap_or_else(|| download_dir.join(MUSIC_SUBDIR));
        let episodes_dir = args
            .episodes_dir
            .clone()
            .or(file.episodes_dir)
            .unwrap_or_else(|| download_dir.join(EPISODES_SUBDIR));

        let short_pause = args
            .antiban_time
            .or(file.antiban_time)
            .unwrap_or(DEFAULT_SHORT_PAUSE_SECS);
        let long_pause = args
            .antiban_album
            .or(file.antiban_album)
            .unwrap_or(DEFAULT_LONG_PAUSE_SECS);

        let mut engine = EngineConfig::new(music_dir, episodes_dir);
        engine.audio_format = args
            .audio_format
            .or(file.audio_format)
            .unwrap_or_default();
        engine.album_in_filename = args.album_in_filename || file.album_in_filename.unwrap_or(false);
        engine.skip_existing = !args.not_skip_existing && file.skip_existing.unwrap_or(true);
        engine.skip_downloaded = args.skip_downloaded || file.skip_downloaded.unwrap_or(false);
        engine.short_pause = Duration::from_secs(short_pause);
        engine.long_pause = Duration::from_secs(long_pause);
        engine.search_limit = args
            .limit
            .or(file.limit)
            .map_or(DEFAULT_SEARCH_LIMIT, usize::from);

        let fetcher = match args.fetch_command.as_deref().or(file.fetch_command.as_deref()) {
            Some(command_line) => match CommandFetcher::from_command_line(command_line) {
                Some(fetcher) => fetcher,
                None => bail!("Invalid fetch command: expected a program name"),
            },
            None => CommandFetcher::default(),
        };

        Ok(Self {
            engine,
            config_dir,
            download_dir,
            token: args.token.clone(),
            api_base_url: args.api_base_url.clone().or(file.api_base_url),
            fetcher,
            sidecar: !args.no_sidecar && file.sidecar.unwrap_or(true),
        })
    }

    /// Folders scanned for legacy ledger files, in scan order.
    pub(crate) fn migration_roots(&self) -> Vec<PathBuf> {
        vec![
            self.config_dir.clone(),
            self.download_dir.clone(),
            self.engine.music_dir.clone(),
            self.engine.episodes_dir.clone(),
        ]
    }

    pub(crate) fn archive_path(&self) -> PathBuf {
        self.config_dir.join(ARCHIVE_DB_FILE)
    }
}

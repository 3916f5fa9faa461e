//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use zspot_core::AudioFormat;

/// Bulk download tracks, albums, playlists, artists and podcast shows.
///
/// Pass a search query or a catalog URL as the positional argument, or use
/// one of the mode flags. Without either, zspot starts an interactive
/// search loop. Every mode flag accepts several ids or URLs separated by
/// `,` or `;`.
#[derive(Parser, Debug)]
#[command(name = "zspot")]
#[command(author, version, about)]
pub struct Args {
    /// Search query, or a catalog URL to download directly
    pub search: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    // ==================== Modes ====================
    /// Download every saved playlist of your library
    #[arg(long, alias = "ap")]
    pub all_playlists: bool,

    /// Choose playlists of your library to download
    #[arg(long, alias = "sp")]
    pub select_playlists: bool,

    /// Download your liked songs
    #[arg(long, alias = "ls")]
    pub liked_songs: bool,

    /// Download playlists by id or URL
    #[arg(long, alias = "pl", value_name = "ID|URL")]
    pub playlist: Option<String>,

    /// Download albums by id or URL
    #[arg(long, alias = "al", value_name = "ID|URL")]
    pub album: Option<String>,

    /// Download every album of artists by id or URL
    #[arg(long, alias = "ar", value_name = "ID|URL")]
    pub artist: Option<String>,

    /// Download tracks by id or URL
    #[arg(long, alias = "tr", value_name = "ID|URL")]
    pub track: Option<String>,

    /// Download podcast episodes by id or URL
    #[arg(long, alias = "ep", value_name = "ID|URL")]
    pub episode: Option<String>,

    /// Download every episode of shows by id or URL
    #[arg(long, alias = "fs", value_name = "ID|URL")]
    pub full_show: Option<String>,

    /// Download every URL listed in a file (one or more per line)
    #[arg(long, alias = "bd", value_name = "FILE")]
    pub bulk_download: Option<PathBuf>,

    // ==================== Locations ====================
    /// Folder holding the archive database [default: ~/.zspotify]
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Base download folder [default: ~/Music]
    #[arg(short = 'd', long)]
    pub download_dir: Option<PathBuf>,

    /// Folder for music [default: <download-dir>/ZSpotify Music]
    #[arg(long)]
    pub music_dir: Option<PathBuf>,

    /// Folder for podcast episodes [default: <download-dir>/ZSpotify Podcast]
    #[arg(long)]
    pub episodes_dir: Option<PathBuf>,

    // ==================== Behaviour ====================
    /// Audio format: mp3, ogg, or source to keep the delivered format [default: mp3]
    #[arg(long)]
    pub audio_format: Option<AudioFormat>,

    /// Add the album name to track filenames
    #[arg(long)]
    pub album_in_filename: bool,

    /// Seconds to wait after each download (0-3600) [default: 5]
    #[arg(long, env = "ANTI_BAN_WAIT_TIME", value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub antiban_time: Option<u64>,

    /// Seconds to wait after each album or playlist of a batch (0-3600) [default: 30]
    #[arg(long, env = "ANTI_BAN_WAIT_TIME_ALBUMS", value_parser = clap::value_parser!(u64).range(0..=3600))]
    pub antiban_album: Option<u64>,

    /// Search results per category (1-50) [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=50))]
    pub limit: Option<u8>,

    /// Re-download files that already exist on disk
    #[arg(long, alias = "ns")]
    pub not_skip_existing: bool,

    /// Skip items recorded in the archive even if the file is gone
    #[arg(short = 's', long)]
    pub skip_downloaded: bool,

    /// Do not write JSON metadata sidecars
    #[arg(long)]
    pub no_sidecar: bool,

    // ==================== Provider ====================
    /// Web API access token
    #[arg(long, env = "ZSPOT_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Web API root URL
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Command that fetches audio: `<cmd> <category> <id> <target> <format>`
    #[arg(long)]
    pub fetch_command: Option<String>,
}

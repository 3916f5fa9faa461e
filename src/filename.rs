//! Filename construction and sanitization for downloaded items.
//!
//! Names are built from an item's display metadata and the traversal context
//! it was reached from, bounded to [`FILENAME_BUDGET`] characters, then made
//! safe for common filesystems. The caller appends the extension.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Character budget for an assembled filename (before the extension).
pub const FILENAME_BUDGET: usize = 75;

/// Replaces an overlong artist segment.
pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// Traversal context an item was reached from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilenameContext {
    Track,
    Album,
    Playlist,
    Show,
    Episode,
    LikedSongs,
    None,
}

impl FilenameContext {
    /// Returns true for contexts whose items are podcast episodes.
    #[must_use]
    pub fn is_episodic(self) -> bool {
        matches!(self, Self::Show | Self::Episode)
    }

    /// Stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Playlist => "playlist",
            Self::Show => "show",
            Self::Episode => "episode",
            Self::LikedSongs => "liked_songs",
            Self::None => "none",
        }
    }
}

/// Display metadata the filename is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct FilenameParts<'a> {
    pub name: &'a str,
    pub number: u32,
    pub artist: &'a str,
    pub album_artist: &'a str,
    pub album_name: &'a str,
}

/// Builds the deterministic, length-bounded, sanitized filename for an item.
///
/// | context | pattern |
/// |---|---|
/// | album | `{number}. {name}`, prefixed by `{album} ` when `album_in_filename` |
/// | playlist | `{artist} - {name}`, or `{artist} - {album} - {name}` |
/// | show | `{number}. {name}` |
/// | episode | `{artist} - {number}. {name}` |
/// | track, liked songs, none | `{artist} - {name}` |
///
/// When the assembled name exceeds [`FILENAME_BUDGET`] and the artist
/// segment alone is longer than half the budget, the artist segment becomes
/// [`VARIOUS_ARTISTS`]. If the name still does not fit, the name segment is
/// cut to whatever the rest of the assembled string leaves of the budget.
/// Only when the other segments alone exceed the budget is the result
/// longer than [`FILENAME_BUDGET`].
///
/// # Examples
///
/// ```
/// use zspot_core::filename::{FilenameContext, FilenameParts, build_filename};
///
/// let parts = FilenameParts {
///     name: "Intro",
///     number: 1,
///     artist: "The xx",
///     album_artist: "The xx",
///     album_name: "xx",
/// };
/// assert_eq!(build_filename(FilenameContext::Album, &parts, false), "1. Intro");
/// assert_eq!(build_filename(FilenameContext::Track, &parts, false), "The xx - Intro");
/// ```
#[must_use]
pub fn build_filename(
    context: FilenameContext,
    parts: &FilenameParts<'_>,
    album_in_filename: bool,
) -> String {
    let assemble_with = |name: &str, artist: &str| {
        assemble(
            context,
            name,
            parts.number,
            artist,
            parts.album_name,
            album_in_filename,
        )
    };

    let assembled = assemble_with(parts.name, parts.artist);
    if char_len(&assembled) <= FILENAME_BUDGET {
        return sanitize_filename(&assembled);
    }

    let artist = if has_artist_segment(context) && char_len(parts.artist) > FILENAME_BUDGET / 2 {
        VARIOUS_ARTISTS
    } else {
        parts.artist
    };
    let candidate = assemble_with(parts.name, artist);
    if char_len(&candidate) <= FILENAME_BUDGET {
        return sanitize_filename(&candidate);
    }

    // Whatever the other segments leave over goes to the name.
    let overhead = char_len(&assemble_with("", artist));
    let truncated: String = parts
        .name
        .chars()
        .take(FILENAME_BUDGET.saturating_sub(overhead))
        .collect();
    sanitize_filename(&assemble_with(&truncated, artist))
}

fn assemble(
    context: FilenameContext,
    name: &str,
    number: u32,
    artist: &str,
    album_name: &str,
    album_in_filename: bool,
) -> String {
    match context {
        FilenameContext::Album if album_in_filename => format!("{album_name} {number}. {name}"),
        FilenameContext::Album | FilenameContext::Show => format!("{number}. {name}"),
        FilenameContext::Playlist if album_in_filename => {
            format!("{artist} - {album_name} - {name}")
        }
        FilenameContext::Episode => format!("{artist} - {number}. {name}"),
        FilenameContext::Playlist
        | FilenameContext::Track
        | FilenameContext::LikedSongs
        | FilenameContext::None => format!("{artist} - {name}"),
    }
}

fn has_artist_segment(context: FilenameContext) -> bool {
    !matches!(context, FilenameContext::Album | FilenameContext::Show)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Sanitizes a name for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems
/// (`/ \ : * ? " < > |`) and control characters with `_`, trims surrounding
/// whitespace, and rewrites names that would act as path components
/// (`.`, `..`). Total: always returns a non-empty, representable name.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(sanitized) {
        sanitized.to_string()
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Zero-pads a number to `width` digits, used for disc subfolders.
#[must_use]
pub fn zero_pad(value: u32, width: usize) -> String {
    format!("{value:0width$}")
}

/// Appends `.{extension}` to a path without touching dots already in the
/// file name (`"1. Song"` must not lose its `". Song"`).
#[must_use]
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

//! Locator resolution: classify user input as a catalog URL, URI or bare id.
//!
//! Recognized shapes, one capture per category:
//! - `https://open.spotify.com/{category}/{id}` (optionally with an
//!   `intl-xx/` locale segment, a legacy `user/{name}/` prefix, and a query)
//! - `spotify:{category}:{id}`
//!
//! Anything that looks like a catalog URL but matches none of the shapes
//! resolves to [`Category::None`] without an id, which callers report as an
//! invalid locator. Plain tokens resolve to [`Category::None`] *with* an id,
//! so a caller that knows the category from context can apply it through
//! [`Locator::in_context`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

/// Separators accepted between several locators in one input value.
pub const SEPARATORS: [char; 2] = [',', ';'];

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?open\.spotify\.com/(?:intl-[A-Za-z-]+/)?(?:user/[^/]+/)?(track|playlist|album|artist|episode|show)/([0-9A-Za-z]+)(?:[/?#].*)?$",
    )
    .expect("locator URL regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^spotify:(?:user:[^:]+:)?(track|playlist|album|artist|episode|show):([0-9A-Za-z]+)$",
    )
    .expect("locator URI regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static BARE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z]+$").expect("bare id regex is valid") // Static pattern, safe to panic
});

/// Catalog category a locator points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Track,
    Playlist,
    Album,
    Artist,
    Episode,
    Show,
    /// Unrecognized, or a bare id whose category only the caller knows.
    None,
}

impl Category {
    /// Returns the lowercase label used in URLs and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Playlist => "playlist",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Episode => "episode",
            Self::Show => "show",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "track" => Ok(Self::Track),
            "playlist" => Ok(Self::Playlist),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            "episode" => Ok(Self::Episode),
            "show" => Ok(Self::Show),
            "none" => Ok(Self::None),
            other => Err(format!("unknown catalog category '{other}'")),
        }
    }
}

/// A resolved user input token. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    category: Category,
    id: Option<String>,
}

impl Locator {
    /// The input exactly as supplied.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    /// Canonical id, absent for unrecognized URLs and empty input.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Applies a caller-supplied category to a bare id.
    ///
    /// URLs and URIs keep the category they encode; unrecognized URLs stay
    /// unresolved.
    #[must_use]
    pub fn in_context(mut self, category: Category) -> Self {
        if self.category == Category::None && self.id.is_some() {
            self.category = category;
        }
        self
    }
}

/// Resolves one input token into a [`Locator`]. Performs no network I/O.
///
/// # Examples
///
/// ```
/// use zspot_core::locator::{Category, resolve};
///
/// let locator = resolve("https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=x");
/// assert_eq!(locator.category(), Category::Album);
/// assert_eq!(locator.id(), Some("4aawyAB9vmqN3uQ7FjRGTy"));
///
/// let bare = resolve("4aawyAB9vmqN3uQ7FjRGTy").in_context(Category::Playlist);
/// assert_eq!(bare.category(), Category::Playlist);
/// ```
#[must_use]
#[tracing::instrument(level = "trace")]
pub fn resolve(input: &str) -> Locator {
    let trimmed = input.trim();

    let captures = URL_PATTERN
        .captures(trimmed)
        .or_else(|| URI_PATTERN.captures(trimmed));
    if let Some(captures) = captures {
        let category = captures
            .get(1)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(Category::None);
        let id = captures.get(2).map(|m| m.as_str().to_string());
        trace!(category = %category, id = ?id, "matched catalog locator");
        return Locator {
            raw: input.to_string(),
            category,
            id,
        };
    }

    let id = if !is_catalog_url(trimmed) && BARE_ID_PATTERN.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        debug!(input = %trimmed, "unrecognized locator");
        None
    };

    Locator {
        raw: input.to_string(),
        category: Category::None,
        id,
    }
}

/// Returns true when the input is addressed at the catalog service rather
/// than being a bare id or a search query.
#[must_use]
pub fn is_catalog_url(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.contains("spotify.com") || trimmed.starts_with("spotify:") || trimmed.contains("://")
}

/// Splits an input value holding several locators.
///
/// The first separator present in the value wins; surrounding whitespace is
/// trimmed and empty tokens are dropped.
#[must_use]
pub fn split_input(value: &str) -> Vec<&str> {
    let separator = SEPARATORS.iter().copied().find(|sep| value.contains(*sep));
    let tokens: Vec<&str> = match separator {
        Some(sep) => value.split(sep).collect(),
        None => vec![value],
    };
    tokens
        .into_iter()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

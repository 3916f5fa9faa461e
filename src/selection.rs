//! Parsing of interactive index selections like `2,4-6,9`.
//!
//! Grammar: comma-separated tokens, each either a single index or an
//! inclusive range `a-b`. A range typed larger-first (`5-3`) is normalized
//! to `3-5`. Indices are 1-based; anything outside `[1, max_index]` is
//! reported back as invalid instead of being dropped silently.
//!
//! The literals `all` and `exit` are not part of the grammar; callers
//! classify raw input with [`SelectionCommand::classify`] first.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

/// Widest range a single token may expand to.
pub const MAX_RANGE_SPAN: usize = 10_000;

/// Errors that reject a whole selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// A token is neither an integer nor an `a-b` range.
    #[error("invalid selection '{token}': {reason}")]
    Malformed { token: String, reason: String },

    /// A range expands to more indices than any listing could hold.
    #[error("selection range '{token}' spans {span} indices (max {MAX_RANGE_SPAN})")]
    RangeTooLarge { token: String, span: usize },
}

impl SelectionError {
    fn malformed(token: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parsed selection split by bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// In-bounds indices, ascending.
    pub valid: BTreeSet<usize>,
    /// Out-of-bounds indices, ascending.
    pub invalid: BTreeSet<usize>,
}

impl Selection {
    /// Selects every index in `[1, max_index]`.
    #[must_use]
    pub fn all(max_index: usize) -> Self {
        Self {
            valid: (1..=max_index).collect(),
            invalid: BTreeSet::new(),
        }
    }
}

/// What the user typed at a selection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand<'a> {
    All,
    Exit,
    Empty,
    /// Anything else, to be handed to [`parse_selection`].
    Indices(&'a str),
}

impl<'a> SelectionCommand<'a> {
    #[must_use]
    pub fn classify(input: &'a str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else if trimmed.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else {
            Self::Indices(trimmed)
        }
    }
}

/// Parses `input` against a listing of `max_index` entries.
///
/// # Errors
///
/// Returns [`SelectionError::Malformed`] for a non-numeric or empty token
/// and [`SelectionError::RangeTooLarge`] for a range wider than
/// [`MAX_RANGE_SPAN`].
///
/// # Examples
///
/// ```
/// use zspot_core::selection::parse_selection;
///
/// let selection = parse_selection("2,4-6,9", 10).unwrap();
/// assert_eq!(selection.valid.into_iter().collect::<Vec<_>>(), vec![2, 4, 5, 6, 9]);
/// assert!(selection.invalid.is_empty());
/// ```
pub fn parse_selection(input: &str, max_index: usize) -> Result<Selection, SelectionError> {
    let mut selection = Selection::default();

    for raw_token in input.split(',') {
        let token = raw_token.trim();
        let (low, high) = parse_token(token)?;
        for index in low..=high {
            if (1..=max_index).contains(&index) {
                selection.valid.insert(index);
            } else {
                selection.invalid.insert(index);
            }
        }
    }

    debug!(
        valid = selection.valid.len(),
        invalid = selection.invalid.len(),
        max_index,
        "parsed selection"
    );
    Ok(selection)
}

fn parse_token(token: &str) -> Result<(usize, usize), SelectionError> {
    if token.is_empty() {
        return Err(SelectionError::malformed(token, "empty entry"));
    }

    let bounds: Vec<&str> = token.split('-').map(str::trim).collect();
    let (first, last) = match bounds.as_slice() {
        [single] => {
            let index = parse_index(token, single)?;
            (index, index)
        }
        [first, last] => (parse_index(token, first)?, parse_index(token, last)?),
        _ => return Err(SelectionError::malformed(token, "expected N or N-M")),
    };

    let (low, high) = if first <= last {
        (first, last)
    } else {
        (last, first)
    };
    let span = high - low + 1;
    if span > MAX_RANGE_SPAN {
        return Err(SelectionError::RangeTooLarge {
            token: token.to_string(),
            span,
        });
    }
    Ok((low, high))
}

fn parse_index(token: &str, value: &str) -> Result<usize, SelectionError> {
    value
        .parse::<usize>()
        .map_err(|_| SelectionError::malformed(token, format!("'{value}' is not a number")))
}

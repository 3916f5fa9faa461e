//! Interactive selection flows: library playlists and search results.

use tracing::{info, instrument, warn};

use super::TraversalEngine;
use crate::catalog::{SearchHit, SearchKind, SearchResults, SelectionPrompt};
use crate::locator::is_catalog_url;
use crate::selection::{Selection, SelectionCommand, parse_selection};

pub(super) const PLAYLIST_INSTRUCTIONS: &str = "\
> SELECT A PLAYLIST BY ID.
> SELECT A RANGE BY ADDING A DASH BETWEEN BOTH ID's.
  For example, typing 10 to get one playlist or 10-20 to get
  every playlist from 10-20 (inclusive).
> SELECT MULTIPLE PLAYLISTS BY ADDING A COMMA BETWEEN IDs.
  For example, typing 10,11,20 will select playlists
  10, 11 and 20 respectively.
  Typing 1,11-20 will select playlists 1 and 11-20 (inclusive).
ID(s): ";

const SEARCH_INSTRUCTIONS: &str = "\
Enter the number of the item you want to download
allowed delimiters: [',', ';']
Enter 'all' to download all items
Enter 'exit' to exit
>>>";

impl TraversalEngine {
    /// Searches the catalog, lists every hit under one running index and
    /// downloads the selected hits in ascending index order.
    ///
    /// A query that is itself a catalog URL skips the search and is
    /// dispatched directly. Returns `false` on no results, `exit`, exhausted
    /// input or a malformed selection.
    #[instrument(skip(self, prompt))]
    pub async fn search_and_select(&self, query: &str, prompt: &dyn SelectionPrompt) -> bool {
        if is_catalog_url(query) {
            return self.download_by_locator(query).await;
        }

        let results = match self
            .provider
            .search(query, self.config.search_limit)
            .await
        {
            Ok(results) if !results.is_empty() => results,
            Ok(_) => {
                info!("No results found");
                return false;
            }
            Err(error) => {
                warn!(error = %error, "No results found");
                return false;
            }
        };

        let hits = results.enumerate();
        let listing = search_listing(&results);
        let Some(selection) = self
            .prompt_selection(prompt, &listing, SEARCH_INSTRUCTIONS, hits.len())
            .await
        else {
            return false;
        };

        for hit in selection.valid.iter().filter_map(|index| hits.get(index - 1)) {
            self.download_hit(hit).await;
        }
        true
    }

    async fn download_hit(&self, hit: &SearchHit) -> bool {
        match hit.kind {
            SearchKind::Track => self.download_track(&hit.id).await,
            SearchKind::Album => self.download_album(&hit.id).await,
            SearchKind::Playlist => self.download_playlist(&hit.id).await,
            SearchKind::Artist => self.download_artist(&hit.id).await,
        }
    }

    /// Asks for a selection over `count` entries until a non-empty answer
    /// arrives. Out-of-range indices are reported and dropped.
    ///
    /// Returns `None` on `exit`, exhausted input, a malformed selection or
    /// a selection without any valid index.
    pub(super) async fn prompt_selection(
        &self,
        prompt: &dyn SelectionPrompt,
        listing: &[String],
        instructions: &str,
        count: usize,
    ) -> Option<Selection> {
        loop {
            let raw = prompt.choose(listing, instructions).await?;
            let selection = match SelectionCommand::classify(&raw) {
                SelectionCommand::Empty => continue,
                SelectionCommand::Exit => return None,
                SelectionCommand::All => Selection::all(count),
                SelectionCommand::Indices(input) => {
                    match parse_selection(&input.replace(';', ","), count) {
                        Ok(selection) => selection,
                        Err(error) => {
                            warn!("{error}");
                            return None;
                        }
                    }
                }
            };

            if !selection.invalid.is_empty() {
                let invalid: Vec<usize> = selection.invalid.iter().copied().collect();
                warn!("{invalid:?} do not exist, downloading the rest");
            }
            if selection.valid.is_empty() {
                return None;
            }
            return Some(selection);
        }
    }
}

/// Display lines for search results, grouped by kind with one running
/// 1-based index across groups.
fn search_listing(results: &SearchResults) -> Vec<String> {
    let groups = [
        ("TRACKS", &results.tracks),
        ("ALBUMS", &results.albums),
        ("PLAYLISTS", &results.playlists),
        ("ARTISTS", &results.artists),
    ];
    let mut lines = Vec::new();
    let mut index = 1;
    for (title, hits) in groups {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(title.to_string());
        for hit in hits {
            lines.push(format!("{index}. {}", hit.label()));
            index += 1;
        }
    }
    lines
}

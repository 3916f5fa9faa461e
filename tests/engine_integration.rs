//! Integration tests for the traversal engine.
//!
//! These drive `TraversalEngine` end to end over an in-memory catalog, a real
//! in-memory archive database and a temporary download tree.

use std::path::PathBuf;

use zspot_core::{
    AlbumInfo, ArchiveRecord, Category, ContentCategory, Ledger, SearchHit, SearchKind,
    SearchResults, SongRef,
};

mod support;
use support::fakes::{FakeCatalog, Harness, ScriptedPrompt, item};

fn road_trip() -> FakeCatalog {
    FakeCatalog::new()
        .with_simple_track("trackA", "A")
        .with_simple_track("trackB", "B")
        .with_simple_track("trackC", "C")
        .with_playlist("roadtrip", "Road Trip", &["trackA", "trackB", "trackC"])
}

fn album_info(name: &str) -> AlbumInfo {
    AlbumInfo {
        name: name.to_string(),
        artists: "Band".to_string(),
        release_date: "2020-01-01".to_string(),
    }
}

// ==================== Playlist Tests ====================

#[tokio::test]
async fn test_playlist_downloads_in_listing_order() {
    let harness = Harness::new(road_trip()).await;

    assert!(harness.engine.download_playlist("roadtrip").await);

    assert_eq!(harness.recorded_ids().await, vec!["trackA", "trackB", "trackC"]);
    assert_eq!(harness.catalog.fetched(), vec!["trackA", "trackB", "trackC"]);
    let dir = harness.music_dir().join("Road Trip");
    for name in ["Artist - A.mp3", "Artist - B.mp3", "Artist - C.mp3"] {
        assert!(dir.join(name).is_file(), "missing {name}");
    }
    assert_eq!(harness.tagger.tagged().len(), 3);
    assert_eq!(harness.engine.stats().downloaded(), 3);
}

#[tokio::test]
async fn test_playlist_missing_or_empty_returns_false() {
    let catalog = FakeCatalog::new().with_playlist("empty", "Nothing", &[]);
    let harness = Harness::new(catalog).await;

    assert!(!harness.engine.download_playlist("missing").await);
    assert!(!harness.engine.download_playlist("empty").await);
    assert!(harness.catalog.fetched().is_empty());
}

#[tokio::test]
async fn test_playlist_skips_recorded_items_when_skip_downloaded() {
    let harness = Harness::with_config(road_trip(), |config| config.skip_downloaded = true).await;
    harness
        .archive
        .add(&ArchiveRecord {
            id: "trackA".to_string(),
            artist: "Artist".to_string(),
            track_name: "A".to_string(),
            full_path: PathBuf::from("/elsewhere/Artist - A.mp3"),
            category: ContentCategory::Music,
            size_bytes: Some(10),
        })
        .await
        .unwrap();

    assert!(harness.engine.download_playlist("roadtrip").await);

    assert_eq!(harness.catalog.fetched(), vec!["trackB", "trackC"]);
    assert_eq!(harness.recorded_ids().await, vec!["trackA", "trackB", "trackC"]);
    assert_eq!(harness.engine.stats().skipped(), 1);
    assert_eq!(harness.engine.stats().downloaded(), 2);
}

#[tokio::test]
async fn test_rerun_skips_existing_files_without_new_records() {
    let harness = Harness::new(road_trip()).await;
    assert!(harness.engine.download_playlist("roadtrip").await);
    let records_after_first = harness.archive.records().await.unwrap();

    assert!(harness.engine.download_playlist("roadtrip").await);

    assert_eq!(harness.catalog.fetched().len(), 3, "second run must not fetch");
    assert_eq!(harness.archive.records().await.unwrap(), records_after_first);
    assert_eq!(harness.engine.stats().skipped(), 3);
}

#[tokio::test]
async fn test_rerun_refetches_file_truncated_below_recorded_size() {
    let harness = Harness::new(road_trip()).await;
    assert!(harness.engine.download_playlist("roadtrip").await);
    let partial = harness.music_dir().join("Road Trip").join("Artist - B.mp3");
    std::fs::write(&partial, b"ID3").unwrap();

    assert!(harness.engine.download_playlist("roadtrip").await);

    assert_eq!(
        harness.catalog.fetched(),
        vec!["trackA", "trackB", "trackC", "trackB"]
    );
    assert_eq!(std::fs::read(&partial).unwrap(), b"ID3 fake audio");
    assert_eq!(harness.recorded_ids().await, vec!["trackA", "trackB", "trackC"]);
    assert_eq!(harness.engine.stats().skipped(), 2);
}

#[tokio::test]
async fn test_failed_fetch_is_not_recorded_and_batch_continues() {
    let harness = Harness::new(road_trip().with_failing_fetch("trackB")).await;

    assert!(harness.engine.download_playlist("roadtrip").await);

    assert_eq!(harness.recorded_ids().await, vec!["trackA", "trackC"]);
    assert_eq!(harness.engine.stats().failed(), 1);
    assert_eq!(harness.pacer.short_waits(), 3, "every fetch attempt is paced");
}

// ==================== Album Tests ====================

#[tokio::test]
async fn test_multi_disc_album_uses_disc_folders() {
    let catalog = FakeCatalog::new()
        .with_track(item("open1", "Opening", "Band", 1, 1))
        .with_track(item("encore1", "Encore", "Band", 1, 2))
        .with_album(
            "live",
            album_info("Live"),
            vec![SongRef::new("open1", 1), SongRef::new("encore1", 2)],
        );
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_album("live").await);

    let base = harness.music_dir().join("Band").join("2020-01-01 - Live");
    assert!(base.join("01").join("1. Opening.mp3").is_file());
    assert!(base.join("02").join("1. Encore.mp3").is_file());
}

#[tokio::test]
async fn test_single_disc_album_has_no_disc_folder() {
    let catalog = FakeCatalog::new()
        .with_track(item("one", "One", "Band", 1, 1))
        .with_track(item("two", "Two", "Band", 2, 1))
        .with_album(
            "studio",
            album_info("Studio"),
            vec![SongRef::new("one", 1), SongRef::new("two", 1)],
        );
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_album("studio").await);

    let base = harness.music_dir().join("Band").join("2020-01-01 - Studio");
    assert!(base.join("1. One.mp3").is_file());
    assert!(base.join("2. Two.mp3").is_file());
}

#[tokio::test]
async fn test_unplayable_track_is_reported_and_skipped() {
    let mut hidden = item("hidden", "Hidden", "Band", 2, 1);
    hidden.is_playable = false;
    let catalog = FakeCatalog::new()
        .with_track(item("shown", "Shown", "Band", 1, 1))
        .with_track(hidden)
        .with_album(
            "partial",
            album_info("Partial"),
            vec![SongRef::new("shown", 1), SongRef::new("hidden", 1)],
        );
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_album("partial").await);

    assert_eq!(harness.catalog.fetched(), vec!["shown"]);
    assert_eq!(harness.engine.stats().unavailable(), 1);
    assert!(!harness.engine.download_track("hidden").await);
}

// ==================== Artist Tests ====================

#[tokio::test]
async fn test_artist_waits_long_after_each_album() {
    let mut catalog = FakeCatalog::new().with_artist("band", "Band", &["al1", "al2", "al3"]);
    for (album, track) in [("al1", "t1"), ("al2", "t2"), ("al3", "t3")] {
        catalog = catalog
            .with_track(item(track, track, "Band", 1, 1))
            .with_album(album, album_info(album), vec![SongRef::new(track, 1)]);
    }
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_artist("band").await);

    assert_eq!(harness.pacer.long_waits(), 3);
    assert_eq!(harness.pacer.short_waits(), 3);
    assert_eq!(harness.recorded_ids().await, vec!["t1", "t2", "t3"]);
}

#[tokio::test]
async fn test_artist_without_albums_returns_false() {
    let catalog = FakeCatalog::new().with_artist("quiet", "Quiet", &[]);
    let harness = Harness::new(catalog).await;

    assert!(!harness.engine.download_artist("quiet").await);
    assert!(!harness.engine.download_artist("unknown").await);
    assert_eq!(harness.pacer.long_waits(), 0);
}

// ==================== Show, Episode and Liked Songs Tests ====================

#[tokio::test]
async fn test_show_episodes_land_in_show_folder() {
    let mut episode = item("ep1", "Pilot", "Tech Talk", 0, 1);
    episode.album_name = "Tech Talk".to_string();
    let catalog = FakeCatalog::new()
        .with_episode(episode)
        .with_show("talk", "Tech Talk", &["ep1"]);
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_show("talk").await);

    assert!(harness.episodes_dir().join("Tech Talk").join("0. Pilot.mp3").is_file());
    let record = harness.archive.get("ep1").await.unwrap().unwrap();
    assert_eq!(record.category, ContentCategory::Episode);
}

#[tokio::test]
async fn test_single_episode_lands_in_episodes_root() {
    let catalog = FakeCatalog::new().with_episode(item("ep2", "Finale", "Tech Talk", 0, 1));
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_episode("ep2").await);
    assert!(harness.episodes_dir().join("Tech Talk - 0. Finale.mp3").is_file());
}

#[tokio::test]
async fn test_liked_songs_land_in_liked_folder() {
    let catalog = FakeCatalog::new()
        .with_simple_track("fav", "Favourite")
        .with_liked(&["fav"]);
    let harness = Harness::new(catalog).await;

    assert!(harness.engine.download_liked_songs().await);
    assert!(
        harness
            .music_dir()
            .join("Liked Songs")
            .join("Artist - Favourite.mp3")
            .is_file()
    );
}

#[tokio::test]
async fn test_empty_liked_songs_returns_false() {
    let harness = Harness::new(FakeCatalog::new()).await;
    assert!(!harness.engine.download_liked_songs().await);
}

// ==================== Library Tests ====================

fn library() -> FakeCatalog {
    FakeCatalog::new()
        .with_simple_track("s1", "One")
        .with_simple_track("s2", "Two")
        .with_simple_track("s3", "Three")
        .with_playlist("pl1", "First", &["s1"])
        .with_playlist("pl2", "Second", &["s2"])
        .with_playlist("pl3", "Third", &["s3"])
        .with_library(&["pl1", "pl2", "pl3"])
}

#[tokio::test]
async fn test_all_library_playlists_pause_after_each() {
    let harness = Harness::new(library()).await;

    assert!(harness.engine.download_all_playlists().await);

    assert_eq!(harness.recorded_ids().await, vec!["s1", "s2", "s3"]);
    assert_eq!(harness.pacer.long_waits(), 3);
}

#[tokio::test]
async fn test_selected_playlists_ignore_out_of_range_indices() {
    let harness = Harness::new(library()).await;
    let prompt = ScriptedPrompt::new(&["3,1,7"]);

    assert!(harness.engine.download_selected_playlists(&prompt).await);

    assert_eq!(harness.recorded_ids().await, vec!["s1", "s3"]);
    let listings = prompt.listings();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0][0], "    1. First");
}

#[tokio::test]
async fn test_selected_playlists_range_and_reprompt_on_empty() {
    let harness = Harness::new(library()).await;
    let prompt = ScriptedPrompt::new(&["", "2-3"]);

    assert!(harness.engine.download_selected_playlists(&prompt).await);

    assert_eq!(prompt.listings().len(), 2);
    assert_eq!(harness.recorded_ids().await, vec!["s2", "s3"]);
}

#[tokio::test]
async fn test_selected_playlists_exit_or_garbage_downloads_nothing() {
    for answer in ["exit", "abc", "9"] {
        let harness = Harness::new(library()).await;
        let prompt = ScriptedPrompt::new(&[answer]);

        assert!(!harness.engine.download_selected_playlists(&prompt).await, "answer {answer}");
        assert!(harness.catalog.fetched().is_empty());
    }
}

// ==================== Locator Dispatch Tests ====================

#[tokio::test]
async fn test_locator_dispatches_by_category() {
    let harness = Harness::new(road_trip()).await;

    assert!(
        harness
            .engine
            .download_by_locator("https://open.spotify.com/playlist/roadtrip?si=share")
            .await
    );
    assert_eq!(harness.recorded_ids().await.len(), 3);
}

#[tokio::test]
async fn test_invalid_locators_return_false() {
    let harness = Harness::new(road_trip()).await;

    assert!(!harness.engine.download_by_locator("https://example.com/x").await);
    assert!(!harness.engine.download_by_locator("trackA").await, "bare id has no category");
    assert!(!harness.engine.download_by_locator("not a locator").await);
    assert!(harness.catalog.fetched().is_empty());
}

#[tokio::test]
async fn test_bare_id_in_context() {
    let harness = Harness::new(road_trip()).await;

    assert!(harness.engine.download_in_context("trackB", Category::Track).await);
    assert!(harness.music_dir().join("Artist - B.mp3").is_file());
}

#[tokio::test]
async fn test_bulk_ignores_comments_and_reports_failures() {
    let harness = Harness::new(road_trip()).await;
    let contents = "\
# weekend
https://open.spotify.com/track/trackA

spotify:track:trackB, https://open.spotify.com/track/missing
";

    assert!(!harness.engine.download_bulk(contents).await);
    assert_eq!(harness.recorded_ids().await, vec!["trackA", "trackB"]);

    let harness = Harness::new(road_trip()).await;
    assert!(
        harness
            .engine
            .download_bulk("https://open.spotify.com/track/trackC\n")
            .await
    );
}

// ==================== Search Tests ====================

fn hit(id: &str, kind: SearchKind) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        name: id.to_string(),
        artists: Some("Artist".to_string()),
        kind,
    }
}

fn searchable() -> FakeCatalog {
    road_trip().with_search_results(SearchResults {
        tracks: vec![hit("trackA", SearchKind::Track)],
        albums: vec![],
        playlists: vec![hit("roadtrip", SearchKind::Playlist)],
        artists: vec![],
    })
}

#[tokio::test]
async fn test_search_selection_downloads_chosen_hits() {
    let harness = Harness::new(searchable()).await;
    let prompt = ScriptedPrompt::new(&["1"]);

    assert!(harness.engine.search_and_select("road trip", &prompt).await);

    assert_eq!(harness.catalog.fetched(), vec!["trackA"]);
    let listing = &prompt.listings()[0];
    assert!(listing.contains(&"1. Artist - trackA".to_string()));
    assert!(listing.contains(&"2. Artist - roadtrip".to_string()));
}

#[tokio::test]
async fn test_search_all_downloads_every_hit() {
    let harness = Harness::new(searchable()).await;
    let prompt = ScriptedPrompt::new(&["all"]);

    assert!(harness.engine.search_and_select("road trip", &prompt).await);

    // The playlist copy of trackA lives in another folder, so it is fetched again.
    assert_eq!(
        harness.catalog.fetched(),
        vec!["trackA", "trackA", "trackB", "trackC"]
    );
}

#[tokio::test]
async fn test_search_exit_and_no_results_return_false() {
    let harness = Harness::new(searchable()).await;
    let prompt = ScriptedPrompt::new(&["exit"]);
    assert!(!harness.engine.search_and_select("road trip", &prompt).await);

    let harness = Harness::new(FakeCatalog::new()).await;
    let prompt = ScriptedPrompt::new(&["1"]);
    assert!(!harness.engine.search_and_select("nothing", &prompt).await);
    assert!(prompt.listings().is_empty(), "no listing without results");
}

#[tokio::test]
async fn test_search_query_that_is_a_url_skips_search() {
    let harness = Harness::new(searchable()).await;
    let prompt = ScriptedPrompt::new(&[]);

    assert!(
        harness
            .engine
            .search_and_select("https://open.spotify.com/track/trackC", &prompt)
            .await
    );
    assert!(prompt.listings().is_empty());
    assert_eq!(harness.catalog.fetched(), vec!["trackC"]);
}

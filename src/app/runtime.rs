//! Wires the collaborators together and runs the requested mode.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use zspot_core::locator::is_catalog_url;
use zspot_core::{
    Archive, Category, Database, Pacer, SidecarTagger, TraversalEngine, WebApiProvider, split_input,
};

use super::config;
use super::prompt::{CountdownListener, TerminalPrompt};
use super::settings::Settings;
use crate::cli::Args;

/// Builds the engine from CLI arguments and the config file, then runs
/// the first mode requested. Returns whether that mode succeeded.
pub(crate) async fn run(args: &Args) -> Result<bool> {
    let file_config = config::load_default_file_config()?;
    let settings = Settings::resolve(args, file_config)?;
    debug!(
        config_dir = %settings.config_dir.display(),
        music_dir = %settings.engine.music_dir.display(),
        episodes_dir = %settings.engine.episodes_dir.display(),
        fetcher = settings.fetcher.program(),
        "settings resolved"
    );

    let (engine, db) = build_engine(&settings, args.quiet).await?;
    let imported = engine.migrate_archive(&settings.migration_roots()).await;
    if imported > 0 {
        info!(imported, "Imported legacy archive records");
    }

    let prompt = TerminalPrompt;
    let outcome = run_mode(&engine, args, &prompt).await;
    db.close().await;
    let succeeded = outcome?;

    let stats = engine.stats();
    info!(
        downloaded = stats.downloaded(),
        skipped = stats.skipped(),
        unavailable = stats.unavailable(),
        failed = stats.failed(),
        total = stats.total(),
        waited_secs = engine.pacer().cumulative_wait().as_secs(),
        "Run complete"
    );
    Ok(succeeded)
}

/// Returns the engine plus the archive handle to close once the run ends.
async fn build_engine(settings: &Settings, quiet: bool) -> Result<(TraversalEngine, Database)> {
    ensure_dir(&settings.config_dir).await?;
    let archive_path = settings.archive_path();
    let db = Database::open(&archive_path)
        .await
        .with_context(|| format!("Failed to open archive '{}'", archive_path.display()))?;
    let ledger = Arc::new(Archive::new(db.clone()));

    let provider = match &settings.api_base_url {
        Some(base_url) => WebApiProvider::with_base_url(
            base_url,
            settings.token.clone(),
            settings.fetcher.clone(),
        ),
        None => WebApiProvider::new(settings.token.clone(), settings.fetcher.clone()),
    }
    .context("Failed to create catalog provider")?;

    let mut pacer = Pacer::new(settings.engine.short_pause, settings.engine.long_pause);
    if !quiet && io::stderr().is_terminal() {
        pacer = pacer.with_listener(Arc::new(CountdownListener::default()));
    }

    let engine = TraversalEngine::new(
        settings.engine.clone(),
        Arc::new(provider),
        ledger,
        Arc::new(SidecarTagger::new(settings.sidecar)),
        Arc::new(pacer),
    );
    Ok((engine, db))
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory '{}'", dir.display()))
}

/// Runs exactly one mode, checked in a fixed order.
async fn run_mode(engine: &TraversalEngine, args: &Args, prompt: &TerminalPrompt) -> Result<bool> {
    if args.all_playlists {
        return Ok(engine.download_all_playlists().await);
    }
    if args.select_playlists {
        return Ok(engine.download_selected_playlists(prompt).await);
    }
    if args.liked_songs {
        return Ok(engine.download_liked_songs().await);
    }

    let listed = [
        (&args.playlist, Category::Playlist),
        (&args.album, Category::Album),
        (&args.artist, Category::Artist),
        (&args.track, Category::Track),
        (&args.episode, Category::Episode),
        (&args.full_show, Category::Show),
    ];
    for (value, category) in listed {
        if let Some(value) = value {
            return Ok(download_each(engine, value, category).await);
        }
    }

    if let Some(query) = &args.search {
        return Ok(search_or_dispatch(engine, query, prompt).await);
    }
    if let Some(path) = &args.bulk_download {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read bulk file '{}'", path.display()))?;
        return Ok(engine.download_bulk(&contents).await);
    }

    interactive_search(engine, prompt).await;
    Ok(true)
}

/// Downloads every `,`/`;`-separated id or URL of one mode flag.
async fn download_each(engine: &TraversalEngine, value: &str, category: Category) -> bool {
    let mut all_succeeded = true;
    for token in split_input(value) {
        all_succeeded &= engine.download_in_context(token, category).await;
    }
    all_succeeded
}

/// A positional argument made only of catalog URLs is dispatched directly;
/// anything else is one search query.
async fn search_or_dispatch(engine: &TraversalEngine, query: &str, prompt: &TerminalPrompt) -> bool {
    let tokens = split_input(query);
    if tokens.len() > 1 && tokens.iter().all(|token| is_catalog_url(token)) {
        let mut all_succeeded = true;
        for token in tokens {
            all_succeeded &= engine.download_by_locator(token).await;
        }
        return all_succeeded;
    }
    engine.search_and_select(query, prompt).await
}

async fn interactive_search(engine: &TraversalEngine, prompt: &TerminalPrompt) {
    while let Some(query) = prompt.read_line("Search: ").await {
        let query = query.trim();
        if query.is_empty() {
            continue;
        }
        search_or_dispatch(engine, query, prompt).await;
    }
    debug!("input closed, leaving interactive search");
}

//! Zspot Core Library
//!
//! This library provides the core of the zspot tool, which turns catalog
//! locators (track, album, playlist, artist, episode and show URLs or ids,
//! the liked-songs collection, or a whole playlist library) into an
//! organized tree of audio files on disk.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`locator`] - Classify user input into a catalog category and id
//! - [`filename`] - Deterministic, length-bounded, filesystem-safe names
//! - [`skip_gate`] - Pre-fetch "already downloaded" decisions
//! - [`pacing`] - Fixed-interval request pacing between items and batches
//! - [`selection`] - Interactive index/range selection parsing
//! - [`engine`] - Catalog traversal and the per-item download step
//! - [`catalog`] - Catalog data model and collaborator traits
//! - [`archive`] - `SQLite` ledger of completed downloads
//! - [`provider`] - HTTP catalog provider and external audio fetcher
//! - [`tagger`] - Metadata sidecar writer
//! - [`config`] - Immutable engine configuration
//! - [`db`] - Database connection and schema management

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod filename;
pub mod locator;
pub mod pacing;
pub mod provider;
pub mod selection;
pub mod skip_gate;
pub mod tagger;

// Re-export commonly used types
pub use archive::{Archive, ArchiveError, ArchiveRecord};
pub use catalog::{
    AlbumInfo, CatalogItem, CatalogProvider, ContentCategory, Ledger, NamedEntry, SearchHit,
    SearchKind, SearchResults, SelectionPrompt, SongRef, Tagger, TrackTags,
};
pub use config::{AudioFormat, EngineConfig};
pub use db::{Database, DbError};
pub use engine::{EngineStats, TraversalEngine};
pub use filename::{FilenameContext, build_filename, sanitize_filename};
pub use locator::{Category, Locator, resolve, split_input};
pub use pacing::{PaceKind, PaceListener, Pacer};
pub use provider::{CommandFetcher, ProviderError, WebApiProvider};
pub use selection::{Selection, SelectionCommand, SelectionError, parse_selection};
pub use skip_gate::{AUDIO_EXTENSIONS, SkipDecision, SkipGate};
pub use tagger::{SidecarTagger, TaggerError};

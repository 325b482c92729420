//! # Tracks Module
//!
//! Persists the per-track "needs album artwork indexing" flag that the
//! album-artwork-only pass feeds.
//!
//! ## Backends
//! - `SqliteTrackRepository` - Persistent storage using SQLite
//! - `InMemoryTrackRepository` - For testing

mod memory;
mod sqlite;

pub use memory::InMemoryTrackRepository;
pub use sqlite::SqliteTrackRepository;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A track as seen by the artwork indexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Path to the audio file
    pub path: PathBuf,
    /// Whether album artwork was found for the track
    pub has_cover: bool,
    /// Whether the next artwork pass must (re)process the track
    pub needs_album_artwork_indexing: bool,
}

impl TrackRecord {
    /// A freshly indexed track that still needs artwork
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            has_cover: false,
            needs_album_artwork_indexing: true,
        }
    }

    /// Whether a marking pass with the given filter flags this track
    pub fn is_flagged_by(&self, only_when_has_no_cover: bool) -> bool {
        !only_when_has_no_cover || !self.has_cover
    }
}

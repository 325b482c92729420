//! In-memory track repository.

use super::TrackRecord;
use crate::core::coordinator::TrackRepository;
use crate::error::TrackStoreError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Track repository kept in a `HashMap`
///
/// Nothing survives a restart; apps that rebuild the collection on start
/// can use it in place of the SQLite store.
pub struct InMemoryTrackRepository {
    tracks: RwLock<HashMap<PathBuf, TrackRecord>>,
}

fn poisoned() -> TrackStoreError {
    TrackStoreError::Corrupted {
        path: PathBuf::from("memory"),
    }
}

impl InMemoryTrackRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            tracks: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a track
    pub fn upsert_track(&self, track: &TrackRecord) -> Result<(), TrackStoreError> {
        let mut tracks = self.tracks.write().map_err(|_| poisoned())?;
        tracks.insert(track.path.clone(), track.clone());
        Ok(())
    }

    /// Look up a track by path
    pub fn get_track(&self, path: &Path) -> Result<Option<TrackRecord>, TrackStoreError> {
        let tracks = self.tracks.read().map_err(|_| poisoned())?;
        Ok(tracks.get(path).cloned())
    }

    /// Paths of every track the next artwork pass must process, sorted
    pub fn tracks_needing_album_artwork_indexing(&self) -> Result<Vec<PathBuf>, TrackStoreError> {
        let tracks = self.tracks.read().map_err(|_| poisoned())?;
        let mut paths: Vec<PathBuf> = tracks
            .values()
            .filter(|t| t.needs_album_artwork_indexing)
            .map(|t| t.path.clone())
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Record the result of indexing artwork for one track
    pub fn mark_album_artwork_indexed(
        &self,
        path: &Path,
        has_cover: bool,
    ) -> Result<(), TrackStoreError> {
        let mut tracks = self.tracks.write().map_err(|_| poisoned())?;
        if let Some(track) = tracks.get_mut(path) {
            track.has_cover = has_cover;
            track.needs_album_artwork_indexing = false;
        }
        Ok(())
    }

    /// Number of tracks in the repository
    pub fn track_count(&self) -> Result<usize, TrackStoreError> {
        Ok(self.tracks.read().map_err(|_| poisoned())?.len())
    }
}

impl Default for InMemoryTrackRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackRepository for InMemoryTrackRepository {
    fn enable_needs_album_artwork_indexing_for_all_tracks(
        &self,
        only_when_has_no_cover: bool,
    ) -> Result<(), TrackStoreError> {
        let mut tracks = self.tracks.write().map_err(|_| poisoned())?;

        for track in tracks.values_mut() {
            if track.is_flagged_by(only_when_has_no_cover) {
                track.needs_album_artwork_indexing = true;
            }
        }

        Ok(())
    }
}

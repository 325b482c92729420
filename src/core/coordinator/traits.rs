//! Collaborator contracts consumed by the coordinator.
//!
//! Implement these traits to plug real indexers (or test doubles) into
//! an [`IndexingCoordinator`](super::IndexingCoordinator).

use crate::error::{ArtworkIndexError, CollectionCheckError, TrackIndexError, TrackStoreError};

/// Decides whether the persisted collection is out of date
pub trait CollectionChecker: Send + Sync {
    /// Pure query; must not change anything the coordinator can observe
    fn is_collection_outdated(&self) -> Result<bool, CollectionCheckError>;
}

/// Scans the collection and persists track metadata
pub trait TrackIndexer: Send + Sync {
    /// Run the track phase. May block for a long time.
    fn index_tracks(&self) -> Result<(), TrackIndexError>;
}

/// Fetches and persists album artwork for flagged tracks
pub trait AlbumArtworkIndexer: Send + Sync {
    /// Run the album artwork phase. May block for a long time.
    fn index_album_artwork(&self) -> Result<(), ArtworkIndexError>;
}

/// Remembers whether collection folders changed since the last pass
pub trait FolderChangeTracker: Send + Sync {
    /// Whether a change was seen and not yet consumed
    fn have_folders_changed(&self) -> bool;

    /// Mark the current change as observed
    fn reset_folder_changes(&self);
}

/// Persistence hook that flags tracks for artwork re-indexing
pub trait TrackRepository: Send + Sync {
    /// Flag tracks as needing album artwork indexing.
    ///
    /// With `only_when_has_no_cover` set, only tracks without cover art
    /// are flagged; otherwise every track is.
    fn enable_needs_album_artwork_indexing_for_all_tracks(
        &self,
        only_when_has_no_cover: bool,
    ) -> Result<(), TrackStoreError>;
}

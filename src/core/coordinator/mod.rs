//! # Coordinator Module
//!
//! Decides whether a collection re-index runs and in what order its
//! phases execute.
//!
//! ## Entry Points
//! 1. **If outdated** - check staleness, index tracks only when outdated,
//!    always index album artwork
//! 2. **If folders changed** - consume the folder change, then index tracks
//!    and album artwork
//! 3. **Always** - index tracks and album artwork
//! 4. **Album artwork only** - flag tracks for artwork, then index artwork
//!
//! All four share one [`RunGuard`](crate::core::guard::RunGuard): while a
//! pass runs, every other call returns `Skipped(AlreadyIndexing)` without
//! touching any collaborator.

mod executor;
mod traits;

pub use executor::{IndexingCoordinator, IndexingCoordinatorBuilder, IndexingOutcome};
pub use traits::{
    AlbumArtworkIndexer, CollectionChecker, FolderChangeTracker, TrackIndexer, TrackRepository,
};

//! # Core Module
//!
//! The GUI-agnostic indexing engine.
//!
//! ## Modules
//! - `guard` - Single-flight run guard shared by all entry points
//! - `coordinator` - Decides whether a pass runs and sequences its phases
//! - `folders` - Folder change tracking and watching
//! - `tracks` - Persists which tracks need album artwork indexing

pub mod coordinator;
pub mod folders;
pub mod guard;
pub mod tracks;

// Re-export commonly used types
pub use coordinator::{IndexingCoordinator, IndexingOutcome};
pub use folders::{FolderChangeFlag, FolderWatcher};
pub use guard::{RunGuard, RunPermit};
pub use tracks::{SqliteTrackRepository, TrackRecord};

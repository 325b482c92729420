//! Event type definitions for indexing progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// All events emitted by the collection indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Indexing pass events
    Indexing(IndexingEvent),
    /// Collection folder watcher events
    Watcher(WatcherEvent),
}

/// Events emitted by the indexing coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexingEvent {
    /// A pass entered the guard and is about to run its phases
    PassStarted { pass_id: Uuid, trigger: IndexingTrigger },
    /// The pass moved on to a new phase
    PhaseChanged { pass_id: Uuid, phase: IndexingPhase },
    /// The staleness checker answered
    CollectionChecked { pass_id: Uuid, outdated: bool },
    /// An entry point declined to start a pass
    PassSkipped {
        trigger: IndexingTrigger,
        reason: SkipReason,
    },
    /// All phases of the pass finished
    PassCompleted { summary: PassSummary },
    /// A collaborator failed and the pass was abandoned
    PassFailed {
        pass_id: Uuid,
        trigger: IndexingTrigger,
        message: String,
    },
}

/// Events from the collection folder watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WatcherEvent {
    /// Watcher started monitoring a folder
    Started { path: PathBuf },
    /// Watcher stopped monitoring a folder
    Stopped { path: PathBuf },
    /// An audio file inside a watched folder changed
    TrackChanged { path: PathBuf, change: ChangeKind },
    /// A folder inside a watched folder was created, removed or renamed
    FolderChanged { path: PathBuf, change: ChangeKind },
    /// An error occurred
    Error { message: String },
}

/// Kind of filesystem change seen by the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// The entry point that requested a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexingTrigger {
    /// Index tracks only when the collection is outdated
    IfOutdated,
    /// Index because collection folders changed
    FoldersChanged,
    /// Index unconditionally
    Always,
    /// Re-index album artwork without touching track metadata
    AlbumArtworkOnly { only_when_has_no_cover: bool },
}

/// Phases of an indexing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexingPhase {
    CheckingCollection,
    IndexingTracks,
    MarkingTracksForArtwork,
    IndexingAlbumArtwork,
}

/// Why an entry point returned without running a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Another pass holds the guard
    AlreadyIndexing,
    /// The folder-change tracker reported no changes
    FoldersUnchanged,
}

/// Summary of a finished pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Unique id of the pass
    pub pass_id: Uuid,
    /// Entry point that started the pass
    pub trigger: IndexingTrigger,
    /// Staleness checker answer, only for `IfOutdated` passes
    pub collection_outdated: Option<bool>,
    /// Whether the track phase ran
    pub tracks_indexed: bool,
    /// Whether the album artwork phase ran
    pub album_artwork_indexed: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for IndexingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexingPhase::CheckingCollection => write!(f, "Checking collection"),
            IndexingPhase::IndexingTracks => write!(f, "Indexing tracks"),
            IndexingPhase::MarkingTracksForArtwork => write!(f, "Marking tracks for artwork"),
            IndexingPhase::IndexingAlbumArtwork => write!(f, "Indexing album artwork"),
        }
    }
}

impl std::fmt::Display for IndexingTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexingTrigger::IfOutdated => write!(f, "if outdated"),
            IndexingTrigger::FoldersChanged => write!(f, "folders changed"),
            IndexingTrigger::Always => write!(f, "always"),
            IndexingTrigger::AlbumArtworkOnly {
                only_when_has_no_cover: true,
            } => write!(f, "album artwork only (missing covers)"),
            IndexingTrigger::AlbumArtworkOnly { .. } => write!(f, "album artwork only"),
        }
    }
}

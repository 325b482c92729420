//! # Error Module
//!
//! Error types for the collection indexer.
//!
//! ## Design Principles
//! - **Guard rejection is not an error** - a skipped pass is an `Ok` outcome
//! - **Collaborator failures propagate** - the coordinator never swallows them
//! - **Include context** - paths, album names, what went wrong

use std::path::PathBuf;
use thiserror::Error;

/// Top-level indexing error
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("Collection check error: {0}")]
    Check(#[from] CollectionCheckError),

    #[error("Track indexing error: {0}")]
    TrackIndexing(#[from] TrackIndexError),

    #[error("Album artwork indexing error: {0}")]
    ArtworkIndexing(#[from] ArtworkIndexError),

    #[error("Track store error: {0}")]
    TrackStore(#[from] TrackStoreError),

    #[error("Folder watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while deciding whether the collection is outdated
#[derive(Error, Debug)]
pub enum CollectionCheckError {
    #[error("Collection source unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Collection check failed: {0}")]
    Failed(String),
}

/// Errors raised by the track indexing phase
#[derive(Error, Debug)]
pub enum TrackIndexError {
    #[error("Failed to read track {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Failed to persist track metadata: {0}")]
    PersistFailed(String),

    #[error("Track indexing was cancelled")]
    Cancelled,
}

/// Errors raised by the album artwork indexing phase
#[derive(Error, Debug)]
pub enum ArtworkIndexError {
    #[error("Failed to fetch artwork for album '{album}': {reason}")]
    FetchFailed { album: String, reason: String },

    #[error("Failed to persist album artwork: {0}")]
    PersistFailed(String),

    #[error("Album artwork indexing was cancelled")]
    Cancelled,
}

/// Errors that occur with the track store
#[derive(Error, Debug)]
pub enum TrackStoreError {
    #[error("Failed to open track database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Track database corruption detected at {path}. Delete this file and re-index.")]
    Corrupted { path: PathBuf },
}

/// Errors that can occur while watching collection folders
#[derive(Error, Debug, Clone)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {0}")]
    InitFailed(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Failed to watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    #[error("Failed to unwatch {path}: {reason}")]
    UnwatchFailed { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IndexingError>;

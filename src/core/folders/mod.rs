//! # Folders Module
//!
//! Tracks whether collection folders changed since the last indexing pass.
//!
//! ## Pieces
//! - `FolderChangeFlag` - the in-memory `FolderChangeTracker`
//! - `FolderWatcher` - marks the flag when audio files are added,
//!   modified or removed in a watched folder
//!
//! ## Example
//! ```rust,ignore
//! let flag = Arc::new(FolderChangeFlag::new());
//! let mut watcher = FolderWatcher::new(WatcherConfig::default(), flag.clone(), null_sender())?;
//! watcher.watch("/home/me/Music")?;
//!
//! // Periodic timer
//! coordinator.index_collection_if_folders_have_changed()?;
//! ```

mod flag;
mod watcher;

pub use flag::FolderChangeFlag;
pub use watcher::{FolderWatcher, WatcherConfig};

use serde::{Deserialize, Serialize};

/// Audio formats that belong to a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    Flac,
    Ogg,
    Opus,
    M4a,
    Wav,
    Wma,
    Aac,
    Ape,
    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "ogg" | "oga" => AudioFormat::Ogg,
            "opus" => AudioFormat::Opus,
            "m4a" | "mp4" => AudioFormat::M4a,
            "wav" => AudioFormat::Wav,
            "wma" => AudioFormat::Wma,
            "aac" => AudioFormat::Aac,
            "ape" => AudioFormat::Ape,
            _ => AudioFormat::Unknown,
        }
    }

    /// Check if this format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, AudioFormat::Unknown)
    }
}

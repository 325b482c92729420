//! Collection folder watcher.

use super::{AudioFormat, FolderChangeFlag};
use crate::error::WatchError;
use crate::events::{ChangeKind, Event, EventSender, WatcherEvent};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Configuration for the folder watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Whether to watch subdirectories recursively
    pub recursive: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Watches collection folders and flags audio file and album folder changes
pub struct FolderWatcher {
    watcher: RecommendedWatcher,
    config: WatcherConfig,
    watched_paths: Arc<Mutex<HashSet<PathBuf>>>,
    events: EventSender,
}

impl FolderWatcher {
    /// Create a watcher that marks `flag` whenever a track or folder changes
    pub fn new(
        config: WatcherConfig,
        flag: Arc<FolderChangeFlag>,
        events: EventSender,
    ) -> Result<Self, WatchError> {
        let watched_paths = Arc::new(Mutex::new(HashSet::new()));
        let handler_events = events.clone();

        let watcher = notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    if let Some(change) = Self::collection_change(event) {
                        debug!(?change, "Collection folder changed.");
                        flag.mark_changed();
                        handler_events.send(Event::Watcher(change));
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Folder watcher error.");
                    handler_events.send(Event::Watcher(WatcherEvent::Error {
                        message: e.to_string(),
                    }));
                }
            },
        )
        .map_err(|e| WatchError::InitFailed(e.to_string()))?;

        Ok(Self {
            watcher,
            config,
            watched_paths,
            events,
        })
    }

    /// Reduce a notify event to the track or folder change it describes
    ///
    /// An album moved into a watched folder arrives as one event for the directory.
    fn collection_change(event: notify::Event) -> Option<WatcherEvent> {
        let change = match event.kind {
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                ChangeKind::Added
            }
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                ChangeKind::Removed
            }
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return None,
        };

        if let Some(path) = event.paths.iter().find(|p| Self::is_track_file(p)) {
            return Some(WatcherEvent::TrackChanged {
                path: path.clone(),
                change,
            });
        }

        let folder_event = match event.kind {
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
            EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
                false
            }
            _ => return None,
        };

        let path = event
            .paths
            .into_iter()
            .find(|p| folder_event || Self::is_folder(p))?;

        Some(WatcherEvent::FolderChanged { path, change })
    }

    /// Whether a path is, or looks like it was, a directory
    ///
    /// Paths that no longer exist are judged by their missing extension.
    fn is_folder(path: &Path) -> bool {
        path.is_dir() || (!path.exists() && path.extension().is_none())
    }

    /// Check if a path is a supported audio file
    fn is_track_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| AudioFormat::from_extension(ext).is_supported())
            .unwrap_or(false)
    }

    /// Start watching a collection folder
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<(), WatchError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(WatchError::PathNotFound(path));
        }

        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        self.watcher
            .watch(&path, mode)
            .map_err(|e| WatchError::WatchFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if let Ok(mut paths) = self.watched_paths.lock() {
            paths.insert(path.clone());
        }

        self.events
            .send(Event::Watcher(WatcherEvent::Started { path }));

        Ok(())
    }

    /// Stop watching a collection folder
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<(), WatchError> {
        let path = path.as_ref();

        self.watcher
            .unwatch(path)
            .map_err(|e| WatchError::UnwatchFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if let Ok(mut paths) = self.watched_paths.lock() {
            paths.remove(path);
        }

        self.events.send(Event::Watcher(WatcherEvent::Stopped {
            path: path.to_path_buf(),
        }));

        Ok(())
    }

    /// Get list of currently watched folders
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watched_paths
            .lock()
            .map(|paths| paths.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if a folder is being watched
    pub fn is_watching(&self, path: impl AsRef<Path>) -> bool {
        self.watched_paths
            .lock()
            .map(|paths| paths.contains(path.as_ref()))
            .unwrap_or(false)
    }
}

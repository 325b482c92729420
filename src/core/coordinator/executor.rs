//! Indexing coordinator implementation.

use super::traits::{
    AlbumArtworkIndexer, CollectionChecker, FolderChangeTracker, TrackIndexer, TrackRepository,
};
use crate::core::guard::{RunGuard, RunPermit};
use crate::error::IndexingError;
use crate::events::{
    null_sender, Event, EventSender, IndexingEvent, IndexingPhase, IndexingTrigger, PassSummary,
    SkipReason,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "IndexingCoordinator";

/// Result of calling one of the coordinator's entry points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexingOutcome {
    /// A pass ran all of its phases
    Completed(PassSummary),
    /// No pass was started
    Skipped(SkipReason),
}

impl IndexingOutcome {
    /// Whether a pass actually ran
    pub fn is_completed(&self) -> bool {
        matches!(self, IndexingOutcome::Completed(_))
    }

    /// Summary of the pass, if one ran
    pub fn summary(&self) -> Option<&PassSummary> {
        match self {
            IndexingOutcome::Completed(summary) => Some(summary),
            IndexingOutcome::Skipped(_) => None,
        }
    }
}

/// Builder for the indexing coordinator
#[derive(Default)]
pub struct IndexingCoordinatorBuilder {
    collection_checker: Option<Arc<dyn CollectionChecker>>,
    track_indexer: Option<Arc<dyn TrackIndexer>>,
    album_artwork_indexer: Option<Arc<dyn AlbumArtworkIndexer>>,
    folder_change_tracker: Option<Arc<dyn FolderChangeTracker>>,
    track_repository: Option<Arc<dyn TrackRepository>>,
    events: Option<EventSender>,
}

impl IndexingCoordinatorBuilder {
    /// Create a new coordinator builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staleness checker
    pub fn collection_checker(mut self, checker: Arc<dyn CollectionChecker>) -> Self {
        self.collection_checker = Some(checker);
        self
    }

    /// Set the track indexer
    pub fn track_indexer(mut self, indexer: Arc<dyn TrackIndexer>) -> Self {
        self.track_indexer = Some(indexer);
        self
    }

    /// Set the album artwork indexer
    pub fn album_artwork_indexer(mut self, indexer: Arc<dyn AlbumArtworkIndexer>) -> Self {
        self.album_artwork_indexer = Some(indexer);
        self
    }

    /// Set the folder-change tracker
    pub fn folder_change_tracker(mut self, tracker: Arc<dyn FolderChangeTracker>) -> Self {
        self.folder_change_tracker = Some(tracker);
        self
    }

    /// Set the track repository used for artwork-only passes
    pub fn track_repository(mut self, repository: Arc<dyn TrackRepository>) -> Self {
        self.track_repository = Some(repository);
        self
    }

    /// Report progress through the given sender
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the coordinator.
    ///
    /// Every collaborator is required; events default to a null sender.
    pub fn build(self) -> Result<IndexingCoordinator, IndexingError> {
        Ok(IndexingCoordinator {
            collection_checker: self
                .collection_checker
                .ok_or_else(|| missing("collection checker"))?,
            track_indexer: self.track_indexer.ok_or_else(|| missing("track indexer"))?,
            album_artwork_indexer: self
                .album_artwork_indexer
                .ok_or_else(|| missing("album artwork indexer"))?,
            folder_change_tracker: self
                .folder_change_tracker
                .ok_or_else(|| missing("folder change tracker"))?,
            track_repository: self
                .track_repository
                .ok_or_else(|| missing("track repository"))?,
            guard: RunGuard::new(),
            events: self.events.unwrap_or_else(null_sender),
        })
    }
}

fn missing(collaborator: &str) -> IndexingError {
    IndexingError::Config(format!("{} is required", collaborator))
}

/// Bookkeeping for one running pass
struct Pass {
    id: Uuid,
    operation: &'static str,
}

/// Which phases a pass body ran
#[derive(Debug, Default)]
struct PhasesRun {
    collection_outdated: Option<bool>,
    tracks_indexed: bool,
    album_artwork_indexed: bool,
}

/// Decides when the collection is re-indexed and keeps passes single-flight
pub struct IndexingCoordinator {
    collection_checker: Arc<dyn CollectionChecker>,
    track_indexer: Arc<dyn TrackIndexer>,
    album_artwork_indexer: Arc<dyn AlbumArtworkIndexer>,
    folder_change_tracker: Arc<dyn FolderChangeTracker>,
    track_repository: Arc<dyn TrackRepository>,
    guard: RunGuard,
    events: EventSender,
}

impl IndexingCoordinator {
    /// Create a new coordinator builder
    pub fn builder() -> IndexingCoordinatorBuilder {
        IndexingCoordinatorBuilder::new()
    }

    /// Whether a pass is currently running
    pub fn is_indexing(&self) -> bool {
        self.guard.is_running()
    }

    /// Index tracks if the collection is outdated, then index album artwork.
    ///
    /// Artwork is indexed whenever the pass starts, even when the
    /// collection turns out to be up to date.
    pub fn index_collection_if_outdated(&self) -> Result<IndexingOutcome, IndexingError> {
        const OPERATION: &str = "index_collection_if_outdated";
        let trigger = IndexingTrigger::IfOutdated;

        let Some(permit) = self.guard.try_enter() else {
            return Ok(self.skipped(trigger, SkipReason::AlreadyIndexing, OPERATION));
        };

        self.run_pass(permit, trigger, OPERATION, |pass| {
            let outdated = self.check_collection(pass)?;

            if outdated {
                self.index_tracks(pass)?;
            }

            self.index_album_artwork(pass)?;

            Ok(PhasesRun {
                collection_outdated: Some(outdated),
                tracks_indexed: outdated,
                album_artwork_indexed: true,
            })
        })
    }

    /// Index tracks and album artwork if collection folders changed.
    ///
    /// The change is only consumed when a pass actually starts. If another
    /// pass holds the guard, the tracker keeps its state for a later call.
    pub fn index_collection_if_folders_have_changed(
        &self,
    ) -> Result<IndexingOutcome, IndexingError> {
        const OPERATION: &str = "index_collection_if_folders_have_changed";
        let trigger = IndexingTrigger::FoldersChanged;

        if !self.folder_change_tracker.have_folders_changed() {
            return Ok(self.skipped(trigger, SkipReason::FoldersUnchanged, OPERATION));
        }

        info!(component = COMPONENT, operation = OPERATION, "Folders have changed.");

        let Some(permit) = self.guard.try_enter() else {
            return Ok(self.skipped(trigger, SkipReason::AlreadyIndexing, OPERATION));
        };

        self.run_pass(permit, trigger, OPERATION, |pass| {
            self.folder_change_tracker.reset_folder_changes();

            self.index_tracks(pass)?;
            self.index_album_artwork(pass)?;

            Ok(PhasesRun {
                collection_outdated: None,
                tracks_indexed: true,
                album_artwork_indexed: true,
            })
        })
    }

    /// Index tracks and album artwork unconditionally
    pub fn index_collection_always(&self) -> Result<IndexingOutcome, IndexingError> {
        const OPERATION: &str = "index_collection_always";
        let trigger = IndexingTrigger::Always;

        let Some(permit) = self.guard.try_enter() else {
            return Ok(self.skipped(trigger, SkipReason::AlreadyIndexing, OPERATION));
        };

        self.run_pass(permit, trigger, OPERATION, |pass| {
            self.index_tracks(pass)?;
            self.index_album_artwork(pass)?;

            Ok(PhasesRun {
                collection_outdated: None,
                tracks_indexed: true,
                album_artwork_indexed: true,
            })
        })
    }

    /// Flag tracks for artwork re-indexing, then index album artwork only.
    ///
    /// With `only_when_has_no_cover` set, only tracks lacking cover art are
    /// flagged. Track metadata is never re-indexed by this entry point.
    pub fn index_album_artwork_only(
        &self,
        only_when_has_no_cover: bool,
    ) -> Result<IndexingOutcome, IndexingError> {
        const OPERATION: &str = "index_album_artwork_only";
        let trigger = IndexingTrigger::AlbumArtworkOnly {
            only_when_has_no_cover,
        };

        let Some(permit) = self.guard.try_enter() else {
            return Ok(self.skipped(trigger, SkipReason::AlreadyIndexing, OPERATION));
        };

        self.run_pass(permit, trigger, OPERATION, |pass| {
            self.mark_tracks_for_artwork(pass, only_when_has_no_cover)?;
            self.index_album_artwork(pass)?;

            Ok(PhasesRun {
                collection_outdated: None,
                tracks_indexed: false,
                album_artwork_indexed: true,
            })
        })
    }

    /// Run a pass body while holding `permit`.
    ///
    /// The permit is released before completion is reported, so listeners
    /// reacting to `PassCompleted` can start the next pass right away.
    fn run_pass<F>(
        &self,
        permit: RunPermit<'_>,
        trigger: IndexingTrigger,
        operation: &'static str,
        body: F,
    ) -> Result<IndexingOutcome, IndexingError>
    where
        F: FnOnce(&Pass) -> Result<PhasesRun, IndexingError>,
    {
        let started = Instant::now();
        let pass = Pass {
            id: Uuid::new_v4(),
            operation,
        };

        info!(component = COMPONENT, operation, pass_id = %pass.id, "Indexing collection.");
        self.events.send(Event::Indexing(IndexingEvent::PassStarted {
            pass_id: pass.id,
            trigger,
        }));

        let result = body(&pass);
        drop(permit);

        match result {
            Ok(phases) => {
                let summary = PassSummary {
                    pass_id: pass.id,
                    trigger,
                    collection_outdated: phases.collection_outdated,
                    tracks_indexed: phases.tracks_indexed,
                    album_artwork_indexed: phases.album_artwork_indexed,
                    duration_ms: u64::try_from(started.elapsed().as_millis())
                        .unwrap_or(u64::MAX),
                };

                info!(
                    component = COMPONENT,
                    operation,
                    pass_id = %pass.id,
                    duration_ms = summary.duration_ms,
                    "Finished indexing collection."
                );
                self.events.send(Event::Indexing(IndexingEvent::PassCompleted {
                    summary: summary.clone(),
                }));

                Ok(IndexingOutcome::Completed(summary))
            }
            Err(error) => {
                warn!(
                    component = COMPONENT,
                    operation,
                    pass_id = %pass.id,
                    %error,
                    "Indexing failed."
                );
                self.events.send(Event::Indexing(IndexingEvent::PassFailed {
                    pass_id: pass.id,
                    trigger,
                    message: error.to_string(),
                }));

                Err(error)
            }
        }
    }

    fn skipped(
        &self,
        trigger: IndexingTrigger,
        reason: SkipReason,
        operation: &'static str,
    ) -> IndexingOutcome {
        match reason {
            SkipReason::AlreadyIndexing => {
                info!(component = COMPONENT, operation, "Already indexing.")
            }
            SkipReason::FoldersUnchanged => {
                info!(component = COMPONENT, operation, "Folders have not changed.")
            }
        }

        self.events
            .send(Event::Indexing(IndexingEvent::PassSkipped { trigger, reason }));

        IndexingOutcome::Skipped(reason)
    }

    fn enter_phase(&self, pass: &Pass, phase: IndexingPhase) {
        debug!(
            component = COMPONENT,
            operation = pass.operation,
            pass_id = %pass.id,
            %phase,
            "Entering phase."
        );
        self.events.send(Event::Indexing(IndexingEvent::PhaseChanged {
            pass_id: pass.id,
            phase,
        }));
    }

    fn check_collection(&self, pass: &Pass) -> Result<bool, IndexingError> {
        self.enter_phase(pass, IndexingPhase::CheckingCollection);

        let outdated = self.collection_checker.is_collection_outdated()?;

        if outdated {
            info!(component = COMPONENT, operation = pass.operation, "Collection is outdated.");
        } else {
            info!(
                component = COMPONENT,
                operation = pass.operation,
                "Collection is not outdated."
            );
        }

        self.events.send(Event::Indexing(IndexingEvent::CollectionChecked {
            pass_id: pass.id,
            outdated,
        }));

        Ok(outdated)
    }

    fn index_tracks(&self, pass: &Pass) -> Result<(), IndexingError> {
        self.enter_phase(pass, IndexingPhase::IndexingTracks);
        self.track_indexer.index_tracks()?;
        Ok(())
    }

    fn mark_tracks_for_artwork(
        &self,
        pass: &Pass,
        only_when_has_no_cover: bool,
    ) -> Result<(), IndexingError> {
        self.enter_phase(pass, IndexingPhase::MarkingTracksForArtwork);
        self.track_repository
            .enable_needs_album_artwork_indexing_for_all_tracks(only_when_has_no_cover)?;
        Ok(())
    }

    fn index_album_artwork(&self, pass: &Pass) -> Result<(), IndexingError> {
        self.enter_phase(pass, IndexingPhase::IndexingAlbumArtwork);
        self.album_artwork_indexer.index_album_artwork()?;
        Ok(())
    }
}

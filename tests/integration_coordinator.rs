//! Integration tests for the indexing coordinator.
//!
//! These tests drive the coordinator from several threads and against
//! the real folder flag and SQLite track store:
//! - Overlapping calls while a pass is blocked in a phase
//! - Many threads racing for the guard
//! - Artwork-only passes feeding the SQLite and in-memory track stores

use collection_indexer::core::coordinator::{
    AlbumArtworkIndexer, CollectionChecker, FolderChangeTracker, IndexingCoordinator,
    IndexingOutcome, TrackIndexer, TrackRepository,
};
use collection_indexer::core::folders::FolderChangeFlag;
use collection_indexer::core::tracks::{
    InMemoryTrackRepository, SqliteTrackRepository, TrackRecord,
};
use collection_indexer::error::{ArtworkIndexError, CollectionCheckError, TrackIndexError};
use collection_indexer::events::{Event, EventChannel, IndexingEvent, SkipReason};
use collection_indexer::IndexingError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

struct Outdated(bool);

impl CollectionChecker for Outdated {
    fn is_collection_outdated(&self) -> Result<bool, CollectionCheckError> {
        Ok(self.0)
    }
}

/// Track indexer that parks inside the phase until released
struct BlockingTrackIndexer {
    started: Sender<()>,
    release: Receiver<()>,
    runs: AtomicUsize,
}

impl TrackIndexer for BlockingTrackIndexer {
    fn index_tracks(&self) -> Result<(), TrackIndexError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let _ = self.started.send(());
        // Returns immediately once the release sender is dropped
        let _ = self.release.recv();
        Ok(())
    }
}

/// Counts calls and the peak number of phases running at once
#[derive(Default)]
struct ConcurrencyMonitor {
    active: AtomicUsize,
    peak: AtomicUsize,
    track_runs: AtomicUsize,
    artwork_runs: AtomicUsize,
}

impl ConcurrencyMonitor {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TrackIndexer for ConcurrencyMonitor {
    fn index_tracks(&self) -> Result<(), TrackIndexError> {
        self.track_runs.fetch_add(1, Ordering::SeqCst);
        self.enter();
        Ok(())
    }
}

impl AlbumArtworkIndexer for ConcurrencyMonitor {
    fn index_album_artwork(&self) -> Result<(), ArtworkIndexError> {
        self.artwork_runs.fetch_add(1, Ordering::SeqCst);
        self.enter();
        Ok(())
    }
}

/// Artwork indexer that "finds" a cover for every flagged track
struct CoverFindingIndexer {
    repository: Arc<SqliteTrackRepository>,
}

impl AlbumArtworkIndexer for CoverFindingIndexer {
    fn index_album_artwork(&self) -> Result<(), ArtworkIndexError> {
        let flagged = self
            .repository
            .tracks_needing_album_artwork_indexing()
            .map_err(|e| ArtworkIndexError::PersistFailed(e.to_string()))?;

        for path in flagged {
            self.repository
                .mark_album_artwork_indexed(&path, true)
                .map_err(|e| ArtworkIndexError::PersistFailed(e.to_string()))?;
        }

        Ok(())
    }
}

/// Artwork indexer over the in-memory store that remembers what it refreshed
struct RefreshingCoverIndexer {
    repository: Arc<InMemoryTrackRepository>,
    refreshed: Mutex<Vec<PathBuf>>,
}

impl AlbumArtworkIndexer for RefreshingCoverIndexer {
    fn index_album_artwork(&self) -> Result<(), ArtworkIndexError> {
        let flagged = self
            .repository
            .tracks_needing_album_artwork_indexing()
            .map_err(|e| ArtworkIndexError::PersistFailed(e.to_string()))?;

        for path in flagged {
            self.repository
                .mark_album_artwork_indexed(&path, true)
                .map_err(|e| ArtworkIndexError::PersistFailed(e.to_string()))?;
            self.refreshed.lock().unwrap().push(path);
        }

        Ok(())
    }
}

struct FailingTrackIndexer;

impl TrackIndexer for FailingTrackIndexer {
    fn index_tracks(&self) -> Result<(), TrackIndexError> {
        Err(TrackIndexError::ReadFailed {
            path: PathBuf::from("/music/broken.flac"),
            reason: "unexpected end of file".to_string(),
        })
    }
}

fn open_repository(temp_dir: &TempDir) -> Arc<SqliteTrackRepository> {
    Arc::new(SqliteTrackRepository::open(&temp_dir.path().join("tracks.db")).unwrap())
}

#[test]
fn overlapping_calls_are_rejected_while_a_pass_runs() {
    let temp_dir = TempDir::new().unwrap();
    let (started_tx, started_rx) = unbounded();
    let (release_tx, release_rx) = unbounded::<()>();
    let tracks = Arc::new(BlockingTrackIndexer {
        started: started_tx,
        release: release_rx,
        runs: AtomicUsize::new(0),
    });
    let monitor = Arc::new(ConcurrencyMonitor::default());
    let folders = Arc::new(FolderChangeFlag::changed());

    let coordinator = Arc::new(
        IndexingCoordinator::builder()
            .collection_checker(Arc::new(Outdated(true)))
            .track_indexer(tracks.clone())
            .album_artwork_indexer(monitor.clone())
            .folder_change_tracker(folders.clone())
            .track_repository(open_repository(&temp_dir))
            .build()
            .unwrap(),
    );

    let running = {
        let coordinator = Arc::clone(&coordinator);
        thread::spawn(move || coordinator.index_collection_always())
    };

    started_rx.recv().unwrap();
    assert!(coordinator.is_indexing());

    let busy = IndexingOutcome::Skipped(SkipReason::AlreadyIndexing);
    assert_eq!(coordinator.index_collection_if_outdated().unwrap(), busy);
    assert_eq!(coordinator.index_collection_always().unwrap(), busy);
    assert_eq!(coordinator.index_album_artwork_only(false).unwrap(), busy);
    assert_eq!(
        coordinator
            .index_collection_if_folders_have_changed()
            .unwrap(),
        busy
    );

    // Rejected calls touched nothing and left the folder change pending
    assert_eq!(tracks.runs.load(Ordering::SeqCst), 1);
    assert_eq!(monitor.artwork_runs.load(Ordering::SeqCst), 0);
    assert!(folders.have_folders_changed());

    drop(release_tx);
    let outcome = running.join().unwrap().unwrap();
    assert!(outcome.is_completed());
    assert!(!coordinator.is_indexing());
    assert_eq!(monitor.artwork_runs.load(Ordering::SeqCst), 1);

    // The pending change is consumed by the next attempt
    let outcome = coordinator
        .index_collection_if_folders_have_changed()
        .unwrap();
    assert!(outcome.is_completed());
    assert!(!folders.have_folders_changed());
    assert_eq!(tracks.runs.load(Ordering::SeqCst), 2);
}

#[test]
fn racing_threads_never_run_two_passes_at_once() {
    let temp_dir = TempDir::new().unwrap();
    let monitor = Arc::new(ConcurrencyMonitor::default());

    let coordinator = Arc::new(
        IndexingCoordinator::builder()
            .collection_checker(Arc::new(Outdated(true)))
            .track_indexer(monitor.clone())
            .album_artwork_indexer(monitor.clone())
            .folder_change_tracker(Arc::new(FolderChangeFlag::changed()))
            .track_repository(open_repository(&temp_dir))
            .build()
            .unwrap(),
    );

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                match i % 4 {
                    0 => coordinator.index_collection_if_outdated(),
                    1 => coordinator.index_collection_if_folders_have_changed(),
                    2 => coordinator.index_collection_always(),
                    _ => coordinator.index_album_artwork_only(true),
                }
            })
        })
        .collect();

    let outcomes: Vec<IndexingOutcome> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    let completed = outcomes.iter().filter(|o| o.is_completed()).count();
    assert!(completed >= 1);
    assert_eq!(monitor.peak.load(Ordering::SeqCst), 1);
    // Every completed pass indexes artwork exactly once
    assert_eq!(monitor.artwork_runs.load(Ordering::SeqCst), completed);
    assert!(!coordinator.is_indexing());
}

#[test]
fn failed_pass_releases_the_guard_for_the_next_call() {
    let temp_dir = TempDir::new().unwrap();
    let monitor = Arc::new(ConcurrencyMonitor::default());
    let (sender, receiver) = EventChannel::new();

    let coordinator = IndexingCoordinator::builder()
        .collection_checker(Arc::new(Outdated(true)))
        .track_indexer(Arc::new(FailingTrackIndexer))
        .album_artwork_indexer(monitor.clone())
        .folder_change_tracker(Arc::new(FolderChangeFlag::new()))
        .track_repository(open_repository(&temp_dir))
        .events(sender)
        .build()
        .unwrap();

    let result = coordinator.index_collection_if_outdated();
    match result {
        Err(IndexingError::TrackIndexing(TrackIndexError::ReadFailed { path, .. })) => {
            assert_eq!(path, PathBuf::from("/music/broken.flac"));
        }
        other => panic!("expected a track indexing failure, got {:?}", other),
    }
    assert!(!coordinator.is_indexing());
    assert_eq!(monitor.artwork_runs.load(Ordering::SeqCst), 0);

    // Artwork-only passes never touch the failing track indexer
    assert!(coordinator.index_album_artwork_only(true).unwrap().is_completed());
    assert_eq!(monitor.artwork_runs.load(Ordering::SeqCst), 1);

    let failures = receiver
        .drain()
        .into_iter()
        .filter(|e| matches!(e, Event::Indexing(IndexingEvent::PassFailed { .. })))
        .count();
    assert_eq!(failures, 1);
}

#[test]
fn artwork_only_pass_refreshes_missing_covers_in_the_database() {
    let temp_dir = TempDir::new().unwrap();
    let repository = open_repository(&temp_dir);

    for (path, has_cover) in [("/music/a.mp3", true), ("/music/b.mp3", false)] {
        repository
            .upsert_track(&TrackRecord {
                path: PathBuf::from(path),
                has_cover,
                needs_album_artwork_indexing: false,
            })
            .unwrap();
    }

    let coordinator = IndexingCoordinator::builder()
        .collection_checker(Arc::new(Outdated(false)))
        .track_indexer(Arc::new(FailingTrackIndexer))
        .album_artwork_indexer(Arc::new(CoverFindingIndexer {
            repository: Arc::clone(&repository),
        }))
        .folder_change_tracker(Arc::new(FolderChangeFlag::new()))
        .track_repository(repository.clone())
        .build()
        .unwrap();

    let outcome = coordinator.index_album_artwork_only(true).unwrap();

    let summary = outcome.summary().unwrap();
    assert!(!summary.tracks_indexed);
    assert!(summary.album_artwork_indexed);
    assert!(repository
        .tracks_needing_album_artwork_indexing()
        .unwrap()
        .is_empty());
    assert!(
        repository
            .get_track(std::path::Path::new("/music/b.mp3"))
            .unwrap()
            .unwrap()
            .has_cover
    );
}

#[test]
fn up_to_date_collection_skips_the_track_phase() {
    let temp_dir = TempDir::new().unwrap();

    // The failing track indexer would surface as an error if it were called
    let coordinator = IndexingCoordinator::builder()
        .collection_checker(Arc::new(Outdated(false)))
        .track_indexer(Arc::new(FailingTrackIndexer))
        .album_artwork_indexer(Arc::new(ConcurrencyMonitor::default()))
        .folder_change_tracker(Arc::new(FolderChangeFlag::new()))
        .track_repository(open_repository(&temp_dir))
        .build()
        .unwrap();

    let summary = coordinator
        .index_collection_if_outdated()
        .unwrap()
        .summary()
        .cloned()
        .unwrap();

    assert_eq!(summary.collection_outdated, Some(false));
    assert!(!summary.tracks_indexed);
}

#[test]
fn repository_trait_object_marks_tracks() {
    let temp_dir = TempDir::new().unwrap();
    let repository = open_repository(&temp_dir);
    repository
        .upsert_track(&TrackRecord {
            path: PathBuf::from("/music/a.mp3"),
            has_cover: true,
            needs_album_artwork_indexing: false,
        })
        .unwrap();

    let as_trait: Arc<dyn TrackRepository> = repository.clone();
    as_trait
        .enable_needs_album_artwork_indexing_for_all_tracks(false)
        .unwrap();

    assert_eq!(
        repository.tracks_needing_album_artwork_indexing().unwrap(),
        vec![PathBuf::from("/music/a.mp3")]
    );
}

#[test]
fn in_memory_store_backs_artwork_only_passes() {
    let repository = Arc::new(InMemoryTrackRepository::new());
    for path in ["/music/b.mp3", "/music/a.mp3"] {
        repository
            .upsert_track(&TrackRecord {
                path: PathBuf::from(path),
                has_cover: true,
                needs_album_artwork_indexing: false,
            })
            .unwrap();
    }
    let artwork = Arc::new(RefreshingCoverIndexer {
        repository: Arc::clone(&repository),
        refreshed: Mutex::new(Vec::new()),
    });

    let coordinator = IndexingCoordinator::builder()
        .collection_checker(Arc::new(Outdated(false)))
        .track_indexer(Arc::new(FailingTrackIndexer))
        .album_artwork_indexer(artwork.clone())
        .folder_change_tracker(Arc::new(FolderChangeFlag::new()))
        .track_repository(repository.clone())
        .build()
        .unwrap();

    // Every track already has a cover, so the missing-cover filter flags nothing
    assert!(coordinator.index_album_artwork_only(true).unwrap().is_completed());
    assert!(artwork.refreshed.lock().unwrap().is_empty());

    assert!(coordinator.index_album_artwork_only(false).unwrap().is_completed());
    assert_eq!(
        *artwork.refreshed.lock().unwrap(),
        vec![PathBuf::from("/music/a.mp3"), PathBuf::from("/music/b.mp3")]
    );
    assert!(repository
        .tracks_needing_album_artwork_indexing()
        .unwrap()
        .is_empty());
    assert_eq!(repository.track_count().unwrap(), 2);
}

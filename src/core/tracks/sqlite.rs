//! SQLite track repository for persistent storage.

use super::TrackRecord;
use crate::core::coordinator::TrackRepository;
use crate::error::TrackStoreError;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// SQLite-backed track repository
///
/// Uses WAL mode so the UI can read while an indexing pass writes.
pub struct SqliteTrackRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteTrackRepository {
    /// Open or create a track database at the given path
    pub fn open(path: &Path) -> Result<Self, TrackStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TrackStoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| TrackStoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tracks (
                path TEXT PRIMARY KEY,
                has_cover INTEGER NOT NULL DEFAULT 0,
                needs_album_artwork_indexing INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )
        .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_needs_artwork
             ON tracks(needs_album_artwork_indexing)",
            [],
        )
        .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, TrackStoreError> {
        self.conn.lock().map_err(|_| TrackStoreError::Corrupted {
            path: self.db_path.clone(),
        })
    }

    /// Insert or replace a track
    pub fn upsert_track(&self, track: &TrackRecord) -> Result<(), TrackStoreError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO tracks (path, has_cover, needs_album_artwork_indexing)
             VALUES (?, ?, ?)",
            params![
                track.path.to_string_lossy(),
                track.has_cover,
                track.needs_album_artwork_indexing,
            ],
        )
        .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Look up a track by path
    pub fn get_track(&self, path: &Path) -> Result<Option<TrackRecord>, TrackStoreError> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT has_cover, needs_album_artwork_indexing FROM tracks WHERE path = ?",
            [path.to_string_lossy()],
            |row| {
                Ok(TrackRecord {
                    path: path.to_path_buf(),
                    has_cover: row.get(0)?,
                    needs_album_artwork_indexing: row.get(1)?,
                })
            },
        );

        match result {
            Ok(track) => Ok(Some(track)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TrackStoreError::QueryFailed(e.to_string())),
        }
    }

    /// Paths of every track the next artwork pass must process, sorted
    pub fn tracks_needing_album_artwork_indexing(&self) -> Result<Vec<PathBuf>, TrackStoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT path FROM tracks WHERE needs_album_artwork_indexing = 1 ORDER BY path",
            )
            .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?
            .map(|r| r.map(PathBuf::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        Ok(paths)
    }

    /// Record the result of indexing artwork for one track
    pub fn mark_album_artwork_indexed(
        &self,
        path: &Path,
        has_cover: bool,
    ) -> Result<(), TrackStoreError> {
        let conn = self.lock()?;

        conn.execute(
            "UPDATE tracks SET has_cover = ?, needs_album_artwork_indexing = 0 WHERE path = ?",
            params![has_cover, path.to_string_lossy()],
        )
        .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Number of tracks in the database
    pub fn track_count(&self) -> Result<usize, TrackStoreError> {
        let conn = self.lock()?;

        let count = conn
            .query_row("SELECT COUNT(*) FROM tracks", [], |row| {
                row.get::<_, i64>(0).map(|v| v as usize)
            })
            .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        Ok(count)
    }
}

impl TrackRepository for SqliteTrackRepository {
    fn enable_needs_album_artwork_indexing_for_all_tracks(
        &self,
        only_when_has_no_cover: bool,
    ) -> Result<(), TrackStoreError> {
        let conn = self.lock()?;

        let sql = if only_when_has_no_cover {
            "UPDATE tracks SET needs_album_artwork_indexing = 1 WHERE has_cover = 0"
        } else {
            "UPDATE tracks SET needs_album_artwork_indexing = 1"
        };

        let flagged = conn
            .execute(sql, [])
            .map_err(|e| TrackStoreError::QueryFailed(e.to_string()))?;

        debug!(flagged, only_when_has_no_cover, "Flagged tracks for album artwork indexing.");

        Ok(())
    }
}

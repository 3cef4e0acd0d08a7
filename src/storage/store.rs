//! The record store: sole owner of the writable state directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::core::athletes::AthleteRoster;
use crate::core::schema::{Medal, ResultEntry, TipEntry, TipKey};
use crate::storage::atomic::write_atomic;
use crate::storage::csv::CsvCodec;
use crate::storage::lock::{DirLock, LockKind, open_lock_file};
use crate::storage::snapshot::{Snapshot, SnapshotFormat};
use crate::{TipsError, TipsResult};

pub const TIPS_FILE: &str = "tips.json";
pub const RESULTS_FILE: &str = "results.csv";
pub const LOCK_FILE: &str = ".lock";

#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// How long to wait for the directory lock; `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

/// Durable, single-writer store for tips and results.
///
/// Writers hold an exclusive lock on the directory for the whole
/// read-modify-write; readers hold a shared lock. Every write replaces the
/// file atomically.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
    options: StoreOptions,
}

type TipMap = BTreeMap<TipKey, TipEntry>;

impl RecordStore {
    /// Open (creating if needed) the state directory.
    ///
    /// # Errors
    /// `StorageUnavailable` if the directory cannot be created or the lock
    /// file cannot be created inside it.
    pub fn open(dir: impl AsRef<Path>, options: StoreOptions) -> TipsResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| TipsError::storage(&dir, e))?;
        open_lock_file(&dir.join(LOCK_FILE))?;
        info!(dir = %dir.display(), "opened record store");
        Ok(RecordStore { dir, options })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tips_path(&self) -> PathBuf {
        self.dir.join(TIPS_FILE)
    }

    fn results_path(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    fn lock(&self, kind: LockKind) -> TipsResult<DirLock> {
        DirLock::acquire(&self.dir.join(LOCK_FILE), kind, self.options.lock_timeout)
    }

    /// All current tips, ordered by key. Empty on first run.
    pub fn load(&self) -> TipsResult<Vec<TipEntry>> {
        let _guard = self.lock(LockKind::Shared)?;
        Ok(self.read_tips()?.into_values().collect())
    }

    pub fn get(&self, key: &TipKey) -> TipsResult<Option<TipEntry>> {
        let _guard = self.lock(LockKind::Shared)?;
        Ok(self.read_tips()?.remove(key))
    }

    /// Tips submitted by one player.
    pub fn tips_by(&self, player: &str) -> TipsResult<Vec<TipEntry>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|e| e.submitted_by.as_deref() == Some(player))
            .collect())
    }

    /// Insert or replace the entry with the same key; returns the previous one.
    pub fn upsert(&self, entry: TipEntry) -> TipsResult<Option<TipEntry>> {
        let entry = entry.normalized();
        let key = entry.key();
        let _guard = self.lock(LockKind::Exclusive)?;
        let mut tips = self.read_tips()?;
        let previous = tips.insert(key.clone(), entry);
        self.write_tips(tips)?;
        debug!(%key, replaced = previous.is_some(), "upserted tip");
        Ok(previous)
    }

    /// Delete one entry; returns it if it existed.
    pub fn remove(&self, key: &TipKey) -> TipsResult<Option<TipEntry>> {
        let _guard = self.lock(LockKind::Exclusive)?;
        let mut tips = self.read_tips()?;
        let removed = tips.remove(key);
        if removed.is_some() {
            self.write_tips(tips)?;
            debug!(%key, "removed tip");
        }
        Ok(removed)
    }

    /// Drop every tip; returns how many were removed.
    pub fn reset(&self) -> TipsResult<usize> {
        let _guard = self.lock(LockKind::Exclusive)?;
        let count = self.read_tips()?.len();
        self.write_tips(TipMap::new())?;
        info!(removed = count, "reset tip collection");
        Ok(count)
    }

    /// Serialize the whole collection. Never modifies the store.
    pub fn export_snapshot(&self, format: SnapshotFormat) -> TipsResult<Vec<u8>> {
        let entries = self.load()?;
        let count = entries.len();
        let bytes = Snapshot::new(entries)?.to_bytes(format)?;
        info!(%format, entries = count, bytes = bytes.len(), "exported snapshot");
        Ok(bytes)
    }

    /// Validate `artifact`, then replace the whole collection with it.
    ///
    /// # Errors
    /// `InvalidSnapshot` if the artifact is malformed or of an unknown schema
    /// version; the stored collection is untouched in that case.
    pub fn import_snapshot(&self, artifact: &[u8], format: SnapshotFormat) -> TipsResult<usize> {
        let snapshot = Snapshot::from_bytes(artifact, format)?;
        let tips: TipMap = snapshot
            .into_entries()
            .into_iter()
            .map(|e| (e.key(), e))
            .collect();
        let count = tips.len();

        let _guard = self.lock(LockKind::Exclusive)?;
        self.write_tips(tips)?;
        info!(%format, entries = count, "imported snapshot");
        Ok(count)
    }

    fn read_tips(&self) -> TipsResult<TipMap> {
        let path = self.tips_path();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TipMap::new()),
            Err(e) => return Err(TipsError::storage(&path, e)),
        };
        let snapshot = Snapshot::from_bytes(&bytes, SnapshotFormat::Json).map_err(|e| {
            TipsError::CorruptState {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(snapshot
            .into_entries()
            .into_iter()
            .map(|e| (e.key(), e))
            .collect())
    }

    fn write_tips(&self, tips: TipMap) -> TipsResult<()> {
        let bytes = Snapshot::new(tips.into_values().collect())?.to_bytes(SnapshotFormat::Json)?;
        write_atomic(&self.tips_path(), &bytes)
    }

    /// Stored results as written, without roster alignment.
    pub fn stored_results(&self) -> TipsResult<Vec<ResultEntry>> {
        let _guard = self.lock(LockKind::Shared)?;
        self.read_results()
    }

    /// One result per roster athlete, in roster order. Athletes without a
    /// stored result read as `Medal::None`.
    pub fn load_results(&self, roster: &AthleteRoster) -> TipsResult<Vec<ResultEntry>> {
        let stored: BTreeMap<String, Medal> = self
            .stored_results()?
            .into_iter()
            .map(|r| (r.athlete_id, r.medal))
            .collect();
        Ok(roster
            .iter()
            .map(|a| ResultEntry {
                athlete_id: a.athlete_id.clone(),
                medal: stored.get(&a.athlete_id).copied().unwrap_or_default(),
            })
            .collect())
    }

    /// Record the actual medal for one athlete; returns the previous value.
    pub fn set_result(&self, athlete_id: &str, medal: Medal) -> TipsResult<Medal> {
        let _guard = self.lock(LockKind::Exclusive)?;
        let mut results = self.read_results()?;
        let previous = match results.iter_mut().find(|r| r.athlete_id == athlete_id) {
            Some(existing) => std::mem::replace(&mut existing.medal, medal),
            None => {
                results.push(ResultEntry {
                    athlete_id: athlete_id.to_string(),
                    medal,
                });
                Medal::None
            }
        };
        self.write_results(&results)?;
        debug!(athlete_id, %medal, %previous, "set result");
        Ok(previous)
    }

    /// Replace the whole results table.
    pub fn save_results(&self, results: &[ResultEntry]) -> TipsResult<()> {
        let _guard = self.lock(LockKind::Exclusive)?;
        self.write_results(results)
    }

    /// Stored results as CSV; just the header when nothing is stored.
    pub fn export_results(&self) -> TipsResult<Vec<u8>> {
        let results = self.stored_results()?;
        let mut buffer = Vec::new();
        CsvCodec::new().export_results_to_writer(&results, &mut buffer)?;
        info!(results = results.len(), "exported results");
        Ok(buffer)
    }

    /// Replace the results table from a CSV artifact.
    pub fn import_results(&self, artifact: &[u8]) -> TipsResult<usize> {
        let results = CsvCodec::new().import_results_from_reader(artifact)?;
        let _guard = self.lock(LockKind::Exclusive)?;
        self.write_results(&results)?;
        info!(results = results.len(), "imported results");
        Ok(results.len())
    }

    fn read_results(&self) -> TipsResult<Vec<ResultEntry>> {
        let path = self.results_path();
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TipsError::storage(&path, e)),
        };
        CsvCodec::new()
            .import_results_from_reader(bytes.as_slice())
            .map_err(|e| TipsError::CorruptState {
                path,
                reason: e.to_string(),
            })
    }

    fn write_results(&self, results: &[ResultEntry]) -> TipsResult<()> {
        let mut buffer = Vec::new();
        CsvCodec::new().export_results_to_writer(results, &mut buffer)?;
        write_atomic(&self.results_path(), &buffer)
    }
}

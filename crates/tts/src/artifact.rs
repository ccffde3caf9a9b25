//! Ephemeral on-disk storage for synthesized audio

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashSet},
    io,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant, SystemTime},
};

use uuid::Uuid;
use vocalis_telemetry::{Counter, metrics};

const EXTENSION: &str = "mp3";

/// One audio file owned by a single request
#[derive(Debug)]
pub struct AudioArtifact {
    id: Uuid,
    path: PathBuf,
    created_at: SystemTime,
}

impl AudioArtifact {
    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Directory of generated audio with age-based eviction
///
/// Allocations are recorded in an expiry index ordered by creation time, so
/// a sweep only touches artifacts that are actually due. Files the index
/// does not know about (left behind by a crashed process, or never
/// released) are picked up by a full directory rescan, which runs on the
/// first sweep and then at most once per `rescan_interval`.
///
/// Removal failures never propagate: they are logged, counted, and the file
/// is re-discovered by a later rescan.
#[derive(Clone)]
pub struct ArtifactStore {
    inner: Arc<Inner>,
}

struct Inner {
    directory: PathBuf,
    rescan_interval: Duration,
    index: Mutex<ExpiryIndex>,
    cleanup_failures: AtomicU64,
    failure_counter: Counter<u64>,
    swept_counter: Counter<u64>,
}

#[derive(Default)]
struct ExpiryIndex {
    queue: BinaryHeap<Reverse<(SystemTime, PathBuf)>>,
    queued: HashSet<PathBuf>,
    last_scan: Option<Instant>,
}

impl ExpiryIndex {
    fn push(&mut self, created_at: SystemTime, path: PathBuf) {
        if self.queued.insert(path.clone()) {
            self.queue.push(Reverse((created_at, path)));
        }
    }

    fn pop_expired(&mut self, now: SystemTime, max_age: Duration) -> Option<PathBuf> {
        let Reverse((created_at, _)) = self.queue.peek()?;

        if age(now, *created_at) <= max_age {
            return None;
        }

        let Reverse((_, path)) = self.queue.pop()?;
        self.queued.remove(&path);
        Some(path)
    }
}

impl ArtifactStore {
    /// Open (creating if needed) the artifact directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn open(directory: impl Into<PathBuf>, rescan_interval: Duration) -> io::Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;

        Ok(Self {
            inner: Arc::new(Inner {
                directory,
                rescan_interval,
                index: Mutex::new(ExpiryIndex::default()),
                cleanup_failures: AtomicU64::new(0),
                failure_counter: metrics::counter(metrics::TTS_ARTIFACT_CLEANUP_FAILURES),
                swept_counter: metrics::counter(metrics::TTS_ARTIFACTS_SWEPT),
            }),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    /// Reserve a fresh, uniquely named artifact
    ///
    /// Only the name is reserved; the engine creates the file.
    pub fn allocate(&self) -> AudioArtifact {
        let id = Uuid::new_v4();
        let path = self
            .inner
            .directory
            .join(format!("{}.{EXTENSION}", id.simple()));
        let created_at = SystemTime::now();

        self.lock_index().push(created_at, path.clone());

        AudioArtifact { id, path, created_at }
    }

    /// Remove every artifact older than `max_age`
    pub fn sweep_expired(&self, max_age: Duration) -> SweepReport {
        self.sweep_expired_at(SystemTime::now(), max_age)
    }

    /// [`sweep_expired`](Self::sweep_expired) with an explicit clock
    pub fn sweep_expired_at(&self, now: SystemTime, max_age: Duration) -> SweepReport {
        let mut report = SweepReport::default();
        let mut index = self.lock_index();

        if index
            .last_scan
            .is_none_or(|scanned| scanned.elapsed() >= self.inner.rescan_interval)
        {
            self.rescan(&mut index);
        }

        while let Some(path) = index.pop_expired(now, max_age) {
            match std::fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    report.failed += 1;
                    self.record_failure(&path, &e);
                }
            }
        }

        drop(index);

        if report.removed > 0 {
            self.inner.swept_counter.add(report.removed as u64, &[]);
            tracing::debug!(removed = report.removed, "swept expired artifacts");
        }

        report
    }

    /// Delete an artifact once its audio has been delivered
    pub fn release(&self, artifact: &AudioArtifact) {
        match std::fs::remove_file(&artifact.path) {
            Ok(()) => tracing::trace!(id = %artifact.id, "released artifact"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.record_failure(&artifact.path, &e),
        }
    }

    /// Cleanup failures since the store was opened
    pub fn cleanup_failures(&self) -> u64 {
        self.inner.cleanup_failures.load(Ordering::Relaxed)
    }

    fn rescan(&self, index: &mut ExpiryIndex) {
        index.last_scan = Some(Instant::now());

        let entries = match std::fs::read_dir(&self.inner.directory) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(directory = %self.inner.directory.display(), "artifact rescan failed: {e}");
                return;
            }
        };

        // Entries can vanish between listing and stat; skip those
        for entry in entries.flatten() {
            let path = entry.path();

            if !is_artifact_name(&path) {
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };

            if !metadata.is_file() {
                continue;
            }

            let created_at = metadata.modified().unwrap_or_else(|_| SystemTime::now());
            index.push(created_at, path);
        }
    }

    fn record_failure(&self, path: &Path, error: &io::Error) {
        self.inner.cleanup_failures.fetch_add(1, Ordering::Relaxed);
        self.inner.failure_counter.add(1, &[]);
        tracing::warn!(path = %path.display(), "failed to remove artifact: {error}");
    }

    fn lock_index(&self) -> std::sync::MutexGuard<'_, ExpiryIndex> {
        self.inner.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("directory", &self.inner.directory)
            .finish_non_exhaustive()
    }
}

fn age(now: SystemTime, created_at: SystemTime) -> Duration {
    now.duration_since(created_at).unwrap_or_default()
}

/// `<32 hex digits>.mp3`, the names [`ArtifactStore::allocate`] hands out
fn is_artifact_name(path: &Path) -> bool {
    let has_extension = path.extension().is_some_and(|ext| ext == EXTENSION);

    has_extension
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| Uuid::try_parse(stem).is_ok() && stem.len() == 32)
}

//! Process-local job state coordinator.
//!
//! Maps `(video_id, lang)` to the state of the job summarizing it. At most
//! one live entry exists per key; entries expire at an absolute deadline set
//! on admission and progress never moves a status backwards.
//!
//! All operations take a single mutex for the duration of a map operation
//! only. Nothing awaits while holding it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};
use vsum_models::{JobMetadata, JobState, LifecycleStatus, VideoKey};

use crate::metrics::{record_admission, set_active_jobs};

/// Outcome of [`JobStateCoordinator::admit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// A fresh entry was inserted; the caller owns the job.
    Admitted(JobState),
    /// A live entry already exists; carries its current snapshot.
    AlreadyInFlight(JobState),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }

    pub fn state(&self) -> &JobState {
        match self {
            Admission::Admitted(state) | Admission::AlreadyInFlight(state) => state,
        }
    }
}

#[derive(Debug)]
struct Entry {
    state: JobState,
    deadline: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline > now
    }
}

/// Thread-safe registry of in-flight summarization jobs.
#[derive(Debug)]
pub struct JobStateCoordinator {
    entries: Mutex<HashMap<VideoKey, Entry>>,
    ttl: Duration,
}

impl JobStateCoordinator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<VideoKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a `pending` entry for `key` unless a live one exists.
    ///
    /// An expired entry is replaced and its deadline reset.
    pub fn admit(&self, key: VideoKey, initial: JobMetadata) -> Admission {
        let now = Instant::now();
        let mut entries = self.lock();

        if let Some(entry) = entries.get(&key) {
            if entry.is_live(now) {
                record_admission(false);
                debug!(key = %key, status = %entry.state.status, "Job already in flight");
                return Admission::AlreadyInFlight(entry.state.clone());
            }
        }

        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::zero());
        let state = JobState {
            key: key.clone(),
            created_at,
            expires_at,
            status: LifecycleStatus::Pending,
            metadata: initial,
        };

        entries.insert(
            key,
            Entry {
                state: state.clone(),
                deadline: now + self.ttl,
            },
        );
        record_admission(true);
        set_active_jobs(entries.len());

        Admission::Admitted(state)
    }

    /// Move a live entry forward to `status` and merge `delta` into its
    /// metadata.
    ///
    /// Returns `false` without touching the entry when the key is absent or
    /// expired, or when `status` precedes the current one. Re-sending the
    /// current status only merges metadata.
    pub fn advance(&self, key: &VideoKey, status: LifecycleStatus, delta: JobMetadata) -> bool {
        let now = Instant::now();
        let mut entries = self.lock();

        let Some(entry) = entries.get_mut(key).filter(|e| e.is_live(now)) else {
            trace!(key = %key, status = %status, "Advance on missing or expired entry");
            return false;
        };

        if status < entry.state.status {
            debug!(
                key = %key,
                current = %entry.state.status,
                requested = %status,
                "Rejected backward status transition"
            );
            return false;
        }

        entry.state.status = status;
        entry.state.metadata.merge(delta);
        true
    }

    /// Snapshot of the live entry for `key`.
    pub fn get(&self, key: &VideoKey) -> Option<JobState> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.state.clone())
    }

    /// Purge expired entries, then report whether `key` has a live one.
    pub fn exists(&self, key: &VideoKey) -> bool {
        self.cleanup();
        self.lock().contains_key(key)
    }

    /// Remove every entry whose deadline has passed. Returns how many were
    /// removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        let removed = before - entries.len();
        set_active_jobs(entries.len());
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Expired job entries removed");
        }
        removed
    }

    /// Number of live entries.
    pub fn active_count(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| e.is_live(now)).count()
    }

    /// Run [`cleanup`](Self::cleanup) every `interval` until the coordinator
    /// is dropped.
    pub fn spawn_janitor(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(coordinator) => {
                        coordinator.cleanup();
                    }
                    None => break,
                }
            }
        })
    }
}

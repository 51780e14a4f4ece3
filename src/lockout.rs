//! Per-identifier failure counting with time-boxed lockout.
//!
//! The tracker is the only mutable shared state in the crate. It lives for
//! the life of the process and is handed to the decrypt path by `Arc`; a
//! restart clears all lockouts, which is an accepted limitation of the
//! in-memory design.
//!
//! Records are kept in a small fixed set of shards, each behind its own
//! mutex, so the read-modify-write on one identifier never waits on an
//! unrelated one.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};
use parking_lot::{Condvar, Mutex};

const SHARDS: usize = 16;

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    failures: u32,
    /// Instant before which the identifier is blocked. Initialized to the
    /// creation time, i.e. "not blocked"; only the threshold-crossing
    /// failure moves it into the future.
    blocked_until: Instant,
}

/// Shared failure tracker for decrypt attempts.
pub struct AttemptTracker {
    shards: Vec<Mutex<HashMap<String, AttemptRecord>>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl AttemptTracker {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
            max_attempts,
            lockout_duration,
        }
    }

    fn shard(&self, identifier: &str) -> &Mutex<HashMap<String, AttemptRecord>> {
        let mut hasher = DefaultHasher::new();
        identifier.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARDS]
    }

    /// True iff the identifier is currently locked out.
    pub fn is_blocked(&self, identifier: &str) -> bool {
        let shard = self.shard(identifier).lock();
        shard
            .get(identifier)
            .is_some_and(|r| Instant::now() < r.blocked_until)
    }

    /// Time left on an active lockout; zero when not blocked.
    pub fn remaining_block_time(&self, identifier: &str) -> Duration {
        let shard = self.shard(identifier).lock();
        shard
            .get(identifier)
            .map(|r| r.blocked_until.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Record one failed password attempt.
    ///
    /// Creates a fresh record at count 1 when none exists. Crossing the
    /// configured maximum starts the lockout window; a further failure while
    /// a window is already running does not extend it. Once an expired
    /// window is over, the still-elevated count re-arms on the next failure.
    pub fn record_failure(&self, identifier: &str) {
        let now = Instant::now();
        let mut shard = self.shard(identifier).lock();
        let record = shard
            .entry(identifier.to_owned())
            .or_insert(AttemptRecord {
                failures: 0,
                blocked_until: now,
            });
        record.failures += 1;
        if record.failures >= self.max_attempts && now >= record.blocked_until {
            record.blocked_until = now + self.lockout_duration;
            debug!(
                "identifier {identifier:?} blocked after {} failures",
                record.failures
            );
        }
    }

    /// Failed attempts currently on record for the identifier.
    pub fn attempt_count(&self, identifier: &str) -> u32 {
        let shard = self.shard(identifier).lock();
        shard.get(identifier).map_or(0, |r| r.failures)
    }

    /// Forget the identifier entirely (successful decryption).
    pub fn reset(&self, identifier: &str) {
        let mut shard = self.shard(identifier).lock();
        shard.remove(identifier);
    }

    /// Evict records whose lockout window ended more than one full
    /// `lockout_duration` ago. Bounds memory for identifiers that are never
    /// retried; called periodically by the sweeper thread.
    pub fn sweep(&self) {
        let now = Instant::now();
        let mut evicted = 0usize;
        for shard in &self.shards {
            let mut shard = shard.lock();
            let before = shard.len();
            shard.retain(|_, r| now < r.blocked_until + self.lockout_duration);
            evicted += before - shard.len();
        }
        if evicted > 0 {
            debug!("lockout sweep evicted {evicted} stale records");
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }
}

/// Handle for the background sweep thread. Dropping it stops the thread.
pub struct Sweeper {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a thread that calls [`AttemptTracker::sweep`] every `interval`
    /// until the returned handle is dropped.
    pub fn spawn(
        tracker: Arc<AttemptTracker>,
        interval: Duration,
    ) -> Result<Self, crate::types::EncBoxError> {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("encbox-lockout-sweep".into())
            .spawn(move || {
                let (lock, cvar) = &*thread_stop;
                let mut stopped = lock.lock();
                while !*stopped {
                    if cvar.wait_for(&mut stopped, interval).timed_out() && !*stopped {
                        trace!("running scheduled lockout sweep");
                        tracker.sweep();
                    }
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        let (lock, cvar) = &*self.stop;
        *lock.lock() = true;
        cvar.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

//! Sampling session: lifecycle and serialization of counter reads.
//!
//! A [`Session`] owns its counter reader and snapshot store behind one mutex.
//! Every sampling call holds that mutex from the raw read through the
//! snapshot store update, so reads never interleave and no caller sees a
//! half-updated baseline.
//!
//! ```text
//!   Closed ──open()/with_reader()──▶ Open ──close()/drop──▶ Closed
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, trace};

use crate::collector::{CounterReader, DEFAULT_PROC_PATH, ProcfsReader, RealFs};
use crate::error::StatError;
use crate::models::{CpuStats, FsInfo, HostInfo};
use crate::rates::diff_cpu;
use crate::snapshot::SnapshotStore;

/// Set while a session over the local host counters is open.
static HOST_SESSION_OPEN: AtomicBool = AtomicBool::new(false);

/// Claim on the process-wide host session slot, released on drop.
#[derive(Debug)]
struct HostSlot;

impl HostSlot {
    fn claim() -> Result<Self, StatError> {
        HOST_SESSION_OPEN
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| HostSlot)
            .map_err(|_| StatError::AlreadyOpen)
    }
}

impl Drop for HostSlot {
    fn drop(&mut self) {
        HOST_SESSION_OPEN.store(false, Ordering::Release);
    }
}

/// State that only exists while the session is open.
struct Sampler<R> {
    reader: R,
    store: SnapshotStore,
    _slot: Option<HostSlot>,
}

/// Exclusive handle over a counter subsystem.
///
/// `Session` is `Send + Sync`; share it across threads with `Arc`. Calls
/// from different threads are serialized.
pub struct Session<R: CounterReader = ProcfsReader<RealFs>> {
    state: Mutex<Option<Sampler<R>>>,
}

impl Session<ProcfsReader<RealFs>> {
    /// Opens a session over the local host's `/proc`.
    ///
    /// Only one such session may be open per process; a second call fails
    /// with [`StatError::AlreadyOpen`] until the first is closed or dropped.
    pub fn open() -> Result<Self, StatError> {
        if !cfg!(target_os = "linux") {
            return Err(StatError::Init(format!(
                "unsupported platform: {}",
                std::env::consts::OS
            )));
        }
        let slot = HostSlot::claim()?;
        Self::start(ProcfsReader::new(RealFs::new(), DEFAULT_PROC_PATH), Some(slot))
    }
}

impl<R: CounterReader> Session<R> {
    /// Opens a session over a caller-supplied reader.
    ///
    /// The reader owns its subsystem, so this does not take the process-wide
    /// host slot.
    pub fn with_reader(reader: R) -> Result<Self, StatError> {
        Self::start(reader, None)
    }

    fn start(mut reader: R, slot: Option<HostSlot>) -> Result<Self, StatError> {
        reader.init().map_err(|e| match e {
            StatError::Init(_) => e,
            other => StatError::Init(other.to_string()),
        })?;
        debug!(host = slot.is_some(), "sampling session opened");
        Ok(Self {
            state: Mutex::new(Some(Sampler {
                reader,
                store: SnapshotStore::new(),
                _slot: slot,
            })),
        })
    }

    // The guarded state is only replaced by whole assignments, so a panic in
    // another caller cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, Option<Sampler<R>>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_sampler<T>(
        &self,
        op: impl FnOnce(&mut Sampler<R>) -> Result<T, StatError>,
    ) -> Result<T, StatError> {
        let mut guard = self.lock();
        let sampler = guard.as_mut().ok_or(StatError::NotOpen)?;
        op(sampler)
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Reads static host identity.
    pub fn host_info(&self) -> Result<HostInfo, StatError> {
        self.with_sampler(|s| s.reader.read_host_info())
    }

    /// Runs one sample-diff cycle and returns CPU utilization since the
    /// previous call.
    ///
    /// The first call on a session has no baseline and returns undefined
    /// percentages. A failed load average read is reported, but the CPU
    /// baseline has already advanced.
    pub fn cpu_stats(&self) -> Result<CpuStats, StatError> {
        self.with_sampler(|s| {
            let snapshot = s.reader.read_cpu_counters()?;
            trace!(counters = ?snapshot.counters(), "cpu sample");
            let percents = diff_cpu(&mut s.store, snapshot);
            let load = s.reader.read_load_averages()?;
            Ok(CpuStats::new(percents, load, Utc::now()))
        })
    }

    /// One record per mounted filesystem.
    pub fn filesystem_info(&self) -> Result<Vec<FsInfo>, StatError> {
        self.with_sampler(|s| {
            let raw = s.reader.read_filesystems()?;
            Ok(raw.into_iter().map(FsInfo::from).collect())
        })
    }

    /// Releases the reader. Calling it again is a no-op.
    pub fn close(&self) {
        let sampler = self.lock().take();
        if let Some(sampler) = sampler {
            drop(sampler);
            debug!("sampling session closed");
        }
    }
}

impl<R: CounterReader> Drop for Session<R> {
    fn drop(&mut self) {
        self.close();
    }
}

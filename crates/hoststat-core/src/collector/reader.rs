//! The counter reader seam between a session and the platform.

use crate::collector::traits::FsStat;
use crate::error::StatError;
use crate::models::HostInfo;
use crate::snapshot::CpuSnapshot;

/// 1, 5 and 15 minute load averages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadAverages {
    pub min1: f64,
    pub min5: f64,
    pub min15: f64,
}

/// Raw capacity counters of one mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFsCounters {
    pub device_name: String,
    pub fs_type: String,
    pub mount_point: String,
    pub stat: FsStat,
}

/// Platform access to raw, unprocessed OS counters.
///
/// Implementations perform pure reads: no differencing, no defaults for
/// failed reads. A session serializes every call, so implementations need
/// not be reentrant.
pub trait CounterReader: Send {
    /// Checks that the counter subsystem is usable. Called once when a
    /// session opens; an error here keeps the session closed.
    fn init(&mut self) -> Result<(), StatError>;

    fn read_host_info(&mut self) -> Result<HostInfo, StatError>;

    /// Cumulative per-mode ticks since boot, across all CPUs.
    fn read_cpu_counters(&mut self) -> Result<CpuSnapshot, StatError>;

    fn read_load_averages(&mut self) -> Result<LoadAverages, StatError>;

    fn read_filesystems(&mut self) -> Result<Vec<RawFsCounters>, StatError>;
}

//! Raw counter snapshots and the store that keeps the previous one per
//! metric family.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// CPU accounting modes tracked by a [`CpuSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CpuMode {
    User,
    Nice,
    Kernel,
    Idle,
    IoWait,
    Swap,
}

impl CpuMode {
    pub const ALL: [CpuMode; 6] = [
        CpuMode::User,
        CpuMode::Nice,
        CpuMode::Kernel,
        CpuMode::Idle,
        CpuMode::IoWait,
        CpuMode::Swap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CpuMode::User => "user",
            CpuMode::Nice => "nice",
            CpuMode::Kernel => "kernel",
            CpuMode::Idle => "idle",
            CpuMode::IoWait => "iowait",
            CpuMode::Swap => "swap",
        }
    }
}

impl fmt::Display for CpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cumulative CPU tick counters captured at one instant.
///
/// Immutable once built. Modes the platform does not track read as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSnapshot {
    taken_at: Instant,
    counters: BTreeMap<CpuMode, u64>,
}

impl CpuSnapshot {
    pub fn new(taken_at: Instant, counters: impl IntoIterator<Item = (CpuMode, u64)>) -> Self {
        Self {
            taken_at,
            counters: counters.into_iter().collect(),
        }
    }

    /// Monotonic capture time.
    pub fn taken_at(&self) -> Instant {
        self.taken_at
    }

    /// Cumulative ticks for `mode`.
    pub fn get(&self, mode: CpuMode) -> u64 {
        self.counters.get(&mode).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &BTreeMap<CpuMode, u64> {
        &self.counters
    }

    /// Sum of all mode counters.
    pub fn total(&self) -> u64 {
        self.counters.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// Holds the most recent raw snapshot per metric family.
///
/// Only CPU counters are differenced today; load averages and filesystem
/// counters are already absolute values.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    prev_cpu: Option<CpuSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The baseline for the next CPU diff, if one has been taken.
    pub fn previous_cpu(&self) -> Option<&CpuSnapshot> {
        self.prev_cpu.as_ref()
    }

    /// Installs `snapshot` as the new baseline and returns the old one.
    pub fn replace_cpu(&mut self, snapshot: CpuSnapshot) -> Option<CpuSnapshot> {
        self.prev_cpu.replace(snapshot)
    }
}

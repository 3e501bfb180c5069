//! CPU percentage computation from cumulative tick snapshots.
//!
//! This module is the **single source of truth** for turning two
//! [`CpuSnapshot`]s into per-mode percentages. The session calls
//! [`diff_cpu`], which always leaves the newest snapshot as the baseline.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::StatError;
use crate::snapshot::{CpuMode, CpuSnapshot, SnapshotStore};

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute counter delta, returning `None` on counter regression (reset or wrap).
pub fn dcounter(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

// ---------------------------------------------------------------------------
// Rate
// ---------------------------------------------------------------------------

/// A derived percentage, or the explicit absence of one.
///
/// `Undefined` is not an error: it is what the first sample of a session
/// (or a sample over a zero-length interval) yields. It serializes as `null`,
/// which keeps it distinct from a measured `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Rate {
    #[default]
    Undefined,
    Percent(f64),
}

impl Rate {
    pub fn is_defined(&self) -> bool {
        matches!(self, Rate::Percent(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Rate::Percent(v) => Some(*v),
            Rate::Undefined => None,
        }
    }

    /// Returns the percentage or [`StatError::UndefinedRate`].
    pub fn percent(&self) -> Result<f64, StatError> {
        self.value().ok_or(StatError::UndefinedRate)
    }
}

impl From<Option<f64>> for Rate {
    fn from(v: Option<f64>) -> Self {
        match v {
            Some(v) if v.is_finite() => Rate::Percent(v),
            _ => Rate::Undefined,
        }
    }
}

impl From<Rate> for Option<f64> {
    fn from(r: Rate) -> Self {
        r.value()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Forward the formatter so `{:.6}` applies to the number.
            Rate::Percent(v) => fmt::Display::fmt(v, f),
            Rate::Undefined => f.write_str("undefined"),
        }
    }
}

// ---------------------------------------------------------------------------
// CPU percentages
// ---------------------------------------------------------------------------

/// Why a CPU diff produced no percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    /// First sample of the session.
    NoBaseline,
    /// The two snapshots were taken at the same instant (or out of order).
    ZeroInterval,
    /// The tick total went backwards between the snapshots.
    CounterReset,
    /// No counter moved.
    NoMovement,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedReason::NoBaseline => f.write_str("no baseline snapshot"),
            UndefinedReason::ZeroInterval => f.write_str("zero-length interval"),
            UndefinedReason::CounterReset => f.write_str("cpu tick total went backwards"),
            UndefinedReason::NoMovement => f.write_str("no counter movement"),
        }
    }
}

/// Per-mode CPU percentages over one sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CpuPercents {
    pub user: Rate,
    pub nice: Rate,
    pub kernel: Rate,
    pub idle: Rate,
    pub iowait: Rate,
    pub swap: Rate,
}

impl CpuPercents {
    /// All modes undefined.
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: CpuMode) -> Rate {
        match mode {
            CpuMode::User => self.user,
            CpuMode::Nice => self.nice,
            CpuMode::Kernel => self.kernel,
            CpuMode::Idle => self.idle,
            CpuMode::IoWait => self.iowait,
            CpuMode::Swap => self.swap,
        }
    }

    fn set(&mut self, mode: CpuMode, rate: Rate) {
        let slot = match mode {
            CpuMode::User => &mut self.user,
            CpuMode::Nice => &mut self.nice,
            CpuMode::Kernel => &mut self.kernel,
            CpuMode::Idle => &mut self.idle,
            CpuMode::IoWait => &mut self.iowait,
            CpuMode::Swap => &mut self.swap,
        };
        *slot = rate;
    }

    /// Sum of all modes, or `None` if any mode is undefined.
    pub fn sum(&self) -> Option<f64> {
        CpuMode::ALL
            .iter()
            .map(|m| self.get(*m).value())
            .sum::<Option<f64>>()
    }
}

/// Computes per-mode percentages between two snapshots.
///
/// Percentages are `100 * delta / total_delta`, unrounded.
///
/// A single mode may dip between reads (the kernel's iowait accounting is
/// not monotonic); its delta is clamped to zero. Only a tick total that goes
/// backwards, as after a counter reset, leaves the interval undefined.
pub fn cpu_percents(
    prev: Option<&CpuSnapshot>,
    curr: &CpuSnapshot,
) -> Result<CpuPercents, UndefinedReason> {
    let prev = prev.ok_or(UndefinedReason::NoBaseline)?;
    if curr.taken_at() <= prev.taken_at() {
        return Err(UndefinedReason::ZeroInterval);
    }
    dcounter(curr.total(), prev.total()).ok_or(UndefinedReason::CounterReset)?;

    let mut deltas = [0u64; CpuMode::ALL.len()];
    for (slot, mode) in deltas.iter_mut().zip(CpuMode::ALL) {
        let (now, before) = (curr.get(mode), prev.get(mode));
        *slot = dcounter(now, before).unwrap_or_else(|| {
            debug!(%mode, before, now, "cpu counter dipped, delta clamped to zero");
            0
        });
    }

    let total: u64 = deltas.iter().fold(0u64, |acc, d| acc.saturating_add(*d));
    if total == 0 {
        return Err(UndefinedReason::NoMovement);
    }

    let mut percents = CpuPercents::undefined();
    for (delta, mode) in deltas.iter().zip(CpuMode::ALL) {
        percents.set(mode, Rate::Percent(100.0 * *delta as f64 / total as f64));
    }
    Ok(percents)
}

/// Diffs `curr` against the stored baseline, then installs `curr` as the
/// new baseline whatever the outcome.
pub fn diff_cpu(store: &mut SnapshotStore, curr: CpuSnapshot) -> CpuPercents {
    let percents = match cpu_percents(store.previous_cpu(), &curr) {
        Ok(p) => p,
        Err(reason @ UndefinedReason::CounterReset) => {
            warn!(%reason, "cpu counters regressed, rates undefined for this interval");
            CpuPercents::undefined()
        }
        Err(reason) => {
            trace!(%reason, "cpu rates undefined");
            CpuPercents::undefined()
        }
    };
    store.replace_cpu(curr);
    percents
}

//! Public records handed to callers.
//!
//! Field names on the wire mirror the record attribute names consumers
//! already parse (`OSName`, `NCPUs`, `IOWait`, ...). Timing fields that are
//! not part of that contract are skipped by serde.

mod formatting;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::{LoadAverages, RawFsCounters};
use crate::error::StatError;
use crate::rates::{CpuPercents, Rate};

/// Static host identity.
///
/// Invariant: `ncpus <= max_cpus`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct HostInfo {
    /// Kernel name, e.g. `Linux`.
    /// Source: `/proc/sys/kernel/ostype`
    #[serde(rename = "OSName")]
    pub os_name: String,

    /// Kernel release, e.g. `6.1.0-13-amd64`.
    /// Source: `/proc/sys/kernel/osrelease`
    #[serde(rename = "OSRelease")]
    pub os_release: String,

    /// Kernel build string.
    /// Source: `/proc/sys/kernel/version`
    #[serde(rename = "OSVersion")]
    pub os_version: String,

    /// Machine architecture, e.g. `x86_64`.
    #[serde(rename = "Platform")]
    pub platform: String,

    #[serde(rename = "HostName")]
    pub host_name: String,

    /// Logical CPUs currently online.
    #[serde(rename = "NCPUs")]
    pub ncpus: u32,

    /// CPUs the kernel can bring online.
    #[serde(rename = "MaxCPUs")]
    pub max_cpus: u32,

    /// Address width in bits (32 or 64).
    #[serde(rename = "BitWidth")]
    pub bit_width: u32,

    /// Time since boot.
    #[serde(skip)]
    pub uptime: Duration,

    /// Wall clock at capture.
    #[serde(skip)]
    pub systime: DateTime<Utc>,
}

impl HostInfo {
    /// Boot time derived from `systime - uptime`.
    pub fn boot_time(&self) -> Option<DateTime<Utc>> {
        let uptime = chrono::Duration::from_std(self.uptime).ok()?;
        self.systime.checked_sub_signed(uptime)
    }
}

/// CPU utilization over the last sampling interval plus load averages.
///
/// Percentages are [`Rate::Undefined`] on the first sample of a session.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CpuStats {
    #[serde(rename = "User")]
    pub user: Rate,
    #[serde(rename = "Kernel")]
    pub kernel: Rate,
    #[serde(rename = "Idle")]
    pub idle: Rate,
    #[serde(rename = "IOWait")]
    pub iowait: Rate,
    #[serde(rename = "Swap")]
    pub swap: Rate,
    #[serde(rename = "Nice")]
    pub nice: Rate,

    /// Source: `/proc/loadavg` field 1
    #[serde(rename = "LoadMin1")]
    pub load_min1: f64,
    /// Source: `/proc/loadavg` field 2
    #[serde(rename = "LoadMin5")]
    pub load_min5: f64,
    /// Source: `/proc/loadavg` field 3
    #[serde(rename = "LoadMin15")]
    pub load_min15: f64,

    /// Wall clock of the sample.
    #[serde(skip)]
    pub time_taken: DateTime<Utc>,
}

impl CpuStats {
    pub fn new(percents: CpuPercents, load: LoadAverages, time_taken: DateTime<Utc>) -> Self {
        Self {
            user: percents.user,
            kernel: percents.kernel,
            idle: percents.idle,
            iowait: percents.iowait,
            swap: percents.swap,
            nice: percents.nice,
            load_min1: load.min1,
            load_min5: load.min5,
            load_min15: load.min15,
            time_taken,
        }
    }

    /// Returns `true` when every percentage carries a value.
    pub fn is_defined(&self) -> bool {
        self.percents().sum().is_some()
    }

    /// Sum of all percentage fields; ≈100 for a valid interval.
    pub fn percent_sum(&self) -> Result<f64, StatError> {
        self.percents().sum().ok_or(StatError::UndefinedRate)
    }

    pub fn percents(&self) -> CpuPercents {
        CpuPercents {
            user: self.user,
            nice: self.nice,
            kernel: self.kernel,
            idle: self.idle,
            iowait: self.iowait,
            swap: self.swap,
        }
    }
}

/// Capacity and inode usage of one mounted filesystem.
///
/// Counts are in blocks of `block_size` bytes. Invariant: `used + free <= size`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct FsInfo {
    /// Source: `/proc/mounts` field 1
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    /// Source: `/proc/mounts` field 3
    #[serde(rename = "FSType")]
    pub fs_type: String,
    /// Source: `/proc/mounts` field 2
    #[serde(rename = "MountPoint")]
    pub mount_point: String,

    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Used")]
    pub used: u64,
    #[serde(rename = "Free")]
    pub free: u64,
    /// Free blocks usable by unprivileged users (excludes reserved blocks).
    #[serde(rename = "Available")]
    pub available: u64,

    #[serde(rename = "TotalInodes")]
    pub total_inodes: u64,
    #[serde(rename = "UsedInodes")]
    pub used_inodes: u64,
    #[serde(rename = "FreeInodes")]
    pub free_inodes: u64,
    #[serde(rename = "AvailableInodes")]
    pub available_inodes: u64,

    /// Fragment size in bytes.
    #[serde(skip)]
    pub block_size: u64,
}

impl FsInfo {
    /// Size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size.saturating_mul(self.block_size)
    }

    /// Used space as a percentage of size, `None` for an empty filesystem.
    pub fn used_percent(&self) -> Option<f64> {
        (self.size > 0).then(|| 100.0 * self.used as f64 / self.size as f64)
    }
}

impl From<RawFsCounters> for FsInfo {
    /// Derives `used` from `size - free` so the capacity invariant holds even
    /// when a filesystem reports inconsistent counters.
    fn from(raw: RawFsCounters) -> Self {
        let st = raw.stat;
        let size = st.blocks;
        let free = st.blocks_free.min(size);
        let total_inodes = st.files;
        let free_inodes = st.files_free.min(total_inodes);

        Self {
            device_name: raw.device_name,
            fs_type: raw.fs_type,
            mount_point: raw.mount_point,
            size,
            used: size - free,
            free,
            available: st.blocks_available.min(size),
            total_inodes,
            used_inodes: total_inodes - free_inodes,
            free_inodes,
            available_inodes: st.files_available.min(total_inodes),
            block_size: st.block_size,
        }
    }
}

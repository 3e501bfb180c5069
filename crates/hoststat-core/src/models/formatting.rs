//! Canonical text rendering of records for diagnostics.
//!
//! One `Name:\tvalue` line per field, in a fixed order. Floats use six
//! decimals; undefined rates print as `undefined`.

use std::fmt;

use super::{CpuStats, FsInfo, HostInfo};

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OSName:\t{}", self.os_name)?;
        writeln!(f, "OSRelease:\t{}", self.os_release)?;
        writeln!(f, "OSVersion:\t{}", self.os_version)?;
        writeln!(f, "Platform:\t{}", self.platform)?;
        writeln!(f, "HostName:\t{}", self.host_name)?;
        writeln!(f, "NCPUs:\t\t{}", self.ncpus)?;
        writeln!(f, "MaxCPUs:\t{}", self.max_cpus)?;
        writeln!(f, "BitWidth:\t{}", self.bit_width)
    }
}

impl fmt::Display for CpuStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User:\t\t{:.6}", self.user)?;
        writeln!(f, "Kernel:\t\t{:.6}", self.kernel)?;
        writeln!(f, "Idle:\t\t{:.6}", self.idle)?;
        writeln!(f, "IOWait:\t\t{:.6}", self.iowait)?;
        writeln!(f, "Swap:\t\t{:.6}", self.swap)?;
        writeln!(f, "Nice:\t\t{:.6}", self.nice)?;
        writeln!(f, "LoadMin1:\t{:.6}", self.load_min1)?;
        writeln!(f, "LoadMin5:\t{:.6}", self.load_min5)?;
        writeln!(f, "LoadMin15:\t{:.6}", self.load_min15)
    }
}

impl fmt::Display for FsInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DeviceName:\t{}", self.device_name)?;
        writeln!(f, "FSType:\t{}", self.fs_type)?;
        writeln!(f, "MountPoint:\t{}", self.mount_point)?;
        writeln!(f, "Size:\t{}", self.size)?;
        writeln!(f, "Used:\t{}", self.used)?;
        writeln!(f, "Free:\t{}", self.free)?;
        writeln!(f, "Available:\t{}", self.available)?;
        writeln!(f, "TotalInodes:\t{}", self.total_inodes)?;
        writeln!(f, "UsedInodes:\t{}", self.used_inodes)?;
        writeln!(f, "FreeInodes:\t{}", self.free_inodes)?;
        writeln!(f, "AvailableInodes:\t{}", self.available_inodes)
    }
}

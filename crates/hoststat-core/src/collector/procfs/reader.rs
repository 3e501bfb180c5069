//! Counter reader backed by Linux `/proc` and `/sys`.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use crate::collector::procfs::parser::{
    CpuStat, GlobalStat, parse_cpu_list, parse_global_stat, parse_loadavg, parse_mounts,
    parse_uptime,
};
use crate::collector::reader::{CounterReader, LoadAverages, RawFsCounters};
use crate::collector::traits::FileSystem;
use crate::error::{ParseError, StatError};
use crate::models::HostInfo;
use crate::snapshot::{CpuMode, CpuSnapshot};

pub const DEFAULT_PROC_PATH: &str = "/proc";
pub const DEFAULT_SYS_PATH: &str = "/sys";

/// Filesystem types that never describe storage capacity.
const PSEUDO_FS_TYPES: &[&str] = &[
    "autofs",
    "binfmt_misc",
    "bpf",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "hugetlbfs",
    "mqueue",
    "nsfs",
    "proc",
    "pstore",
    "rpc_pipefs",
    "securityfs",
    "selinuxfs",
    "sysfs",
    "tracefs",
];

/// Maps the aggregate `/proc/stat` line onto the tracked CPU modes.
///
/// irq, softirq and steal count as kernel time. guest and guest_nice are
/// already included in user and nice by the kernel.
fn cpu_modes(cpu: &CpuStat) -> [(CpuMode, u64); 6] {
    let kernel = cpu
        .system
        .saturating_add(cpu.irq)
        .saturating_add(cpu.softirq)
        .saturating_add(cpu.steal);
    [
        (CpuMode::User, cpu.user),
        (CpuMode::Nice, cpu.nice),
        (CpuMode::Kernel, kernel),
        (CpuMode::Idle, cpu.idle),
        (CpuMode::IoWait, cpu.iowait),
        (CpuMode::Swap, 0),
    ]
}

/// Address width for a machine architecture name.
fn bit_width_for(platform: &str) -> u32 {
    if platform.contains("64") || platform == "s390x" {
        64
    } else if platform.starts_with("arm")
        || (platform.starts_with('i') && platform.ends_with("86"))
        || matches!(platform, "x86" | "mips" | "mipsel" | "powerpc" | "ppc" | "s390")
    {
        32
    } else {
        usize::BITS
    }
}

/// Reads host counters from a procfs tree.
///
/// Paths are configurable so the reader can run against a bind-mounted host
/// `/proc` inside a container, or a fabricated tree in tests.
pub struct ProcfsReader<F: FileSystem> {
    fs: F,
    proc_path: String,
    sys_path: String,
}

impl<F: FileSystem> ProcfsReader<F> {
    /// Creates a new procfs reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            sys_path: DEFAULT_SYS_PATH.to_string(),
        }
    }

    /// Overrides the sysfs base path (default `/sys`).
    pub fn with_sys_path(mut self, sys_path: impl Into<String>) -> Self {
        self.sys_path = sys_path.into();
        self
    }

    fn read(&self, path: &str) -> Result<String, StatError> {
        self.fs
            .read_to_string(Path::new(path))
            .map_err(|e| StatError::read(path, e))
    }

    fn read_trimmed(&self, path: &str) -> Result<String, StatError> {
        Ok(self.read(path)?.trim().to_string())
    }

    /// Like `read`, but a missing file is `Ok(None)`.
    fn read_optional(&self, path: &str) -> Result<Option<String>, StatError> {
        match self.fs.read_to_string(Path::new(path)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StatError::read(path, e)),
        }
    }

    fn read_global_stat(&self) -> Result<GlobalStat, StatError> {
        let path = format!("{}/stat", self.proc_path);
        let content = self.read(&path)?;
        parse_global_stat(&content).map_err(|e| StatError::read(&path, e))
    }

    /// Counts CPUs in a sysfs cpu list file, `None` if the file is absent.
    fn read_cpu_list(&self, name: &str) -> Result<Option<u32>, StatError> {
        let path = format!("{}/devices/system/cpu/{}", self.sys_path, name);
        match self.read_optional(&path)? {
            Some(content) => parse_cpu_list(&content)
                .map(Some)
                .map_err(|e| StatError::read(&path, e)),
            None => Ok(None),
        }
    }

    fn read_platform(&self) -> Result<String, StatError> {
        let path = format!("{}/sys/kernel/arch", self.proc_path);
        Ok(match self.read_optional(&path)? {
            Some(arch) if !arch.trim().is_empty() => arch.trim().to_string(),
            _ => std::env::consts::ARCH.to_string(),
        })
    }

    fn read_uptime(&self) -> Result<Duration, StatError> {
        let path = format!("{}/uptime", self.proc_path);
        let secs = parse_uptime(&self.read(&path)?).map_err(|e| StatError::read(&path, e))?;
        Ok(Duration::from_secs_f64(secs))
    }
}

impl<F: FileSystem> CounterReader for ProcfsReader<F> {
    fn init(&mut self) -> Result<(), StatError> {
        let path = format!("{}/stat", self.proc_path);
        if !self.fs.exists(Path::new(&path)) {
            return Err(StatError::Init(format!(
                "proc filesystem not available at {}",
                self.proc_path
            )));
        }
        self.read_global_stat()
            .map_err(|e| StatError::Init(e.to_string()))?;
        debug!(proc_path = %self.proc_path, "procfs reader initialized");
        Ok(())
    }

    fn read_host_info(&mut self) -> Result<HostInfo, StatError> {
        let kernel = |name: &str| self.read_trimmed(&format!("{}/sys/kernel/{}", self.proc_path, name));

        let platform = self.read_platform()?;
        let ncpus = match self.read_cpu_list("online")? {
            Some(n) => n,
            None => self.read_global_stat()?.online_cpus() as u32,
        };
        let max_cpus = self.read_cpu_list("possible")?.unwrap_or(ncpus).max(ncpus);

        Ok(HostInfo {
            os_name: kernel("ostype")?,
            os_release: kernel("osrelease")?,
            os_version: kernel("version")?,
            host_name: kernel("hostname")?,
            bit_width: bit_width_for(&platform),
            platform,
            ncpus,
            max_cpus,
            uptime: self.read_uptime()?,
            systime: Utc::now(),
        })
    }

    fn read_cpu_counters(&mut self) -> Result<CpuSnapshot, StatError> {
        let stat = self.read_global_stat()?;
        let taken_at = Instant::now();
        let aggregate = stat.aggregate().ok_or_else(|| {
            StatError::read(
                format!("{}/stat", self.proc_path),
                ParseError::new("missing aggregate cpu line"),
            )
        })?;
        Ok(CpuSnapshot::new(taken_at, cpu_modes(aggregate)))
    }

    fn read_load_averages(&mut self) -> Result<LoadAverages, StatError> {
        let path = format!("{}/loadavg", self.proc_path);
        let content = self.read(&path)?;
        let load = parse_loadavg(&content).map_err(|e| StatError::read(&path, e))?;
        Ok(LoadAverages {
            min1: load.load1,
            min5: load.load5,
            min15: load.load15,
        })
    }

    fn read_filesystems(&mut self) -> Result<Vec<RawFsCounters>, StatError> {
        let path = format!("{}/mounts", self.proc_path);
        let content = self.read(&path)?;
        let entries = parse_mounts(&content).map_err(|e| StatError::read(&path, e))?;

        // A later mount over the same point shadows the earlier one.
        let mut mounts = Vec::with_capacity(entries.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for entry in entries {
            if PSEUDO_FS_TYPES.contains(&entry.fs_type.as_str()) {
                continue;
            }
            match index.get(&entry.mount_point) {
                Some(&i) => mounts[i] = entry,
                None => {
                    index.insert(entry.mount_point.clone(), mounts.len());
                    mounts.push(entry);
                }
            }
        }

        let mut result = Vec::with_capacity(mounts.len());
        for entry in mounts {
            let stat = match self.fs.statvfs(Path::new(&entry.mount_point)) {
                Ok(stat) => stat,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                    ) =>
                {
                    debug!(mount = %entry.mount_point, error = %e, "skipping unreadable mount");
                    continue;
                }
                Err(e) => return Err(StatError::read(&entry.mount_point, e)),
            };
            if stat.blocks == 0 {
                continue;
            }
            result.push(RawFsCounters {
                device_name: entry.device,
                fs_type: entry.fs_type,
                mount_point: entry.mount_point,
                stat,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::traits::{FsStat, RealFs};
    use crate::error::ReadFailure;

    fn typical_reader() -> (MockFs, ProcfsReader<MockFs>) {
        let fs = MockFs::typical_host();
        (fs.clone(), ProcfsReader::new(fs, "/proc"))
    }

    #[test]
    fn test_init_ok() {
        let (_, mut reader) = typical_reader();
        reader.init().unwrap();
    }

    #[test]
    fn test_init_without_proc() {
        let mut reader = ProcfsReader::new(MockFs::new(), "/proc");
        assert!(matches!(reader.init(), Err(StatError::Init(_))));
    }

    #[test]
    fn test_init_with_corrupt_stat() {
        let fs = MockFs::new();
        fs.add_file("/proc/stat", "intr 0\n");
        let mut reader = ProcfsReader::new(fs, "/proc");
        match reader.init() {
            Err(StatError::Init(msg)) => assert!(msg.contains("aggregate")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_read_host_info() {
        let (_, mut reader) = typical_reader();
        let host = reader.read_host_info().unwrap();
        assert_eq!(host.os_name, "Linux");
        assert_eq!(host.os_release, "6.1.0-13-amd64");
        assert!(host.os_version.starts_with("#1 SMP"));
        assert_eq!(host.platform, "x86_64");
        assert_eq!(host.host_name, "testhost");
        assert_eq!(host.ncpus, 4);
        assert_eq!(host.max_cpus, 4);
        assert_eq!(host.bit_width, 64);
        assert_eq!(host.uptime.as_secs(), 12345);
    }

    #[test]
    fn test_read_host_info_fallbacks() {
        let fs = MockFs::minimal_host();
        let mut reader = ProcfsReader::new(fs, "/proc");
        let host = reader.read_host_info().unwrap();
        // No sysfs cpu lists: count cpuN lines, max follows ncpus.
        assert_eq!(host.ncpus, 2);
        assert_eq!(host.max_cpus, 2);
        // No kernel/arch: build target architecture.
        assert_eq!(host.platform, std::env::consts::ARCH);
    }

    #[test]
    fn test_oversized_cpu_list_is_read_error() {
        let (fs, mut reader) = typical_reader();
        fs.add_file("/sys/devices/system/cpu/online", "0-4294967295\n");
        match reader.read_host_info() {
            Err(StatError::Read { path, source }) => {
                assert_eq!(path, Path::new("/sys/devices/system/cpu/online"));
                assert!(matches!(source, ReadFailure::Parse(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_max_cpus_never_below_ncpus() {
        let (fs, mut reader) = typical_reader();
        fs.add_file("/sys/devices/system/cpu/online", "0-7\n");
        fs.add_file("/sys/devices/system/cpu/possible", "0-3\n");
        let host = reader.read_host_info().unwrap();
        assert_eq!(host.ncpus, 8);
        assert_eq!(host.max_cpus, 8);
    }

    #[test]
    fn test_read_host_info_missing_hostname_is_error() {
        let (fs, mut reader) = typical_reader();
        fs.remove_file("/proc/sys/kernel/hostname");
        let err = reader.read_host_info().unwrap_err();
        match err {
            StatError::Read { path, source } => {
                assert_eq!(path, Path::new("/proc/sys/kernel/hostname"));
                assert!(matches!(source, ReadFailure::Io(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_read_cpu_counters_mapping() {
        let (fs, mut reader) = typical_reader();
        fs.add_file(
            "/proc/stat",
            "cpu  100 20 300 4000 50 6 7 8 90 10\ncpu0 100 20 300 4000 50 6 7 8 90 10\n",
        );
        let snap = reader.read_cpu_counters().unwrap();
        assert_eq!(snap.get(CpuMode::User), 100);
        assert_eq!(snap.get(CpuMode::Nice), 20);
        assert_eq!(snap.get(CpuMode::Kernel), 300 + 6 + 7 + 8);
        assert_eq!(snap.get(CpuMode::Idle), 4000);
        assert_eq!(snap.get(CpuMode::IoWait), 50);
        assert_eq!(snap.get(CpuMode::Swap), 0);
        // guest columns are not double counted
        assert_eq!(snap.total(), 100 + 20 + 321 + 4000 + 50);
    }

    #[test]
    fn test_read_load_averages() {
        let (_, mut reader) = typical_reader();
        let load = reader.read_load_averages().unwrap();
        assert!((load.min1 - 0.15).abs() < 1e-9);
        assert!((load.min5 - 0.10).abs() < 1e-9);
        assert!((load.min15 - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_read_load_averages_parse_failure() {
        let (fs, mut reader) = typical_reader();
        fs.add_file("/proc/loadavg", "garbage\n");
        assert!(matches!(
            reader.read_load_averages(),
            Err(StatError::Read {
                source: ReadFailure::Parse(_),
                ..
            })
        ));
    }

    #[test]
    fn test_read_filesystems() {
        let (_, mut reader) = typical_reader();
        let fss = reader.read_filesystems().unwrap();
        let points: Vec<&str> = fss.iter().map(|f| f.mount_point.as_str()).collect();
        // proc, sysfs, cgroup2 skipped; /home remounted, later entry wins
        assert_eq!(points, ["/", "/run", "/home"]);
        let home = &fss[2];
        assert_eq!(home.device_name, "/dev/sdb1");
        assert_eq!(home.fs_type, "xfs");
        assert_eq!(home.stat.blocks, 5_000_000);
    }

    #[test]
    fn test_read_filesystems_skips_vanished_and_denied_mounts() {
        let (fs, mut reader) = typical_reader();
        fs.fail_statvfs("/run", io::ErrorKind::PermissionDenied);
        fs.fail_statvfs("/home", io::ErrorKind::NotFound);
        let fss = reader.read_filesystems().unwrap();
        assert_eq!(fss.len(), 1);
        assert_eq!(fss[0].mount_point, "/");
    }

    #[test]
    fn test_read_filesystems_reports_other_errors() {
        let (fs, mut reader) = typical_reader();
        fs.fail_statvfs("/home", io::ErrorKind::TimedOut);
        let err = reader.read_filesystems().unwrap_err();
        assert!(err.to_string().contains("/home"));
    }

    #[test]
    fn test_read_filesystems_skips_zero_sized() {
        let (fs, mut reader) = typical_reader();
        fs.add_statvfs("/run", FsStat::default());
        let fss = reader.read_filesystems().unwrap();
        assert!(fss.iter().all(|f| f.mount_point != "/run"));
    }

    #[test]
    fn test_bit_width_for() {
        assert_eq!(bit_width_for("x86_64"), 64);
        assert_eq!(bit_width_for("aarch64"), 64);
        assert_eq!(bit_width_for("s390x"), 64);
        assert_eq!(bit_width_for("i686"), 32);
        assert_eq!(bit_width_for("armv7l"), 32);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_against_fabricated_tree() {
        let dir = tempfile::tempdir().unwrap();
        let proc = dir.path().join("proc");
        std::fs::create_dir_all(proc.join("sys/kernel")).unwrap();
        std::fs::write(proc.join("stat"), "cpu  1 2 3 4 5 0 0 0 0 0\ncpu0 1 2 3 4 5 0 0 0 0 0\n")
            .unwrap();
        std::fs::write(proc.join("loadavg"), "1.00 0.50 0.25 2/100 42\n").unwrap();
        std::fs::write(proc.join("uptime"), "100.00 50.00\n").unwrap();
        for (name, value) in [
            ("ostype", "Linux\n"),
            ("osrelease", "6.8.0\n"),
            ("version", "#1 SMP\n"),
            ("hostname", "fabricated\n"),
        ] {
            std::fs::write(proc.join("sys/kernel").join(name), value).unwrap();
        }
        let mount_point = dir.path().to_string_lossy().into_owned();
        std::fs::write(
            proc.join("mounts"),
            format!("tmpdev {} tmpfs rw 0 0\nproc /proc proc rw 0 0\n", mount_point.replace(' ', "\\040")),
        )
        .unwrap();

        let mut reader = ProcfsReader::new(RealFs::new(), proc.to_string_lossy())
            .with_sys_path(dir.path().join("sys").to_string_lossy());
        reader.init().unwrap();

        let host = reader.read_host_info().unwrap();
        assert_eq!(host.host_name, "fabricated");
        assert_eq!(host.ncpus, 1);

        let load = reader.read_load_averages().unwrap();
        assert_eq!(load.min1, 1.0);

        let fss = reader.read_filesystems().unwrap();
        assert_eq!(fss.len(), 1);
        assert_eq!(fss[0].mount_point, mount_point);
        assert!(fss[0].stat.blocks > 0);
    }
}

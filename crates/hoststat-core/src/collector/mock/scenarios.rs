//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys` states
//! for testing various host configurations.

use super::filesystem::MockFs;
use crate::collector::traits::FsStat;

impl MockFs {
    /// Creates a typical 4-CPU Linux host with a few mounts.
    ///
    /// Mounts: ext4 root, tmpfs `/run`, and `/home` mounted twice
    /// (ext4, then xfs on top). proc, sysfs and cgroup2 are present too.
    pub fn typical_host() -> Self {
        let fs = Self::new();

        fs.add_file("/proc/sys/kernel/ostype", "Linux\n");
        fs.add_file("/proc/sys/kernel/osrelease", "6.1.0-13-amd64\n");
        fs.add_file(
            "/proc/sys/kernel/version",
            "#1 SMP PREEMPT_DYNAMIC Debian 6.1.55-1 (2023-09-29)\n",
        );
        fs.add_file("/proc/sys/kernel/hostname", "testhost\n");
        fs.add_file("/proc/sys/kernel/arch", "x86_64\n");
        fs.add_file("/sys/devices/system/cpu/online", "0-3\n");
        fs.add_file("/sys/devices/system/cpu/possible", "0-3\n");

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        fs.add_file(
            "/proc/mounts",
            "\
/dev/sda1 / ext4 rw,relatime,errors=remount-ro 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev,size=1628996k,mode=755 0 0
/dev/sda2 /home ext4 rw,relatime 0 0
cgroup2 /sys/fs/cgroup cgroup2 rw,nosuid,nodev,noexec,relatime 0 0
/dev/sdb1 /home xfs rw,relatime,attr2,inode64 0 0
",
        );

        fs.add_statvfs(
            "/",
            FsStat {
                block_size: 4096,
                blocks: 25_000_000,
                blocks_free: 10_000_000,
                blocks_available: 8_750_000,
                files: 6_553_600,
                files_free: 6_000_000,
                files_available: 6_000_000,
            },
        );
        fs.add_statvfs(
            "/run",
            FsStat {
                block_size: 4096,
                blocks: 407_249,
                blocks_free: 406_000,
                blocks_available: 406_000,
                files: 2_036_246,
                files_free: 2_035_000,
                files_available: 2_035_000,
            },
        );
        fs.add_statvfs(
            "/home",
            FsStat {
                block_size: 4096,
                blocks: 5_000_000,
                blocks_free: 1_000_000,
                blocks_available: 1_000_000,
                files: 2_500_000,
                files_free: 2_400_000,
                files_available: 2_400_000,
            },
        );

        fs
    }

    /// Creates a host without `/sys` and without `/proc/sys/kernel/arch`,
    /// as seen on older kernels or in restricted containers.
    pub fn minimal_host() -> Self {
        let fs = Self::new();
        fs.add_file("/proc/sys/kernel/ostype", "Linux\n");
        fs.add_file("/proc/sys/kernel/osrelease", "4.19.0\n");
        fs.add_file("/proc/sys/kernel/version", "#1 SMP\n");
        fs.add_file("/proc/sys/kernel/hostname", "minimal\n");
        fs.add_file("/proc/uptime", "60.00 100.00\n");
        fs.add_file("/proc/loadavg", "0.00 0.00 0.00 1/10 7\n");
        fs.add_file(
            "/proc/stat",
            "\
cpu  200 0 100 1700 0 0 0 0 0 0
cpu0 100 0 50 850 0 0 0 0 0 0
cpu1 100 0 50 850 0 0 0 0 0 0
",
        );
        fs.add_file("/proc/mounts", "overlay / overlay rw 0 0\n");
        fs.add_statvfs(
            "/",
            FsStat {
                block_size: 4096,
                blocks: 1_000,
                blocks_free: 500,
                blocks_available: 450,
                files: 0,
                files_free: 0,
                files_available: 0,
            },
        );
        fs
    }

    /// Rewrites `/proc/stat` with a single aggregate line built from
    /// `user nice system idle iowait irq softirq steal`.
    pub fn set_cpu_ticks(&self, ticks: [u64; 8]) {
        let cols: Vec<String> = ticks.iter().map(u64::to_string).collect();
        self.add_file("/proc/stat", format!("cpu  {} 0 0\n", cols.join(" ")));
    }
}

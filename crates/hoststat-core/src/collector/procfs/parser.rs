//! Parsers for `/proc` and `/sys` files.
//!
//! These are pure functions that parse the content of various kernel files
//! into structured data. They are designed to be easily testable with string inputs.

pub use crate::error::ParseError;

/// Single CPU line from `/proc/stat`, in clock ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuStat {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

/// CPU lines from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    pub cpus: Vec<CpuStat>,
}

impl GlobalStat {
    /// Returns the aggregate `cpu` line.
    pub fn aggregate(&self) -> Option<&CpuStat> {
        self.cpus.iter().find(|c| c.cpu_id.is_none())
    }

    /// Number of per-CPU lines (`cpu0`, `cpu1`, ...).
    pub fn online_cpus(&self) -> usize {
        self.cpus.iter().filter(|c| c.cpu_id.is_some()).count()
    }
}

/// Parses `/proc/stat` content.
///
/// Columns missing on older kernels (steal, guest, guest_nice) read as zero;
/// a column that is present but not a number is an error.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        if parts[0].starts_with("cpu") {
            let cpu_id = if parts[0] == "cpu" {
                None
            } else {
                let id = parts[0]
                    .strip_prefix("cpu")
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| ParseError::new(format!("invalid cpu label {}", parts[0])))?;
                Some(id)
            };

            if parts.len() < 5 {
                return Err(ParseError::new(format!(
                    "not enough fields in {} line: expected 4+, got {}",
                    parts[0],
                    parts.len() - 1
                )));
            }

            let get_val = |idx: usize| -> Result<u64, ParseError> {
                match parts.get(idx) {
                    None => Ok(0),
                    Some(s) => s.parse().map_err(|_| {
                        ParseError::new(format!("invalid value {:?} in {} line", s, parts[0]))
                    }),
                }
            };

            stat.cpus.push(CpuStat {
                cpu_id,
                user: get_val(1)?,
                nice: get_val(2)?,
                system: get_val(3)?,
                idle: get_val(4)?,
                iowait: get_val(5)?,
                irq: get_val(6)?,
                softirq: get_val(7)?,
                steal: get_val(8)?,
                guest: get_val(9)?,
                guest_nice: get_val(10)?,
            });
        }
    }

    if stat.aggregate().is_none() {
        return Err(ParseError::new("missing aggregate cpu line"));
    }

    Ok(stat)
}

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    Ok(LoadAvg {
        load1,
        load5,
        load15,
    })
}

/// Parses `/proc/uptime` content into seconds since boot.
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    let secs: f64 = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?
        .parse()
        .map_err(|_| ParseError::new("invalid uptime"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(ParseError::new(format!("uptime out of range: {}", secs)));
    }
    Ok(secs)
}

/// Parses a kernel cpu list (`/sys/devices/system/cpu/online`) such as
/// `0-3,6,8-9` and returns the number of CPUs it names.
pub fn parse_cpu_list(content: &str) -> Result<u32, ParseError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ParseError::new("empty cpu list"));
    }

    let mut count: u32 = 0;
    for entry in content.split(',') {
        let entry = entry.trim();
        let parse = |s: &str| -> Result<u32, ParseError> {
            s.parse()
                .map_err(|_| ParseError::new(format!("invalid cpu index {:?}", s)))
        };
        match entry.split_once('-') {
            Some((lo, hi)) => {
                let (lo, hi) = (parse(lo)?, parse(hi)?);
                if hi < lo {
                    return Err(ParseError::new(format!("invalid cpu range {}", entry)));
                }
                let span = (hi - lo).checked_add(1);
                count = span
                    .and_then(|n| count.checked_add(n))
                    .ok_or_else(|| ParseError::new(format!("cpu range {} too large", entry)))?;
            }
            None => {
                parse(entry)?;
                count = count
                    .checked_add(1)
                    .ok_or_else(|| ParseError::new("too many cpus in list"))?;
            }
        }
    }
    Ok(count)
}

/// One line of `/proc/mounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// Parses `/proc/mounts` content.
///
/// Format: device mount_point fs_type options dump pass.
/// Spaces and tabs inside paths are octal-escaped by the kernel (`\040`).
pub fn parse_mounts(content: &str) -> Result<Vec<MountEntry>, ParseError> {
    let mut mounts = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(ParseError::new(format!(
                "not enough fields in mounts line {}: expected 4+, got {}",
                lineno + 1,
                fields.len()
            )));
        }
        mounts.push(MountEntry {
            device: unescape_mount_field(fields[0]),
            mount_point: unescape_mount_field(fields[1]),
            fs_type: fields[2].to_string(),
        });
    }
    Ok(mounts)
}

/// Decodes `\ooo` octal escapes used in `/proc/mounts`.
pub fn unescape_mount_field(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(b) = u8::try_from(value) {
                    out.push(b);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_stat() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0
ctxt 500000
btime 1700000000
processes 10000
";
        let stat = parse_global_stat(content).unwrap();

        assert_eq!(stat.cpus.len(), 3); // cpu + cpu0 + cpu1
        assert_eq!(stat.cpus[0].cpu_id, None); // aggregate
        assert_eq!(stat.cpus[0].user, 10000);
        assert_eq!(stat.cpus[0].softirq, 100);
        assert_eq!(stat.cpus[1].cpu_id, Some(0));
        assert_eq!(stat.cpus[2].cpu_id, Some(1));
        assert_eq!(stat.online_cpus(), 2);
        assert_eq!(stat.aggregate().unwrap().idle, 80000);
    }

    #[test]
    fn test_parse_global_stat_old_kernel_columns() {
        // 2.6-era kernels stop after iowait/irq/softirq
        let stat = parse_global_stat("cpu  10 20 30 40 50\n").unwrap();
        let agg = stat.aggregate().unwrap();
        assert_eq!(agg.iowait, 50);
        assert_eq!(agg.irq, 0);
        assert_eq!(agg.steal, 0);
    }

    #[test]
    fn test_parse_global_stat_rejects_garbage() {
        assert!(parse_global_stat("cpu  10 x 30 40 50\n").is_err());
        assert!(parse_global_stat("cpu  10 20\n").is_err());
        assert!(parse_global_stat("ctxt 5\nbtime 1\n").is_err());
    }

    #[test]
    fn test_parse_loadavg() {
        let content = "0.15 0.10 0.05 1/150 1234\n";
        let load = parse_loadavg(content).unwrap();

        assert!((load.load1 - 0.15).abs() < 0.001);
        assert!((load.load5 - 0.10).abs() < 0.001);
        assert!((load.load15 - 0.05).abs() < 0.001);
    }

    #[test]
    fn test_parse_loadavg_invalid() {
        assert!(parse_loadavg("").is_err());
        assert!(parse_loadavg("0.1 abc 0.3 1/2 3").is_err());
    }

    #[test]
    fn test_parse_uptime() {
        let secs = parse_uptime("12345.67 98765.43\n").unwrap();
        assert!((secs - 12345.67).abs() < 1e-9);
        assert!(parse_uptime("").is_err());
        assert!(parse_uptime("-1 0").is_err());
    }

    #[test]
    fn test_parse_cpu_list() {
        assert_eq!(parse_cpu_list("0-3\n").unwrap(), 4);
        assert_eq!(parse_cpu_list("0").unwrap(), 1);
        assert_eq!(parse_cpu_list("0-3,6,8-9").unwrap(), 7);
        assert!(parse_cpu_list("").is_err());
        assert!(parse_cpu_list("3-1").is_err());
        assert!(parse_cpu_list("0-x").is_err());
        assert_eq!(parse_cpu_list("0-4294967294").unwrap(), u32::MAX);
        assert!(parse_cpu_list("0-4294967295").is_err());
        assert!(parse_cpu_list("0-4294967294,7").is_err());
    }

    #[test]
    fn test_parse_mounts() {
        let content = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sdb1 /mnt/My\\040Disk vfat rw 0 0
";
        let mounts = parse_mounts(content).unwrap();
        assert_eq!(mounts.len(), 3);
        assert_eq!(mounts[0].device, "/dev/sda1");
        assert_eq!(mounts[0].mount_point, "/");
        assert_eq!(mounts[0].fs_type, "ext4");
        assert_eq!(mounts[2].mount_point, "/mnt/My Disk");
    }

    #[test]
    fn test_parse_mounts_truncated_line() {
        let err = parse_mounts("/dev/sda1 / ext4\n").unwrap_err();
        assert!(err.message.contains("line 1"));
    }

    #[test]
    fn test_unescape_mount_field() {
        assert_eq!(unescape_mount_field("/plain"), "/plain");
        assert_eq!(unescape_mount_field("/a\\011b"), "/a\tb");
        assert_eq!(unescape_mount_field("/back\\134slash"), "/back\\slash");
        // Not an escape: left untouched
        assert_eq!(unescape_mount_field("/odd\\9"), "/odd\\9");
        assert_eq!(unescape_mount_field("/end\\"), "/end\\");
    }
}

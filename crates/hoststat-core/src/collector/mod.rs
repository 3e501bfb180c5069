//! Host counter collection for Linux.
//!
//! This module provides the counter reader seam used by a sampling session,
//! the procfs-backed reader, and a mock filesystem. Reader and parser logic
//! runs against the mock on any platform; `RealFs::statvfs` needs unix and
//! `Session::open` needs Linux.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CounterReader (trait)               │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │                  ProcfsReader                      │  │
//! │  │  - /proc/stat          - /proc/sys/kernel/*        │  │
//! │  │  - /proc/loadavg       - /sys/devices/system/cpu/* │  │
//! │  │  - /proc/mounts        - statvfs(mount point)      │  │
//! │  └───────────────────────┬────────────────────────────┘  │
//! │                   ┌──────▼──────┐                        │
//! │                   │  FileSystem │ (trait)                │
//! │                   └──────┬──────┘                        │
//! └──────────────────────────┼───────────────────────────────┘
//!                  ┌─────────┴─────────┐
//!           ┌──────▼──────┐     ┌──────▼──────┐
//!           │   RealFs    │     │   MockFs    │
//!           │  (Linux)    │     │  (Testing)  │
//!           └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use hoststat_core::collector::{CounterReader, MockFs, ProcfsReader};
//!
//! let fs = MockFs::typical_host();
//! let mut reader = ProcfsReader::new(fs, "/proc");
//! reader.init().unwrap();
//! let host = reader.read_host_info().unwrap();
//! assert_eq!(host.ncpus, 4);
//! ```

pub mod mock;
pub mod procfs;
mod reader;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{DEFAULT_PROC_PATH, DEFAULT_SYS_PATH, ProcfsReader};
pub use reader::{CounterReader, LoadAverages, RawFsCounters};
pub use traits::{FileSystem, FsStat, RealFs};

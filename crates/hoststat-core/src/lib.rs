//! hoststat-core: native host telemetry sampling.
//!
//! Provides:
//! - `collector` - counter reader seam, `/proc` reader, mock filesystem
//! - `snapshot` - raw counter snapshots and the previous-snapshot store
//! - `rates` - CPU percentage differencing
//! - `models` - `HostInfo`, `CpuStats`, `FsInfo` records (serde + text rendering)
//! - `session` - exclusive sampling session
//!
//! # Example
//!
//! ```no_run
//! use hoststat_core::Session;
//!
//! let session = Session::open()?;
//! println!("{}", session.host_info()?);
//!
//! // The first sample only sets the baseline.
//! session.cpu_stats()?;
//! std::thread::sleep(std::time::Duration::from_millis(100));
//! println!("{}", session.cpu_stats()?);
//!
//! for fs in session.filesystem_info()? {
//!     println!("{fs}");
//! }
//! session.close();
//! # Ok::<(), hoststat_core::StatError>(())
//! ```

pub mod collector;
pub mod error;
pub mod models;
pub mod rates;
pub mod session;
pub mod snapshot;

pub use error::{ParseError, ReadFailure, StatError};
pub use models::{CpuStats, FsInfo, HostInfo};
pub use rates::Rate;
pub use session::Session;

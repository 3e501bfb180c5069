//! Readers for the Linux `/proc` and `/sys` filesystems.
//!
//! This module provides parsers and the counter reader that turns
//! kernel files into raw host counters.

pub mod parser;
mod reader;

pub use reader::{DEFAULT_PROC_PATH, DEFAULT_SYS_PATH, ProcfsReader};

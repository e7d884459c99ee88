//! Reader for vehicle-dynamics simulation result archives.
//!
//! An archive is a binary file of tightly packed row-major samples plus a
//! `<name>.info` sidecar describing each column's name, type, unit and
//! scaling. Opening an archive parses the sidecar into an arena-backed
//! table, derives the signal schema and row layout, and memory-maps the
//! binary file; extracting a signal gathers one column out of the
//! interleaved rows into a freshly allocated typed buffer, optionally
//! split across a worker pool, with per-signal `raw * factor + offset`
//! scaling applied.
//!
//! ```no_run
//! use ergfile::ErgFile;
//!
//! # fn main() -> ergfile::Result<()> {
//! let archive = ErgFile::open("run.erg")?;
//! if let Some(speed) = archive.signal_as_f64("Car.v") {
//!     println!("{} samples", speed.len());
//! }
//! # Ok(())
//! # }
//! ```

mod archive;
mod column;
mod extract;
mod mapper;
mod schema;

pub use archive::{ErgFile, OpenOptions};
pub use column::Column;
pub use ergfile_error::{ErgError, Result};
pub use ergfile_info::InfoFile;
pub use ergfile_pool::WorkerPool;
pub use ergfile_simd::SimdLevel;
pub use ergfile_types::{RowLayout, Signal, SignalKind, ARCHIVE_HEADER_BYTES};

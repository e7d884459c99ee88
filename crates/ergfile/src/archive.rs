//! The archive handle: sidecar table, schema, mapped rows.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ergfile_error::{ErgError, Result};
use ergfile_info::InfoFile;
use ergfile_pool::WorkerPool;
use ergfile_simd::SimdLevel;
use ergfile_types::{RowLayout, Signal};
use tracing::warn;

use crate::column::{widen_raw, Column};
use crate::extract::extract_column;
use crate::mapper::MappedFile;
use crate::schema::bind_signals;

/// Knobs for [`ErgFile::open_with`].
#[derive(Default)]
pub struct OpenOptions {
    /// Force a SIMD tier instead of probing the host. Tests use this to
    /// run every tier; production code leaves it `None`.
    pub simd_level: Option<SimdLevel>,
    /// Pool for partitioned extraction of large columns. Absent means
    /// every extraction runs on the calling thread.
    pub pool: Option<Arc<WorkerPool>>,
}

/// An open archive.
///
/// Owns the parsed sidecar (arena included), the derived schema and row
/// layout, and the read-only mapping of the binary file. Everything is
/// released together when the handle drops.
#[derive(Debug)]
pub struct ErgFile {
    path: PathBuf,
    info: InfoFile,
    signals: Vec<Signal>,
    layout: RowLayout,
    mapped: MappedFile,
    sample_count: usize,
    simd: SimdLevel,
    pool: Option<Arc<WorkerPool>>,
}

impl ErgFile {
    /// Open the archive at `path`, reading its `<path>.info` sidecar.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::default())
    }

    /// Open with explicit extraction options.
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let simd = options.simd_level.unwrap_or_else(SimdLevel::detect);

        let mut sidecar = path.as_os_str().to_os_string();
        sidecar.push(".info");
        let mut info = InfoFile::with_level(simd);
        info.parse_file(&sidecar)?;

        let signals = bind_signals(&info)?;
        let layout = RowLayout::from_signals(&signals);
        if layout.row_size() == 0 {
            return Err(ErgError::ZeroRowSize {
                signals: signals.len(),
            });
        }

        let mapped = MappedFile::open(&path)?;
        let data_len = mapped.data().len();
        let sample_count = data_len / layout.row_size();
        let trailing = data_len % layout.row_size();
        if trailing != 0 {
            warn!(
                path = %path.display(),
                row_size = layout.row_size(),
                trailing,
                "data region is not a whole number of rows; trailing bytes ignored"
            );
        }

        Ok(ErgFile {
            path,
            info,
            signals,
            layout,
            mapped,
            sample_count,
            simd,
            pool: options.pool,
        })
    }

    /// Path of the binary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed sidecar table.
    #[must_use]
    pub fn info(&self) -> &InfoFile {
        &self.info
    }

    /// Declared signals in declaration order.
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Row layout derived from the schema.
    #[must_use]
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Whole rows available in the data region.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// SIMD tier extraction dispatches on.
    #[must_use]
    pub fn simd_level(&self) -> SimdLevel {
        self.simd
    }

    /// Position of `name` in the schema.
    #[must_use]
    pub fn signal_index(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|signal| signal.name == name)
    }

    /// Metadata row for `name`.
    #[must_use]
    pub fn signal_info(&self, name: &str) -> Option<&Signal> {
        self.signal_index(name).map(|index| &self.signals[index])
    }

    /// The column for `name` as unscaled little-endian bytes, exactly as
    /// packed in the file.
    #[must_use]
    pub fn signal_raw(&self, name: &str) -> Option<Vec<u8>> {
        self.extract_raw(self.signal_index(name)?)
    }

    /// The column for `name` in its native type, scaling applied.
    #[must_use]
    pub fn signal(&self, name: &str) -> Option<Column> {
        let index = self.signal_index(name)?;
        let raw = self.extract_raw(index)?;
        let signal = &self.signals[index];
        let mut column = Column::from_raw(signal.kind, &raw);
        if signal.is_scaled() {
            column.scale(signal.factor, signal.offset);
        }
        Some(column)
    }

    /// The column for `name` widened to f64 with scaling applied in f64.
    #[must_use]
    pub fn signal_as_f64(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.signal_index(name)?;
        let raw = self.extract_raw(index)?;
        let signal = &self.signals[index];
        let mut values = widen_raw(signal.kind, &raw);
        for value in &mut values {
            *value = *value * signal.factor + signal.offset;
        }
        Some(values)
    }

    /// Extract several signals sequentially; one slot per requested name.
    #[must_use]
    pub fn signals_batch(&self, names: &[&str]) -> Vec<Option<Column>> {
        names.iter().map(|name| self.signal(name)).collect()
    }

    /// Extract several signals sequentially as f64 columns.
    #[must_use]
    pub fn signals_batch_as_f64(&self, names: &[&str]) -> Vec<Option<Vec<f64>>> {
        names.iter().map(|name| self.signal_as_f64(name)).collect()
    }

    /// Release the mapping, the sidecar table and its arenas.
    ///
    /// Dropping the handle does the same; this spelling exists for
    /// call sites that want the release to be visible.
    pub fn close(self) {}

    fn extract_raw(&self, index: usize) -> Option<Vec<u8>> {
        if self.sample_count == 0 {
            return None;
        }
        let signal = &self.signals[index];
        let elem = signal.size_bytes();
        if elem == 0 {
            // Unknown type; the column has no representation in the row.
            return None;
        }
        Some(extract_column(
            self.simd,
            self.mapped.data(),
            self.layout.column_offset(index),
            self.layout.row_size(),
            elem,
            self.sample_count,
            self.pool.as_deref(),
        ))
    }
}

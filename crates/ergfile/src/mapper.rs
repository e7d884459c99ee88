//! Read-only mapping of the binary archive file.
//!
//! The whole file is mapped; the first 16 bytes are an opaque header and
//! everything after it is the packed row data. Mapping beats a bulk read
//! here because typical requests touch a few columns out of hundreds and
//! the pager only faults in the rows actually gathered.

use std::fs::File;
use std::path::Path;

use ergfile_error::{ErgError, Result};
use ergfile_types::ARCHIVE_HEADER_BYTES;
use memmap2::Mmap;

#[derive(Debug)]
pub(crate) struct MappedFile {
    map: Mmap,
}

impl MappedFile {
    /// Open `path` read-only and map it whole.
    ///
    /// A file shorter than the header is fatal; a file of exactly the
    /// header size maps to an empty data region.
    pub(crate) fn open(path: &Path) -> Result<MappedFile> {
        let file = File::open(path).map_err(|source| ErgError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| ErgError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if size < ARCHIVE_HEADER_BYTES as u64 {
            return Err(ErgError::Truncated {
                path: path.to_path_buf(),
                size,
                header: ARCHIVE_HEADER_BYTES as u64,
            });
        }

        // SAFETY: the mapping is read-only and the archive is treated as
        // immutable for the lifetime of the handle.
        let map = unsafe { Mmap::map(&file) }.map_err(|source| ErgError::Map {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(MappedFile { map })
    }

    /// The packed row region after the header.
    pub(crate) fn data(&self) -> &[u8] {
        &self.map[ARCHIVE_HEADER_BYTES..]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_maps_data_after_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; ARCHIVE_HEADER_BYTES]).unwrap();
        file.write_all(&[1, 2, 3, 4]).unwrap();
        file.flush().unwrap();

        let mapped = MappedFile::open(file.path()).unwrap();
        assert_eq!(mapped.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_header_only_file_has_empty_data() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; ARCHIVE_HEADER_BYTES]).unwrap();
        file.flush().unwrap();

        let mapped = MappedFile::open(file.path()).unwrap();
        assert!(mapped.data().is_empty());
    }

    #[test]
    fn test_short_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 7]).unwrap();
        file.flush().unwrap();

        let err = MappedFile::open(file.path()).unwrap_err();
        assert!(matches!(err, ErgError::Truncated { size: 7, .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = MappedFile::open(Path::new("/nonexistent/run.erg")).unwrap_err();
        assert!(matches!(err, ErgError::Open { .. }));
    }
}
